//! Build target configuration as read from a config source.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ConfigError, Result};
use crate::selectors::{DeclarationMode, ResolveMode};

/// Entry point(s) of a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryInput {
    Path(String),
    List(Vec<String>),
    Named(IndexMap<String, String>),
}

impl EntryInput {
    /// `(name, path)` pairs in declaration order.
    pub fn items(&self) -> Vec<(Option<String>, String)> {
        match self {
            EntryInput::Path(path) => vec![(None, path.clone())],
            EntryInput::List(paths) => paths.iter().map(|p| (None, p.clone())).collect(),
            EntryInput::Named(map) => map
                .iter()
                .map(|(name, path)| (Some(name.clone()), path.clone()))
                .collect(),
        }
    }

    /// First entry path, used to name companion declaration files.
    pub fn primary(&self) -> Option<&str> {
        match self {
            EntryInput::Path(path) => Some(path),
            EntryInput::List(paths) => paths.first().map(String::as_str),
            EntryInput::Named(map) => map.values().next().map(String::as_str),
        }
    }
}

/// Detailed declaration options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DtsOptions {
    /// Output file, relative to the project root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolve: Option<ResolveMode>,
}

/// `dts` accepts a mode or a detailed options object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DtsSetting {
    Mode(DeclarationMode),
    Detailed(DtsOptions),
}

impl DtsSetting {
    pub fn mode(&self) -> DeclarationMode {
        match self {
            DtsSetting::Mode(mode) => *mode,
            DtsSetting::Detailed(_) => DeclarationMode::On,
        }
    }

    pub fn options(&self) -> Option<&DtsOptions> {
        match self {
            DtsSetting::Detailed(options) => Some(options),
            DtsSetting::Mode(_) => None,
        }
    }
}

/// Options handed to the transform step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformOptions {
    /// Syntax lowering target, e.g. `es2020`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Enable legacy (experimental) decorators.
    #[serde(default)]
    pub decorators: bool,

    /// Let the transform step minify the emitted chunks.
    #[serde(default)]
    pub minify: bool,

    /// Compile-time replacements, `identifier -> expression`.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub define: IndexMap<String, String>,

    /// Environment keys inlined as `process.env.KEY`. Overlay values stay
    /// out of the bundle unless they are listed here.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub define_env: Vec<String>,
}

/// Declarative overlay applied to every computed output descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_file_names: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_file_names: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sourcemap: Option<bool>,
}

/// `packageJson` is either a flag or an object merged into the synthesized
/// manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PackageJsonSetting {
    Flag(bool),
    Overlay(Map<String, Value>),
}

impl PackageJsonSetting {
    pub fn overlay(&self) -> Option<&Map<String, Value>> {
        match self {
            PackageJsonSetting::Overlay(map) => Some(map),
            PackageJsonSetting::Flag(_) => None,
        }
    }
}

/// Declarative post-build step, run after the target's build group settles.
///
/// Paths are relative to the project root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildEndStep {
    Copy { from: String, to: String },
    Remove { path: String },
}

/// One named build unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<EntryInput>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolve: Option<ResolveMode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dts: Option<DtsSetting>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sourcemap: Option<bool>,

    /// Output directory for this target; falls back to the CLI `outDir`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<String>,

    #[serde(default, alias = "swc")]
    pub transform: TransformOptions,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputOverrides>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_json: Option<PackageJsonSetting>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub env: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub build_end: Vec<BuildEndStep>,
}

impl TargetConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn declaration_mode(&self) -> DeclarationMode {
        self.dts.as_ref().map(DtsSetting::mode).unwrap_or_default()
    }

    /// Exact-match selection. Unnamed targets are only reachable without a
    /// filter.
    pub fn is_selected_by(&self, names: &[String]) -> bool {
        if names.is_empty() {
            return true;
        }
        match self.name.as_deref() {
            Some(name) => names.iter().any(|selected| selected == name),
            None => false,
        }
    }

    /// Display label for logs.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("default")
    }
}

/// A config source: one target or a list of targets.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSet {
    Single(TargetConfig),
    Many(Vec<TargetConfig>),
}

impl Default for ConfigSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl ConfigSet {
    /// One anonymous target with default settings.
    pub fn empty() -> Self {
        ConfigSet::Single(TargetConfig::default())
    }

    /// Interpret a loaded config value.
    ///
    /// Accepts a target object, an array of targets, or an object whose
    /// `targets` field holds the array (the TOML `[[targets]]` layout).
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self::empty()),
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(index, item)| parse_target(item, &format!("targets[{index}]")))
                .collect::<Result<Vec<_>>>()
                .map(ConfigSet::Many),
            Value::Object(mut map) => match map.remove("targets") {
                Some(targets @ Value::Array(_)) if map.is_empty() => Self::from_value(targets),
                Some(_) => Err(ConfigError::invalid_value(
                    "targets",
                    "expected an array of targets and no other top-level fields",
                )),
                None => parse_target(Value::Object(map), "config").map(ConfigSet::Single),
            },
            other => Err(ConfigError::invalid_value(
                "config",
                format!("expected an object or an array, got {other}"),
            )),
        }
    }

    pub fn into_targets(self) -> Vec<TargetConfig> {
        match self {
            ConfigSet::Single(target) => vec![target],
            ConfigSet::Many(targets) => targets,
        }
    }
}

fn parse_target(value: Value, field: &str) -> Result<TargetConfig> {
    serde_json::from_value(value).map_err(|e| ConfigError::invalid_value(field, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_single_target() {
        let set = ConfigSet::from_value(json!({
            "name": "lib",
            "input": "./src/index.ts",
            "resolve": ["a"],
            "dts": "only",
            "env": { "MODE": "prod" }
        }))
        .unwrap();

        let targets = set.into_targets();
        assert_eq!(targets.len(), 1);
        let target = &targets[0];
        assert_eq!(target.label(), "lib");
        assert_eq!(target.resolve, Some(ResolveMode::only(["a"])));
        assert_eq!(target.declaration_mode(), DeclarationMode::DeclarationsOnly);
        assert_eq!(target.env.get("MODE").map(String::as_str), Some("prod"));
    }

    #[test]
    fn parses_target_list_and_toml_layout() {
        let list = ConfigSet::from_value(json!([{ "name": "a" }, { "name": "b" }])).unwrap();
        assert_eq!(list.into_targets().len(), 2);

        let nested = ConfigSet::from_value(json!({ "targets": [{ "name": "a" }] })).unwrap();
        assert_eq!(nested, ConfigSet::Many(vec![TargetConfig::named("a")]));
    }

    #[test]
    fn null_is_one_default_target() {
        assert_eq!(ConfigSet::from_value(Value::Null).unwrap(), ConfigSet::empty());
    }

    #[test]
    fn scalar_config_is_rejected() {
        assert!(ConfigSet::from_value(json!(42)).is_err());
    }

    #[test]
    fn detailed_dts_options() {
        let target: TargetConfig = serde_json::from_value(json!({
            "dts": { "file": "types/index.d.ts", "write": false, "resolve": true }
        }))
        .unwrap();
        let dts = target.dts.as_ref().unwrap();
        assert_eq!(dts.mode(), DeclarationMode::On);
        let options = dts.options().unwrap();
        assert_eq!(options.file.as_deref(), Some("types/index.d.ts"));
        assert_eq!(options.resolve, Some(ResolveMode::All));
    }

    #[test]
    fn transform_lists_inlined_env_keys() {
        let target: TargetConfig = serde_json::from_value(json!({
            "transform": { "define": { "__DEV__": "false" }, "defineEnv": ["API_URL"] }
        }))
        .unwrap();
        assert_eq!(target.transform.define_env, ["API_URL"]);
        assert!(TargetConfig::default().transform.define_env.is_empty());
    }

    #[test]
    fn entry_input_shapes() {
        let named: EntryInput = serde_json::from_value(json!({ "main": "src/a.ts" })).unwrap();
        assert_eq!(named.items(), vec![(Some("main".into()), "src/a.ts".into())]);
        assert_eq!(named.primary(), Some("src/a.ts"));

        let list: EntryInput = serde_json::from_value(json!(["a.ts", "b.ts"])).unwrap();
        assert_eq!(list.primary(), Some("a.ts"));
    }

    #[test]
    fn selection_is_exact() {
        let names = vec!["lib".to_string()];
        assert!(TargetConfig::named("lib").is_selected_by(&names));
        assert!(!TargetConfig::named("lib2").is_selected_by(&names));
        assert!(!TargetConfig::default().is_selected_by(&names));
        assert!(TargetConfig::default().is_selected_by(&[]));
    }

    #[test]
    fn build_end_steps() {
        let target: TargetConfig = serde_json::from_value(json!({
            "buildEnd": [
                { "copy": { "from": "src/bin", "to": "dist/bin" } },
                { "remove": { "path": "dist/tmp" } }
            ]
        }))
        .unwrap();
        assert_eq!(
            target.build_end,
            vec![
                BuildEndStep::Copy {
                    from: "src/bin".into(),
                    to: "dist/bin".into()
                },
                BuildEndStep::Remove {
                    path: "dist/tmp".into()
                },
            ]
        );
    }
}
