//! Option merging.
//!
//! Combines CLI options, one target config and the package manifest into the
//! concrete [`BuildPlan`] the invokers hand to the engine. Plans are built
//! fresh for every target on every run.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use path_clean::PathClean;
use qoi_config::{EnvOverlay, MinifyMode, PackageJson, ProjectContext, ResolveMode};
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::engine::{BundleInput, EntryItem};
use crate::externals::{base_externals, resolve_externals};
use crate::hooks::Target;
use crate::options::BuildOptions;
use crate::output::OutputDescriptor;
use crate::{Error, Result, SharedPluginable};

const ENTRY_STEMS: &[&str] = &["index", "main"];
const ENTRY_EXTENSIONS: &[&str] = &[".ts", ".js", ".tsx", ".jsx", ".mjs"];

/// One link of the code-build plugin chain.
#[derive(Clone)]
pub enum PluginStep {
    /// Plugins supplied by target hooks.
    User(SharedPluginable),
    /// `compilerOptions.paths` from `tsconfig.json`, as `(alias, targets)`.
    PathAliases(Vec<(String, Vec<String>)>),
    /// Drop `@license` markers so minification can remove the comments.
    StripLicense,
    CommonJs,
    NodeResolve,
    /// TypeScript/JSX transform with the target's transform options.
    Transform,
    /// Collapse whitespace inside html/css/svg tagged templates.
    MinifyLiterals,
}

impl PluginStep {
    pub fn name(&self) -> &'static str {
        match self {
            PluginStep::User(_) => "user",
            PluginStep::PathAliases(_) => "tsconfig-paths",
            PluginStep::StripLicense => "license",
            PluginStep::CommonJs => "commonjs",
            PluginStep::NodeResolve => "node-resolve",
            PluginStep::Transform => "transform",
            PluginStep::MinifyLiterals => "minify-literals",
        }
    }
}

impl fmt::Debug for PluginStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginStep::PathAliases(aliases) => {
                f.debug_tuple("PathAliases").field(aliases).finish()
            }
            other => f.write_str(other.name()),
        }
    }
}

/// The merged, per-target build plan.
#[derive(Debug, Clone)]
pub struct BuildPlan {
    pub input: BundleInput,
    pub outputs: Vec<OutputDescriptor>,
    /// Directory receiving the manifest, README and declarations.
    pub out_dir: PathBuf,
}

impl BuildPlan {
    pub fn new(
        ctx: &ProjectContext,
        options: &BuildOptions,
        pkg: &PackageJson,
        target: &Target,
        env: EnvOverlay,
    ) -> Result<Self> {
        let config = &target.config;
        let label = target.label().to_string();

        let entries = match &config.input {
            Some(input) => input
                .items()
                .into_iter()
                .map(|(name, import)| EntryItem { name, import })
                .collect(),
            None => vec![EntryItem {
                name: None,
                import: find_entry(ctx, &options.dir, pkg.short_name())?,
            }],
        };

        let mode = code_resolve_mode(options, config.resolve.as_ref());
        let candidates = options
            .externals()
            .into_iter()
            .chain(config.external.iter().cloned())
            .chain(base_externals(pkg));
        let external = resolve_externals(candidates, &mode);
        debug!(target = %label, resolve = %mode, externals = external.len(), "resolved externals");

        let mut plugins: Vec<PluginStep> = target
            .hooks
            .as_ref()
            .map(|hooks| hooks.plugins().into_iter().map(PluginStep::User).collect())
            .unwrap_or_default();
        let aliases = tsconfig_aliases(ctx.root())?;
        if !aliases.is_empty() {
            plugins.push(PluginStep::PathAliases(aliases));
        }
        if options.minify.strips_license() {
            plugins.push(PluginStep::StripLicense);
        }
        plugins.extend([
            PluginStep::CommonJs,
            PluginStep::NodeResolve,
            PluginStep::Transform,
        ]);
        if options.minify.minifies_literals() {
            plugins.push(PluginStep::MinifyLiterals);
        }

        let out_dir = ctx.resolve(config.out_dir.as_deref().unwrap_or(&options.out_dir));
        let sourcemap = config.sourcemap.unwrap_or(options.sourcemap);
        let outputs = options
            .formats()?
            .into_iter()
            .map(|(token, format)| {
                let mut descriptor = OutputDescriptor::for_format(
                    &out_dir,
                    &token,
                    format,
                    pkg.short_name(),
                    options.module,
                    sourcemap,
                );
                if let Some(overrides) = &config.output {
                    descriptor = descriptor.apply_overrides(overrides, ctx.root())?;
                }
                if let Some(hooks) = &target.hooks {
                    descriptor = hooks.output(descriptor);
                }
                descriptor.validate()
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            input: BundleInput {
                target: label,
                cwd: ctx.root().to_path_buf(),
                entries,
                external,
                plugins,
                transform: config.transform.clone(),
                minify: options.minify == MinifyMode::Code || config.transform.minify,
                env,
            },
            outputs,
            out_dir,
        })
    }

    pub fn primary_output(&self) -> Option<&OutputDescriptor> {
        self.outputs.first()
    }
}

/// Target `resolve`, else CLI `resolve`, else keep every external.
pub fn code_resolve_mode(options: &BuildOptions, target: Option<&ResolveMode>) -> ResolveMode {
    target
        .or(options.resolve.as_ref())
        .cloned()
        .unwrap_or_default()
}

/// First existing conventional entry under `root/dir`, relative to the root.
pub fn find_entry(ctx: &ProjectContext, dir: &str, short_name: &str) -> Result<String> {
    let dir = dir.trim_end_matches('/');
    let search_dir = ctx.resolve(dir);

    let candidates: Vec<String> = ENTRY_STEMS
        .iter()
        .copied()
        .chain((!short_name.is_empty()).then_some(short_name))
        .flat_map(|stem| ENTRY_EXTENSIONS.iter().map(move |ext| format!("{stem}{ext}")))
        .collect();

    match candidates.iter().find(|file| search_dir.join(file).is_file()) {
        Some(file) => {
            let entry = if dir.is_empty() || dir == "." {
                file.clone()
            } else {
                format!("{dir}/{file}")
            };
            debug!(entry = %entry, "discovered entry file");
            Ok(entry)
        }
        None => Err(Error::EntryNotFound {
            dir: search_dir,
            candidates,
        }),
    }
}

static TRAILING_COMMA: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").ok());

/// Path aliases from `root/tsconfig.json`, resolved to absolute targets.
///
/// `"@app/*": ["src/*"]` becomes `("@app", ["<root>/<baseUrl>/src"])`.
pub fn tsconfig_aliases(root: &Path) -> Result<Vec<(String, Vec<String>)>> {
    let path = root.join("tsconfig.json");
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };

    let mut cleaned = strip_json_comments(&content);
    if let Some(re) = TRAILING_COMMA.as_ref() {
        cleaned = re.replace_all(&cleaned, "$1").into_owned();
    }
    let tsconfig: Value = match serde_json::from_str(&cleaned) {
        Ok(value) => value,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "ignoring unparsable tsconfig.json");
            return Ok(Vec::new());
        }
    };

    let compiler = &tsconfig["compilerOptions"];
    let base = root.join(compiler["baseUrl"].as_str().unwrap_or("."));
    let Some(paths) = compiler["paths"].as_object() else {
        return Ok(Vec::new());
    };

    Ok(paths
        .iter()
        .map(|(alias, targets)| {
            let targets = targets
                .as_array()
                .into_iter()
                .flatten()
                .filter_map(Value::as_str)
                .map(|target| {
                    let target = target.trim_end_matches("/*").trim_end_matches('*');
                    base.join(target).clean().to_string_lossy().into_owned()
                })
                .collect();
            let alias = alias.trim_end_matches("/*").trim_end_matches('*').to_string();
            (alias, targets)
        })
        .collect())
}

/// Remove `//` and `/* */` comments outside string literals.
fn strip_json_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match (c, chars.peek()) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use qoi_config::{EntryInput, OutputOverrides, TargetConfig};
    use tempfile::TempDir;

    fn project() -> (TempDir, ProjectContext) {
        let dir = TempDir::new().unwrap();
        let ctx = ProjectContext::new(dir.path());
        (dir, ctx)
    }

    fn pkg() -> PackageJson {
        PackageJson {
            name: "@x/y".into(),
            ..Default::default()
        }
    }

    #[test]
    fn entry_prefers_index_then_main_then_short_name() {
        let (dir, ctx) = project();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/y.ts"), "").unwrap();
        assert_eq!(find_entry(&ctx, "src", "y").unwrap(), "src/y.ts");

        fs::write(dir.path().join("src/main.ts"), "").unwrap();
        assert_eq!(find_entry(&ctx, "src", "y").unwrap(), "src/main.ts");

        fs::write(dir.path().join("src/index.js"), "").unwrap();
        assert_eq!(find_entry(&ctx, "src", "y").unwrap(), "src/index.js");
    }

    #[test]
    fn missing_entry_is_an_error() {
        let (_dir, ctx) = project();
        let err = find_entry(&ctx, "src", "y").unwrap_err();
        assert!(err.to_string().contains("entry file does not exist"));
    }

    #[test]
    fn plan_for_default_target() {
        let (dir, ctx) = project();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/index.ts"), "").unwrap();

        let plan = BuildPlan::new(
            &ctx,
            &BuildOptions::default(),
            &pkg(),
            &TargetConfig::default().into(),
            EnvOverlay::new(),
        )
        .unwrap();

        assert_eq!(plan.input.entries[0].import, "src/index.ts");
        assert_eq!(plan.out_dir, dir.path().join("dist"));
        assert_eq!(plan.outputs.len(), 1);
        assert_eq!(plan.outputs[0].entry_file_names, "y.js");
        let names: Vec<_> = plan.input.plugins.iter().map(PluginStep::name).collect();
        assert_eq!(names, ["commonjs", "node-resolve", "transform"]);
        assert!(!plan.input.minify);
    }

    #[test]
    fn plugin_chain_follows_minify_mode() {
        let (_dir, ctx) = project();
        let target: Target = TargetConfig {
            input: Some(EntryInput::Path("src/a.ts".into())),
            ..Default::default()
        }
        .into();

        let literals = BuildOptions {
            minify: MinifyMode::CodeAndLiterals,
            ..Default::default()
        };
        let plan = BuildPlan::new(&ctx, &literals, &pkg(), &target, EnvOverlay::new()).unwrap();
        let names: Vec<_> = plan.input.plugins.iter().map(PluginStep::name).collect();
        assert_eq!(
            names,
            ["license", "commonjs", "node-resolve", "transform", "minify-literals"]
        );
        assert!(!plan.input.minify);

        let code = BuildOptions {
            minify: MinifyMode::Code,
            ..Default::default()
        };
        let plan = BuildPlan::new(&ctx, &code, &pkg(), &target, EnvOverlay::new()).unwrap();
        assert!(plan.input.minify);
        assert_eq!(plan.input.plugins[0].name(), "license");
    }

    #[test]
    fn target_resolve_takes_precedence() {
        let options = BuildOptions {
            resolve: Some(ResolveMode::All),
            ..Default::default()
        };
        let only = ResolveMode::only(["a"]);
        assert_eq!(code_resolve_mode(&options, Some(&only)), only);
        assert_eq!(code_resolve_mode(&options, None), ResolveMode::All);
        assert_eq!(
            code_resolve_mode(&BuildOptions::default(), None),
            ResolveMode::None
        );
    }

    #[test]
    fn formats_produce_one_descriptor_each() {
        let (dir, ctx) = project();
        let options = BuildOptions {
            format: "es,cjs".into(),
            ..Default::default()
        };
        let target: Target = TargetConfig {
            input: Some(EntryInput::Path("src/a.ts".into())),
            out_dir: Some("lib".into()),
            output: Some(OutputOverrides {
                chunk_file_names: Some("chunks/[name].js".into()),
                ..Default::default()
            }),
            ..Default::default()
        }
        .into();

        let plan = BuildPlan::new(&ctx, &options, &pkg(), &target, EnvOverlay::new()).unwrap();
        assert_eq!(plan.outputs[0].dir, dir.path().join("lib"));
        assert_eq!(plan.outputs[1].dir, dir.path().join("lib/cjs"));
        assert!(plan.outputs.iter().all(|o| o.chunk_file_names == "chunks/[name].js"));
    }

    #[test]
    fn tsconfig_paths_become_aliases() {
        let (dir, _ctx) = project();
        fs::write(
            dir.path().join("tsconfig.json"),
            r#"{
                // comment
                "compilerOptions": {
                    "baseUrl": ".", /* inline */
                    "paths": { "@app/*": ["src/*"], "~lib": ["lib/index.ts"], },
                },
            }"#,
        )
        .unwrap();

        let aliases = tsconfig_aliases(dir.path()).unwrap();
        assert_eq!(aliases.len(), 2);
        assert_eq!(aliases[0].0, "@app");
        assert_eq!(
            aliases[0].1,
            [dir.path().join("src").to_string_lossy().into_owned()]
        );
        assert_eq!(aliases[1].0, "~lib");
    }

    #[test]
    fn no_tsconfig_means_no_aliases() {
        let (dir, _ctx) = project();
        assert!(tsconfig_aliases(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn comment_stripping_keeps_strings() {
        let stripped = strip_json_comments(r#"{"url": "http://x/*y*/"} // tail"#);
        assert_eq!(stripped.trim(), r#"{"url": "http://x/*y*/"}"#);
    }
}
