//! Reader for the project's `package.json`.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::ProjectContext;
use crate::error::{ConfigError, Result};

pub type DependencyMap = IndexMap<String, String>;

/// The subset of `package.json` the build pipeline reads.
///
/// Fields with free-form shapes (`bin`, `exports`, `author`) are kept as raw
/// JSON values and copied through verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageJson {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<DependencyMap>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer_dependencies: Option<DependencyMap>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_dependencies: Option<DependencyMap>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bin: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exports: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typings: Option<String>,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Value>,

    /// An SPDX expression, or the legacy `{ "type", "url" }` object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
}

impl PackageJson {
    /// Load `package.json` from the project root.
    pub fn load(ctx: &ProjectContext) -> Result<Self> {
        Self::load_from(&ctx.manifest_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::ManifestNotFound(path.to_path_buf()));
            }
            Err(err) => return Err(err.into()),
        };

        let manifest: PackageJson =
            serde_json::from_str(&content).map_err(|e| ConfigError::InvalidManifest {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        if manifest.name.trim().is_empty() {
            return Err(ConfigError::InvalidManifest {
                path: path.to_path_buf(),
                message: "the 'name' field must not be empty".to_string(),
            });
        }

        tracing::debug!(name = %manifest.name, "loaded package manifest");
        Ok(manifest)
    }

    /// Unscoped package identifier used for default output file names.
    pub fn short_name(&self) -> &str {
        short_name(&self.name)
    }

    /// Keys of the peer, runtime and development dependency maps, in that order.
    pub fn dependency_names(&self) -> impl Iterator<Item = &str> {
        [
            &self.peer_dependencies,
            &self.dependencies,
            &self.dev_dependencies,
        ]
        .into_iter()
        .flatten()
        .flat_map(|deps| deps.keys().map(String::as_str))
    }
}

/// `@scope/name` becomes `name`; anything unscoped is returned unchanged.
pub fn short_name(name: &str) -> &str {
    let mut segments = name.split('/');
    let first = segments.next().unwrap_or(name);
    segments.next().unwrap_or(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    #[test]
    fn short_name_strips_scope() {
        assert_eq!(short_name("@x/y"), "y");
        assert_eq!(short_name("lodash"), "lodash");
        assert_eq!(short_name(""), "");
    }

    proptest! {
        #[test]
        fn scoped_names_reduce_to_their_second_segment(
            scope in "[a-z][a-z0-9-]{0,12}",
            name in "[a-z][a-z0-9.-]{0,16}",
        ) {
            let full = format!("@{scope}/{name}");
            prop_assert_eq!(short_name(&full), name.as_str());
        }

        #[test]
        fn unscoped_names_are_unchanged(name in "[a-z][a-z0-9.-]{0,16}") {
            prop_assert_eq!(short_name(&name), name.as_str());
        }
    }

    #[test]
    fn load_reads_dependency_groups() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{
                "name": "@x/y",
                "version": "1.0.0",
                "type": "module",
                "dependencies": { "z": "^1" },
                "peerDependencies": { "react": "*" },
                "devDependencies": { "vitest": "^2" }
            }"#,
        )
        .unwrap();

        let pkg = PackageJson::load(&ProjectContext::new(dir.path())).unwrap();
        assert_eq!(pkg.short_name(), "y");
        assert_eq!(pkg.kind.as_deref(), Some("module"));
        let names: Vec<_> = pkg.dependency_names().collect();
        assert_eq!(names, vec!["react", "z", "vitest"]);
    }

    #[test]
    fn legacy_license_object_is_accepted() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{ "name": "y", "license": { "type": "MIT", "url": "https://x.dev/LICENSE" } }"#,
        )
        .unwrap();

        let pkg = PackageJson::load(&ProjectContext::new(dir.path())).unwrap();
        assert_eq!(
            pkg.license,
            Some(serde_json::json!({ "type": "MIT", "url": "https://x.dev/LICENSE" }))
        );
    }

    #[test]
    fn missing_manifest_is_reported() {
        let dir = TempDir::new().unwrap();
        let err = PackageJson::load(&ProjectContext::new(dir.path())).unwrap_err();
        assert!(matches!(err, ConfigError::ManifestNotFound(_)));
    }

    #[test]
    fn invalid_manifest_is_reported() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), "{ name: }").unwrap();
        let err = PackageJson::load(&ProjectContext::new(dir.path())).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidManifest { .. }));
    }
}
