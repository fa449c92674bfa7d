//! Config module loading.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::error::{ConfigError, Result};

/// Loads a config module into a JSON value.
pub trait ModuleLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Value>;
}

/// Loads JSON and TOML config files from disk.
///
/// The parser is picked by extension. Files with any other extension are
/// tried as JSON first, then as TOML.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileModuleLoader;

impl ModuleLoader for FileModuleLoader {
    fn load(&self, path: &Path) -> Result<Value> {
        let content = fs::read_to_string(path)?;
        let load_error = |message: String| ConfigError::Load {
            path: path.to_path_buf(),
            message,
        };

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => parse_json(&content).map_err(load_error),
            Some("toml") => parse_toml(&content).map_err(load_error),
            _ => parse_json(&content).or_else(|json_err| {
                parse_toml(&content).map_err(|toml_err| {
                    load_error(format!(
                        "not valid JSON ({json_err}) or TOML ({toml_err})"
                    ))
                })
            }),
        }
    }
}

fn parse_json(content: &str) -> std::result::Result<Value, String> {
    serde_json::from_str(content).map_err(|e| format!("invalid JSON: {e}"))
}

fn parse_toml(content: &str) -> std::result::Result<Value, String> {
    let value: toml::Value =
        toml::from_str(content).map_err(|e| format!("invalid TOML: {}", e.message()))?;
    serde_json::to_value(value).map_err(|e| format!("TOML to JSON conversion failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn loads_by_extension() {
        let dir = TempDir::new().unwrap();
        let json_path = dir.path().join("qoi.config.json");
        let toml_path = dir.path().join("qoi.config.toml");
        fs::write(&json_path, r#"{ "name": "a" }"#).unwrap();
        fs::write(&toml_path, "[[targets]]\nname = \"b\"\n").unwrap();

        assert_eq!(FileModuleLoader.load(&json_path).unwrap(), json!({ "name": "a" }));
        assert_eq!(
            FileModuleLoader.load(&toml_path).unwrap(),
            json!({ "targets": [{ "name": "b" }] })
        );
    }

    #[test]
    fn unknown_extension_falls_back_to_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("qoirc");
        fs::write(&path, "name = \"c\"\n").unwrap();
        assert_eq!(FileModuleLoader.load(&path).unwrap(), json!({ "name": "c" }));
    }

    #[test]
    fn syntax_errors_surface_as_load_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("qoi.config.json");
        fs::write(&path, "{ name: ").unwrap();
        let err = FileModuleLoader.load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Load { .. }));
    }

    #[test]
    fn unreadable_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = FileModuleLoader.load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
