//! Error types for configuration, manifest and environment loading.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    // Manifest errors
    #[error("package.json not found: {}", .0.display())]
    ManifestNotFound(PathBuf),

    #[error("invalid package.json at {}: {message}", .path.display())]
    InvalidManifest { path: PathBuf, message: String },

    // Config module errors
    #[error("failed to load config {}: {message}", .path.display())]
    Load { path: PathBuf, message: String },

    #[error("unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid config value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    #[error("config provider '{name}' failed: {message}")]
    Provider { name: String, message: String },

    // Environment injection errors
    #[error("invalid environment entry '{0}': expected KEY=VALUE")]
    InvalidEnvEntry(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub(crate) fn invalid_value(field: impl Into<String>, message: impl ToString) -> Self {
        ConfigError::InvalidValue {
            field: field.into(),
            message: message.to_string(),
        }
    }
}
