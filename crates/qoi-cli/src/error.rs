//! Error handling for the qoi CLI.
//!
//! Library errors convert into [`CliError`] through `#[from]`; option
//! layering failures get their own [`ConfigError`] with a hint.

mod miette;

pub use self::miette::{bundler_error_to_miette, cli_error_to_miette};

use std::path::PathBuf;
use thiserror::Error;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Option layering errors (bad flag values, bad `QOI_*` variables)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Errors from the build pipeline
    #[error(transparent)]
    Bundler(#[from] qoi_bundler::Error),

    /// Project, manifest or environment errors raised outside a build
    #[error(transparent)]
    Project(#[from] qoi_config::ConfigError),

    /// File or directory not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The script runner could not start the runtime
    #[error("Failed to start '{runtime}': {source}")]
    Spawn {
        runtime: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while layering build options.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid value for an option
    #[error("Invalid value for '{field}': {value}\n\nHint: {hint}")]
    InvalidValue {
        field: String,
        value: String,
        hint: String,
    },
}

/// Result type alias using `CliError` as the default error type.
pub type Result<T, E = CliError> = std::result::Result<T, E>;
