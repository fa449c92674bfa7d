//! Miette diagnostic conversion for CLI errors.

use crate::error::CliError;
use ::miette::Report;

/// Convert CliError to miette Report
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Bundler(e) => bundler_error_to_miette(e),
        CliError::Config(e) => ::miette::miette!("{}", e),
        CliError::Project(e) => ::miette::miette!(
            help = "Check package.json and your qoi config for syntax errors.",
            "{}",
            e
        ),
        CliError::FileNotFound(path) => ::miette::miette!(
            help = "Paths are resolved against the project root, then the modules directory.",
            "File not found: {}",
            path.display()
        ),
        _ => ::miette::miette!("{}", err),
    }
}

/// Convert qoi-bundler Error to miette Report
pub fn bundler_error_to_miette(err: qoi_bundler::Error) -> Report {
    // The bundler error carries its own codes, help and related errors.
    Report::new(err)
}
