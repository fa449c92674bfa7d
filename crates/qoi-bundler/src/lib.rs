//! # qoi-bundler
//!
//! Build orchestration on top of Rolldown.
//!
//! For every configured target this crate computes the external set, merges
//! CLI options with the target's config, runs a code build and a declaration
//! build through a [`BundleEngine`], and synthesizes the distributable
//! `package.json`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use qoi_bundler::{BuildOptions, Orchestrator, RolldownEngine};
//! use qoi_config::ProjectContext;
//!
//! # #[tokio::main]
//! # async fn main() -> qoi_bundler::Result<()> {
//! let ctx = ProjectContext::from_env()?;
//! let options = BuildOptions::default();
//! let report = Orchestrator::new(ctx, options, Arc::new(RolldownEngine::new()))
//!     .run()
//!     .await?;
//! println!("built {} target(s)", report.targets.len());
//! # Ok(()) }
//! ```

pub mod build;
pub mod dts;
pub mod engine;
pub mod externals;
pub mod hooks;
pub mod manifest;
pub mod options;
pub mod orchestrator;
pub mod output;
pub mod plan;
pub mod plugins;
pub mod post_build;
pub mod rolldown_engine;
pub mod tasks;

pub use build::BuildOutput;
pub use dts::DeclarationOutput;
pub use engine::{Artifact, ArtifactKind, BundleEngine, BundleInput, DeclarationPlan, EntryItem};
pub use externals::{NODE_BUILTINS, base_externals, resolve_externals};
pub use hooks::{Target, TargetHooks};
pub use options::BuildOptions;
pub use orchestrator::{BuildReport, Orchestrator, TargetReport};
pub use output::{ModuleFormat, OutputDescriptor};
pub use plan::{BuildPlan, PluginStep};
pub use rolldown_engine::RolldownEngine;
pub use tasks::TaskGroup;

// Re-export plugin types for hook authors
pub use rolldown_plugin::{
    __inner::SharedPluginable, HookTransformArgs, HookTransformOutput, HookTransformReturn,
    HookUsage, Plugin, SharedTransformPluginContext,
};

/// Error types for qoi-bundler operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration, manifest or environment error.
    #[error(transparent)]
    Config(#[from] qoi_config::ConfigError),

    /// No entry file matched the conventional candidates.
    #[error("entry file does not exist (searched {} for {})", .dir.display(), .candidates.join(", "))]
    EntryNotFound {
        dir: std::path::PathBuf,
        candidates: Vec<String>,
    },

    /// Error from the bundling engine.
    #[error("bundler error: {0}")]
    Engine(String),

    /// Declaration generation failed.
    #[error("declaration build failed: {0}")]
    Declaration(String),

    /// An output descriptor violated its invariants.
    #[error("invalid output options: {0}")]
    InvalidOutput(String),

    /// Invalid output path (e.g., directory traversal attempt).
    #[error("invalid output path: {0}")]
    InvalidOutputPath(String),

    /// The package.json hook produced an unusable manifest.
    #[error("invalid package.json: {0}")]
    InvalidManifest(String),

    /// File write operation failed.
    #[error("write failure: {0}")]
    WriteFailure(String),

    /// A post-build step or hook failed.
    #[error("build end hook failed: {0}")]
    Hook(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error attributed to one target.
    #[error("target '{target}': {source}")]
    Target {
        target: String,
        #[source]
        source: Box<Error>,
    },

    /// Several independent tasks failed.
    #[error("{} errors: {}", .0.len(), format_errors(.0))]
    Multiple(Vec<Error>),
}

/// Result type alias for qoi-bundler operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an engine error from a Rolldown error batch.
    pub fn from_rolldown_batch(error: &dyn std::fmt::Debug) -> Self {
        Error::Engine(format!("{error:?}"))
    }

    pub fn for_target(self, target: impl Into<String>) -> Self {
        Error::Target {
            target: target.into(),
            source: Box::new(self),
        }
    }

    /// Collapse a list of failures: none is success, one is returned as is.
    pub fn aggregate(mut errors: Vec<Error>) -> Result<()> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(Error::Multiple(errors)),
        }
    }

    /// Every leaf error, with `Multiple` flattened.
    pub fn leaves(&self) -> Vec<&Error> {
        match self {
            Error::Multiple(errors) => errors.iter().flat_map(Error::leaves).collect(),
            Error::Target { source, .. } if matches!(**source, Error::Multiple(_)) => {
                source.leaves()
            }
            other => vec![other],
        }
    }
}

fn format_errors(errors: &[Error]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::Config(_) => "CONFIG_ERROR",
            Error::EntryNotFound { .. } => "ENTRY_NOT_FOUND",
            Error::Engine(_) => "BUNDLER_ERROR",
            Error::Declaration(_) => "DECLARATION_ERROR",
            Error::InvalidOutput(_) => "INVALID_OUTPUT",
            Error::InvalidOutputPath(_) => "INVALID_OUTPUT_PATH",
            Error::InvalidManifest(_) => "INVALID_MANIFEST",
            Error::WriteFailure(_) => "WRITE_FAILURE",
            Error::Hook(_) => "HOOK_FAILURE",
            Error::Io(_) => "IO_ERROR",
            Error::Target { .. } => "TARGET_FAILED",
            Error::Multiple(_) => "MULTIPLE_ERRORS",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::EntryNotFound { .. } => Some(Box::new(
                "Add src/index.ts (or main.*) or set `input` in your qoi config.",
            )),
            Error::Config(_) => Some(Box::new(
                "Check qoi.config.json / qoi.config.toml and package.json for syntax errors.",
            )),
            Error::InvalidOutput(_) => Some(Box::new(
                "The `output` overlay and hook must keep a non-empty `dir`.",
            )),
            Error::InvalidOutputPath(path) => Some(Box::new(format!(
                "The output path '{path}' is invalid. Ensure it stays within the output directory."
            ))),
            Error::InvalidManifest(_) => Some(Box::new(
                "The packageJson hook must return an object with a string `name`.",
            )),
            Error::WriteFailure(_) => Some(Box::new(
                "Failed to write file. Check disk space and permissions.",
            )),
            Error::Target { source, .. } => source.help(),
            Error::Multiple(_) => Some(Box::new(
                "Multiple tasks failed. See the related errors below.",
            )),
            _ => None,
        }
    }

    fn related(&self) -> Option<Box<dyn Iterator<Item = &dyn miette::Diagnostic> + '_>> {
        match self {
            Error::Multiple(errors) => Some(Box::new(
                errors.iter().map(|e| e as &dyn miette::Diagnostic),
            )),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_keeps_every_failure() {
        assert!(Error::aggregate(Vec::new()).is_ok());

        let single = Error::aggregate(vec![Error::Engine("a".into())]).unwrap_err();
        assert!(matches!(single, Error::Engine(_)));

        let many = Error::aggregate(vec![
            Error::Engine("a".into()),
            Error::Declaration("b".into()),
        ])
        .unwrap_err();
        assert_eq!(many.leaves().len(), 2);
        assert!(many.to_string().starts_with("2 errors"));
    }

    #[test]
    fn target_context_is_transparent_to_leaves() {
        let err = Error::Multiple(vec![Error::Engine("x".into()), Error::Hook("y".into())])
            .for_target("lib");
        assert_eq!(err.leaves().len(), 2);
        assert!(err.to_string().starts_with("target 'lib'"));
    }

    #[test]
    fn entry_not_found_mentions_the_missing_entry() {
        let err = Error::EntryNotFound {
            dir: "src".into(),
            candidates: vec!["index.ts".into()],
        };
        assert!(err.to_string().contains("entry file does not exist"));
    }
}
