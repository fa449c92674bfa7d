//! qoi CLI - build JavaScript/TypeScript packages ready to publish.
//!
//! The binary is a thin layer over `qoi-bundler`:
//!
//! - [`cli`] - clap definitions for `build`, `run` and the `qoi <file>` shorthand
//! - [`config`] - figment layering of defaults, `QOI_*` variables and flags
//! - [`commands`] - command implementations
//! - [`error`] - CLI error type and miette conversion
//! - [`logger`] - tracing subscriber setup
//! - [`ui`] - status lines, spinner and build summary
//!
//! ```rust,no_run
//! use qoi_cli::{config, logger, cli::BuildArgs};
//!
//! logger::init_logger(false, false, false);
//! let options = config::load_build_options(&BuildArgs::default())?;
//! println!("building into {}", options.out_dir);
//! # Ok::<(), qoi_cli::CliError>(())
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{CliError, ConfigError, Result};
