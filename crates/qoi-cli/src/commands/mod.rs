//! Command implementations for the qoi CLI.
//!
//! - [`build`] - Build every configured target
//! - [`run`] - Run a script with the project's environment
//!
//! Each command provides an `execute` function that takes the parsed
//! arguments and returns a Result.

pub mod build;
pub mod run;
pub mod utils;

pub use build::execute as build_execute;
pub use run::execute as run_execute;
