//! Command-line interface definition for qoi.
//!
//! # Command Structure
//!
//! - `qoi build [dir]` - Build every configured target
//! - `qoi run <file>` - Run a script with the project's environment
//! - `qoi <file>` - Shorthand for `qoi run <file>`

mod commands;

use clap::Parser;

pub use commands::{BuildArgs, Command, RunArgs};

/// qoi - build JavaScript/TypeScript packages ready to publish
#[derive(Parser, Debug)]
#[command(
    name = "qoi",
    version,
    about = "Build JavaScript/TypeScript packages ready to publish",
    long_about = "qoi bundles each configured target with Rolldown, emits type declarations\n\
                  and writes a publishable package.json next to the output."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}
