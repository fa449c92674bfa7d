use clap::{Args, Parser, Subcommand};
use serde::Serialize;

/// Available qoi subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build every configured target
    ///
    /// Bundles each target, optionally emits type declarations and writes a
    /// publishable package.json into the output directory.
    Build(BuildArgs),

    /// Run a script with the project's environment
    ///
    /// The script is looked up relative to the project root, then relative to
    /// the modules directory.
    Run(RunArgs),

    /// `qoi <file>` is shorthand for `qoi run <file>`.
    #[command(external_subcommand)]
    Script(Vec<String>),
}

/// Arguments for the build command.
///
/// Every field except the flags is optional so that only values given on the
/// command line override `QOI_*` variables and the defaults. The struct
/// serializes to the camelCase keys understood by `BuildOptions`.
#[derive(Args, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildArgs {
    /// Source directory searched for the entry file (default: src)
    #[arg(value_name = "DIR")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,

    /// Only build the targets with these names (comma separated)
    #[arg(long, value_name = "NAMES")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Config file path or module reference
    #[arg(short = 'c', long, value_name = "PATH")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,

    /// Output formats, comma separated: es, cjs (default: es)
    #[arg(short = 'f', long, value_name = "FORMATS")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Output directory (default: dist)
    #[arg(short = 'o', long, alias = "outDir", value_name = "DIR")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<String>,

    /// Emit ES modules with the .mjs extension
    #[arg(long)]
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub module: bool,

    /// Emit source maps
    #[arg(long)]
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub sourcemap: bool,

    /// Emit type declarations: true, false or only
    #[arg(long, value_name = "MODE", num_args = 0..=1, default_missing_value = "true")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dts: Option<String>,

    /// Bundle dependencies: true, false or a comma separated list of modules
    #[arg(long, value_name = "MODE", num_args = 0..=1, default_missing_value = "true")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolve: Option<String>,

    /// Extra external modules (comma separated)
    #[arg(long, value_name = "MODULES")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external: Option<String>,

    /// Remove the output directory before building
    #[arg(long, alias = "cleanOutDir")]
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub clean_out_dir: bool,

    /// Minify output: true, false or literals
    #[arg(long, value_name = "MODE", num_args = 0..=1, default_missing_value = "true")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minify: Option<String>,

    /// Env file path or comma separated KEY=VALUE pairs
    #[arg(long, value_name = "SPEC")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,

    /// Keep the output in memory instead of writing it
    #[arg(long)]
    #[serde(skip)]
    pub no_write: bool,
}

/// Arguments for the run command
#[derive(Args, Debug, Clone, PartialEq)]
pub struct RunArgs {
    /// Script to run
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Env file path or comma separated KEY=VALUE pairs
    #[arg(long, value_name = "SPEC")]
    pub env: Option<String>,

    /// JavaScript runtime used to execute the script
    #[arg(long, default_value = "node", value_name = "BIN")]
    pub runtime: String,

    /// Arguments passed through to the script
    #[arg(last = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

#[derive(Parser, Debug)]
#[command(name = "qoi", no_binary_name = true)]
struct Shorthand {
    #[command(flatten)]
    run: RunArgs,
}

impl RunArgs {
    /// Parse the arguments of `qoi <file> [options]`.
    pub fn from_shorthand(raw: &[String]) -> Result<Self, clap::Error> {
        Shorthand::try_parse_from(raw).map(|shorthand| shorthand.run)
    }
}
