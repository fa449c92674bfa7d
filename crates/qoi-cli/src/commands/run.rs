//! Run command implementation.
//!
//! Implements `qoi run <file>` and the `qoi <file>` shorthand: the script
//! runs under the configured JavaScript runtime with the project's
//! environment overlay added to the child's environment.

use crate::cli::RunArgs;
use crate::commands::utils;
use crate::error::{CliError, Result};
use qoi_config::load_script_env;
use tokio::process::Command;
use tracing::debug;

/// Execute the run command and return the script's exit code.
pub async fn execute(args: RunArgs) -> Result<i32> {
    let ctx = utils::project_context()?;
    let script = utils::resolve_script(&ctx, &args.file)
        .ok_or_else(|| CliError::FileNotFound(ctx.resolve(&args.file)))?;
    let env = load_script_env(args.env.as_deref(), &ctx)?;

    debug!(
        script = %script.display(),
        runtime = %args.runtime,
        vars = env.len(),
        "running script"
    );

    let status = Command::new(&args.runtime)
        .arg(&script)
        .args(&args.args)
        .envs(env.iter())
        .current_dir(ctx.root())
        .status()
        .await
        .map_err(|source| CliError::Spawn {
            runtime: args.runtime.clone(),
            source,
        })?;

    // A signal-terminated child has no code.
    Ok(status.code().unwrap_or(1))
}
