//! Build command implementation.
//!
//! Implements `qoi build`: layer the options, discover the targets and run
//! them all through the Rolldown engine.

use crate::cli::BuildArgs;
use crate::commands::utils;
use crate::config::load_build_options;
use crate::error::Result;
use crate::ui;
use qoi_bundler::{Orchestrator, RolldownEngine};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Execute the build command.
///
/// Every target is attempted even when a sibling fails; the returned error
/// then carries every failure.
pub async fn execute(args: BuildArgs) -> Result<()> {
    let start_time = Instant::now();

    let options = load_build_options(&args)?;
    let ctx = utils::project_context()?;
    debug!(
        root = %ctx.root().display(),
        config_root = %ctx.config_root().display(),
        "project roots"
    );

    let spinner = ui::is_interactive().then(|| ui::Spinner::new("Building targets..."));
    let engine = Arc::new(RolldownEngine::new());
    let orchestrator = Orchestrator::new(ctx.clone(), options.clone(), engine);

    let report = match orchestrator.run().await {
        Ok(report) => report,
        Err(err) => {
            if let Some(spinner) = &spinner {
                spinner.fail("Build failed");
            }
            let failures = err.leaves().len();
            if failures > 1 {
                ui::error(&format!("{failures} tasks failed"));
            }
            return Err(err.into());
        }
    };

    let duration = start_time.elapsed();
    if let Some(spinner) = &spinner {
        spinner.finish(&format!("Built {} target(s)", report.targets.len()));
    }

    if report.targets.is_empty() {
        match options.name.as_deref() {
            Some(names) => ui::warning(&format!("No target matches --name {names}")),
            None => ui::warning("No targets to build"),
        }
        return Ok(());
    }

    ui::print_build_summary(&utils::summary_entries(&report, ctx.root()), duration);
    if !options.write {
        ui::info("Nothing was written (--no-write)");
    }
    ui::success(&format!("Build completed in {}", ui::format_duration(duration)));
    Ok(())
}
