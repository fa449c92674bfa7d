//! Code build invoker.

use std::path::PathBuf;

use futures::future::join_all;
use tracing::{debug, info};

use crate::engine::{Artifact, BundleEngine};
use crate::output::OutputDescriptor;
use crate::output::writer::write_artifacts;
use crate::plan::BuildPlan;
use crate::{Error, Result};

/// Artifacts of one output descriptor.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub descriptor: OutputDescriptor,
    pub artifacts: Vec<Artifact>,
    /// Paths written to disk; empty when writing is disabled.
    pub written: Vec<PathBuf>,
}

/// Run one engine invocation per output descriptor, concurrently.
///
/// With `write` the artifacts are written under each descriptor's `dir`,
/// otherwise they are only returned.
pub async fn build(
    engine: &dyn BundleEngine,
    plan: &BuildPlan,
    write: bool,
) -> Result<Vec<BuildOutput>> {
    let results = join_all(plan.outputs.iter().map(|descriptor| async move {
        debug!(
            target = %plan.input.target,
            format = %descriptor.format,
            dir = %descriptor.dir.display(),
            "bundling"
        );
        let artifacts = engine.build(&plan.input, descriptor).await?;
        let written = if write {
            write_artifacts(&descriptor.dir, &artifacts)?
        } else {
            Vec::new()
        };
        Ok::<_, Error>(BuildOutput {
            descriptor: descriptor.clone(),
            artifacts,
            written,
        })
    }))
    .await;

    let mut outputs = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(output) => outputs.push(output),
            Err(err) => errors.push(err),
        }
    }
    Error::aggregate(errors)?;

    info!(
        target = %plan.input.target,
        bundles = outputs.len(),
        "code build finished"
    );
    Ok(outputs)
}
