//! Declarative post-build steps.

use std::path::Path;

use qoi_config::{BuildEndStep, ProjectContext};
use tracing::debug;
use walkdir::WalkDir;

use crate::{Error, Result};

/// Run `steps` in order. The first failing step stops the sequence.
pub async fn run_steps(ctx: &ProjectContext, steps: &[BuildEndStep]) -> Result<()> {
    for step in steps {
        match step {
            BuildEndStep::Copy { from, to } => {
                copy(&ctx.resolve(from), &ctx.resolve(to)).await?;
            }
            BuildEndStep::Remove { path } => {
                remove(&ctx.resolve(path)).await?;
            }
        }
    }
    Ok(())
}

async fn copy(from: &Path, to: &Path) -> Result<()> {
    let metadata = tokio::fs::metadata(from)
        .await
        .map_err(|e| Error::Hook(format!("cannot copy '{}': {}", from.display(), e)))?;

    if metadata.is_file() {
        if let Some(parent) = to.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(from, to).await?;
        debug!(from = %from.display(), to = %to.display(), "copied file");
        return Ok(());
    }

    for entry in WalkDir::new(from) {
        let entry = entry.map_err(|e| Error::Hook(e.to_string()))?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| Error::Hook(e.to_string()))?;
        let dest = to.join(relative);
        if entry.file_type().is_dir() {
            tokio::fs::create_dir_all(&dest).await?;
        } else {
            tokio::fs::copy(entry.path(), &dest).await?;
        }
    }
    debug!(from = %from.display(), to = %to.display(), "copied directory");
    Ok(())
}

async fn remove(path: &Path) -> Result<()> {
    let result = match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.is_dir() => tokio::fs::remove_dir_all(path).await,
        Ok(_) => tokio::fs::remove_file(path).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(()) => {
            debug!(path = %path.display(), "removed");
            Ok(())
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn copies_directories_and_removes_paths() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("assets/icons")).unwrap();
        fs::write(dir.path().join("assets/icons/a.svg"), "<svg/>").unwrap();
        fs::create_dir_all(dir.path().join("dist/tmp")).unwrap();

        let ctx = ProjectContext::new(dir.path());
        run_steps(
            &ctx,
            &[
                BuildEndStep::Copy {
                    from: "assets".into(),
                    to: "dist/assets".into(),
                },
                BuildEndStep::Remove {
                    path: "dist/tmp".into(),
                },
                BuildEndStep::Remove {
                    path: "dist/never-existed".into(),
                },
            ],
        )
        .await
        .unwrap();

        assert!(dir.path().join("dist/assets/icons/a.svg").is_file());
        assert!(!dir.path().join("dist/tmp").exists());
    }

    #[tokio::test]
    async fn copying_a_missing_source_fails() {
        let dir = TempDir::new().unwrap();
        let ctx = ProjectContext::new(dir.path());
        let err = run_steps(
            &ctx,
            &[BuildEndStep::Copy {
                from: "nope".into(),
                to: "dist/nope".into(),
            }],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Hook(_)));
    }
}
