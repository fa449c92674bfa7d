//! Artifact writing.
//!
//! Every artifact path is validated against its output directory, then all
//! files of one build are written through temp files and renamed into place.
//! If any write fails, the temp files written so far are removed.

use std::fs;
use std::path::{Path, PathBuf};

use path_clean::PathClean;
use tracing::{debug, warn};

use crate::engine::Artifact;
use crate::{Error, Result};

/// Write `artifacts` under `dir`. Returns the written paths.
pub fn write_artifacts(dir: &Path, artifacts: &[Artifact]) -> Result<Vec<PathBuf>> {
    let dir = dir.clean();
    fs::create_dir_all(&dir).map_err(|e| {
        Error::WriteFailure(format!(
            "Failed to create output directory '{}': {}",
            dir.display(),
            e
        ))
    })?;

    let operations = artifacts
        .iter()
        .map(|artifact| {
            let path = validate_output_path(&dir, &artifact.file_name)?;
            Ok((path, artifact.contents.as_slice()))
        })
        .collect::<Result<Vec<_>>>()?;

    write_files_atomic(&operations)?;
    debug!(dir = %dir.display(), count = operations.len(), "wrote artifacts");
    Ok(operations.into_iter().map(|(path, _)| path).collect())
}

/// Remove `dir` recursively. A missing directory is not an error.
pub fn clean_dir(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => {
            debug!(dir = %dir.display(), "cleaned output directory");
            Ok(())
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(Error::WriteFailure(format!(
            "Failed to clean '{}': {}",
            dir.display(),
            err
        ))),
    }
}

/// Resolve `filename` under `base_dir`, rejecting anything that escapes it.
pub(crate) fn validate_output_path(base_dir: &Path, filename: &str) -> Result<PathBuf> {
    if filename.contains('\0') {
        return Err(Error::InvalidOutputPath(
            "Filename contains null byte".to_string(),
        ));
    }

    let full_path = base_dir.join(Path::new(filename).clean()).clean();

    if !full_path.starts_with(base_dir) {
        return Err(Error::InvalidOutputPath(format!(
            "Path '{}' escapes output directory '{}' (resolved to '{}')",
            filename,
            base_dir.display(),
            full_path.display()
        )));
    }

    Ok(full_path)
}

fn temp_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

fn write_files_atomic(operations: &[(PathBuf, &[u8])]) -> Result<()> {
    let mut temp_files = Vec::new();

    for (target_path, content) in operations {
        if let Some(parent) = target_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                cleanup_temp_files(&temp_files);
                Error::WriteFailure(format!(
                    "Failed to create directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let temp = temp_path(target_path);
        fs::write(&temp, content).map_err(|e| {
            cleanup_temp_files(&temp_files);
            Error::WriteFailure(format!(
                "Failed to write temporary file '{}': {}",
                temp.display(),
                e
            ))
        })?;

        temp_files.push((temp, target_path.clone()));
    }

    for (temp, target_path) in &temp_files {
        fs::rename(temp, target_path).map_err(|e| {
            cleanup_temp_files(&temp_files);
            Error::WriteFailure(format!(
                "Failed to rename '{}' to '{}': {}",
                temp.display(),
                target_path.display(),
                e
            ))
        })?;
    }

    Ok(())
}

fn cleanup_temp_files(temp_files: &[(PathBuf, PathBuf)]) {
    for (temp, _) in temp_files {
        if temp.exists() {
            if let Err(e) = fs::remove_file(temp) {
                warn!(path = %temp.display(), error = %e, "failed to clean up temporary file");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ArtifactKind;
    use tempfile::TempDir;

    #[test]
    fn test_validate_output_path_normal() {
        let base = Path::new("/tmp/output");
        let result = validate_output_path(base, "index.js");
        assert_eq!(result.unwrap(), Path::new("/tmp/output/index.js"));
    }

    #[test]
    fn test_validate_output_path_nested() {
        let base = Path::new("/tmp/output");
        let result = validate_output_path(base, "chunks/shared.js");
        assert_eq!(result.unwrap(), Path::new("/tmp/output/chunks/shared.js"));
    }

    #[test]
    fn test_validate_output_path_traversal() {
        let base = Path::new("/tmp/output");
        assert!(matches!(
            validate_output_path(base, "../etc/passwd"),
            Err(Error::InvalidOutputPath(_))
        ));
        assert!(validate_output_path(base, "safe/../../../../etc/passwd").is_err());
    }

    #[test]
    fn test_validate_output_path_null_byte() {
        assert!(validate_output_path(Path::new("/tmp/output"), "file\0name.js").is_err());
    }

    #[test]
    fn writes_every_artifact_and_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("dist");
        let artifacts = vec![
            Artifact::chunk("y.js", "export const y = 1;"),
            Artifact::new("y.js.map", b"{}".to_vec(), ArtifactKind::Asset),
        ];

        let written = write_artifacts(&out, &artifacts).unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(fs::read_to_string(out.join("y.js")).unwrap(), "export const y = 1;");
        assert!(!out.join("y.js.tmp").exists());
    }

    #[test]
    fn clean_dir_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("dist");
        fs::create_dir_all(out.join("cjs")).unwrap();
        clean_dir(&out).unwrap();
        assert!(!out.exists());
        clean_dir(&out).unwrap();
    }
}
