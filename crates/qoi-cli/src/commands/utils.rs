//! Shared utilities for command implementations.

use crate::error::Result;
use qoi_bundler::{BuildReport, TargetReport};
use qoi_config::ProjectContext;
use std::path::{Path, PathBuf};

/// Project roots for this process: `APP_ROOT_PATH`, else the working
/// directory.
pub fn project_context() -> Result<ProjectContext> {
    Ok(ProjectContext::from_env()?)
}

/// Display `path` relative to `root` when it lives below it.
pub fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// `(path, size)` rows for every artifact a target produced, written or not.
pub fn target_entries(target: &TargetReport, root: &Path) -> Vec<(String, u64)> {
    let code = target.code.iter().flat_map(|output| {
        output
            .artifacts
            .iter()
            .map(|artifact| (output.descriptor.dir.join(&artifact.file_name), artifact))
    });
    let declarations = target.declarations.iter().flat_map(|output| {
        let dir = output.file.parent().map(Path::to_path_buf).unwrap_or_default();
        output
            .artifacts
            .iter()
            .map(move |artifact| (dir.join(&artifact.file_name), artifact))
    });

    code.chain(declarations)
        .map(|(path, artifact)| (display_path(&path, root), artifact.contents.len() as u64))
        .chain(target.manifest.iter().chain(&target.readme).map(|path| {
            let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
            (display_path(path, root), size)
        }))
        .collect()
}

/// Rows for the whole run, in target order.
pub fn summary_entries(report: &BuildReport, root: &Path) -> Vec<(String, u64)> {
    report
        .targets
        .iter()
        .flat_map(|target| target_entries(target, root))
        .collect()
}

/// Locate a script: first relative to the project root, then relative to the
/// modules directory.
pub fn resolve_script(ctx: &ProjectContext, file: &str) -> Option<PathBuf> {
    let candidates = [ctx.resolve(file), ctx.modules_dir().join(file)];
    candidates.into_iter().find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use qoi_bundler::{
        Artifact, ArtifactKind, BuildOutput, DeclarationOutput, ModuleFormat, OutputDescriptor,
    };
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_script_prefers_root() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("node_modules/tool")).unwrap();
        fs::write(dir.path().join("node_modules/tool/cli.js"), "").unwrap();
        fs::write(dir.path().join("seed.js"), "").unwrap();

        let ctx = ProjectContext::new(dir.path());
        assert_eq!(
            resolve_script(&ctx, "seed.js"),
            Some(dir.path().join("seed.js"))
        );
        assert_eq!(
            resolve_script(&ctx, "tool/cli.js"),
            Some(dir.path().join("node_modules/tool/cli.js"))
        );
        assert_eq!(resolve_script(&ctx, "missing.js"), None);
    }

    #[test]
    fn test_display_path() {
        let root = Path::new("/project");
        assert_eq!(display_path(Path::new("/project/dist/y.js"), root), "dist/y.js");
        assert_eq!(display_path(Path::new("/elsewhere/y.js"), root), "/elsewhere/y.js");
    }

    #[test]
    fn test_target_entries_cover_code_and_declarations() {
        let root = Path::new("/project");
        let descriptor = OutputDescriptor::for_format(
            &root.join("dist"),
            "es",
            ModuleFormat::Es,
            "y",
            false,
            false,
        );
        let target = TargetReport {
            name: "default".into(),
            code: vec![BuildOutput {
                descriptor,
                artifacts: vec![Artifact::new("y.js", b"export {}".to_vec(), ArtifactKind::Chunk)],
                written: Vec::new(),
            }],
            declarations: Some(DeclarationOutput {
                file: root.join("dist/y.d.ts"),
                artifacts: vec![Artifact::new(
                    "y.d.ts",
                    b"export {};\n".to_vec(),
                    ArtifactKind::Declaration,
                )],
                written: Vec::new(),
            }),
            manifest: None,
            readme: None,
        };

        assert_eq!(
            target_entries(&target, root),
            [("dist/y.js".to_string(), 9), ("dist/y.d.ts".to_string(), 11)]
        );
    }
}
