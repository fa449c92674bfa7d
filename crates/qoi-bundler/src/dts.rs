//! Declaration build invoker.

use std::path::PathBuf;

use qoi_config::{DeclarationMode, DtsOptions, ProjectContext, ResolveMode, TargetConfig};
use tracing::info;

use crate::engine::{Artifact, BundleEngine, DeclarationPlan};
use crate::options::BuildOptions;
use crate::output::writer::write_artifacts;
use crate::plan::BuildPlan;
use crate::{Error, Result};

const SCRIPT_EXTENSIONS: &[&str] = &[".js", ".mjs", ".cjs"];

#[derive(Debug, Clone)]
pub struct DeclarationOutput {
    pub file: PathBuf,
    pub artifacts: Vec<Artifact>,
    pub written: Vec<PathBuf>,
}

/// Whether the target needs a declaration build at all.
pub fn declarations_requested(options: &BuildOptions, config: &TargetConfig) -> bool {
    options.dts.is_requested() || config.declaration_mode().is_requested()
}

/// Whether the code build runs next to the declaration build.
///
/// A CLI `only` always skips it. A target `only` skips it unless the CLI
/// explicitly asked for `dts=true`.
pub fn code_build_requested(options: &BuildOptions, config: &TargetConfig) -> bool {
    match options.dts {
        DeclarationMode::DeclarationsOnly => false,
        DeclarationMode::On => true,
        DeclarationMode::Off => config.declaration_mode() != DeclarationMode::DeclarationsOnly,
    }
}

/// Resolve selection for the declaration build: the target's value when it
/// selects anything, else the CLI's.
pub fn declaration_resolve(options: &BuildOptions, config: &TargetConfig) -> ResolveMode {
    config
        .resolve
        .as_ref()
        .filter(|mode| mode.is_set())
        .or(options.resolve.as_ref())
        .cloned()
        .unwrap_or_default()
}

/// Default declaration file name for an entry file name pattern.
///
/// `y.js`, `y.mjs` and `y.cjs` become `y.d.ts`. Patterns with placeholders and
/// empty names fall back to `<short>.d.ts`.
pub fn declaration_file_name(entry_file_names: &str, short_name: &str) -> String {
    let name = entry_file_names.trim();
    if name.is_empty() || name.contains('[') {
        return format!("{short_name}.d.ts");
    }
    let stem = SCRIPT_EXTENSIONS
        .iter()
        .find_map(|ext| name.strip_suffix(ext))
        .unwrap_or(name);
    format!("{stem}.d.ts")
}

fn declaration_path(
    ctx: &ProjectContext,
    plan: &BuildPlan,
    detailed: Option<&DtsOptions>,
    short_name: &str,
) -> PathBuf {
    if let Some(file) = detailed.and_then(|d| d.file.as_deref()) {
        return ctx.resolve(file);
    }
    match plan.primary_output() {
        Some(descriptor) => descriptor
            .dir
            .join(declaration_file_name(&descriptor.entry_file_names, short_name)),
        None => plan.out_dir.join(format!("{short_name}.d.ts")),
    }
}

/// Run the declaration build for one target.
pub async fn build_declarations(
    engine: &dyn BundleEngine,
    ctx: &ProjectContext,
    options: &BuildOptions,
    config: &TargetConfig,
    plan: &BuildPlan,
    short_name: &str,
) -> Result<DeclarationOutput> {
    let detailed = config.dts.as_ref().and_then(|dts| dts.options());
    let resolve = declaration_resolve(options, config);
    let respect_external = detailed
        .and_then(|d| d.resolve.as_ref())
        .is_some_and(ResolveMode::collapse)
        || resolve.collapse();
    let write = detailed.and_then(|d| d.write).unwrap_or(options.write);
    let file = declaration_path(ctx, plan, detailed, short_name);

    let declaration_plan = DeclarationPlan {
        target: plan.input.target.clone(),
        cwd: plan.input.cwd.clone(),
        entries: plan.input.entries.clone(),
        external: plan.input.external.clone(),
        respect_external,
        file: file.clone(),
    };

    let artifacts = engine
        .declaration_build(&declaration_plan)
        .await
        .map_err(|err| match err {
            Error::Declaration(_) => err,
            other => Error::Declaration(other.to_string()),
        })?;

    let written = if write {
        write_artifacts(file.parent().unwrap_or(&plan.out_dir), &artifacts)?
    } else {
        Vec::new()
    };

    info!(
        target = %plan.input.target,
        file = %file.display(),
        "declaration build finished"
    );
    Ok(DeclarationOutput {
        file,
        artifacts,
        written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use qoi_config::DtsSetting;

    fn target(dts: DeclarationMode) -> TargetConfig {
        TargetConfig {
            dts: Some(DtsSetting::Mode(dts)),
            ..Default::default()
        }
    }

    fn cli(dts: DeclarationMode) -> BuildOptions {
        BuildOptions {
            dts,
            ..Default::default()
        }
    }

    #[test]
    fn file_names() {
        assert_eq!(declaration_file_name("y.js", "y"), "y.d.ts");
        assert_eq!(declaration_file_name("y.mjs", "y"), "y.d.ts");
        assert_eq!(declaration_file_name("index.cjs", "y"), "index.d.ts");
        assert_eq!(declaration_file_name("[name].js", "y"), "y.d.ts");
        assert_eq!(declaration_file_name("", "y"), "y.d.ts");
    }

    #[test]
    fn code_build_gating() {
        use DeclarationMode::*;
        assert!(code_build_requested(&cli(Off), &target(Off)));
        assert!(!code_build_requested(&cli(DeclarationsOnly), &target(Off)));
        assert!(!code_build_requested(&cli(Off), &target(DeclarationsOnly)));
        assert!(code_build_requested(&cli(On), &target(DeclarationsOnly)));
    }

    #[test]
    fn declarations_requested_by_either_side() {
        use DeclarationMode::*;
        assert!(!declarations_requested(&cli(Off), &target(Off)));
        assert!(declarations_requested(&cli(On), &target(Off)));
        assert!(declarations_requested(&cli(Off), &target(DeclarationsOnly)));
    }

    #[test]
    fn declaration_resolve_prefers_a_set_target_value() {
        let options = BuildOptions {
            resolve: Some(ResolveMode::All),
            ..Default::default()
        };
        let mut config = TargetConfig {
            resolve: Some(ResolveMode::None),
            ..Default::default()
        };
        assert_eq!(declaration_resolve(&options, &config), ResolveMode::All);

        config.resolve = Some(ResolveMode::only(["a"]));
        assert_eq!(declaration_resolve(&options, &config), ResolveMode::only(["a"]));
    }
}
