//! Manifest synthesis.
//!
//! Writes the distributable `package.json` (and `README.md`) next to the
//! bundles. The synthesized manifest only carries the fields a consumer of
//! the published package needs.

use std::path::{Path, PathBuf};

use qoi_config::{PackageJson, PackageJsonSetting, merge_values};
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::{debug, info};

use crate::hooks::TargetHooks;
use crate::{Error, Result};

/// Build the manifest object for `pkg`, before any overlay or hook.
///
/// With `legacy` and no `exports` in the source manifest, a
/// `require`/`import` pair pointing at the `cjs/` copy is added.
pub fn synthesize(pkg: &PackageJson, legacy: bool) -> Map<String, Value> {
    let short = pkg.short_name();
    let main = pkg.main.clone().unwrap_or_else(|| format!("{short}.js"));
    let dual = legacy && pkg.exports.is_none();

    let mut manifest = Map::new();
    manifest.insert("name".into(), Value::String(pkg.name.clone()));
    insert_opt(&mut manifest, "version", &pkg.version);
    insert_opt(&mut manifest, "bin", &pkg.bin);
    manifest.insert(
        "type".into(),
        Value::String(pkg.kind.clone().unwrap_or_else(|| "module".to_string())),
    );
    manifest.insert("main".into(), Value::String(main.clone()));
    manifest.insert("module".into(), Value::String(main.clone()));
    if dual {
        manifest.insert(
            "exports".into(),
            json!({ "require": format!("./cjs/{main}"), "import": format!("./{main}") }),
        );
    }
    manifest.insert(
        "typings".into(),
        Value::String(
            pkg.typings
                .clone()
                .unwrap_or_else(|| format!("{short}.d.ts")),
        ),
    );
    insert_opt(&mut manifest, "keywords", &pkg.keywords);
    insert_opt(&mut manifest, "author", &pkg.author);
    insert_opt(&mut manifest, "license", &pkg.license);
    insert_opt(&mut manifest, "peerDependencies", &pkg.peer_dependencies);
    insert_opt(&mut manifest, "dependencies", &pkg.dependencies);
    manifest
}

fn insert_opt<T: Serialize>(manifest: &mut Map<String, Value>, key: &str, value: &Option<T>) {
    if let Some(value) = value {
        if let Ok(value) = serde_json::to_value(value) {
            manifest.insert(key.to_string(), value);
        }
    }
}

/// Apply the config overlay, then the hook. A boolean `packageJson` setting
/// applies neither.
pub fn apply_hooks(
    manifest: Map<String, Value>,
    setting: Option<&PackageJsonSetting>,
    hooks: Option<&dyn TargetHooks>,
) -> Result<Value> {
    let mut value = Value::Object(manifest);
    if matches!(setting, Some(PackageJsonSetting::Flag(_))) {
        return Ok(value);
    }

    if let Some(overlay) = setting.and_then(PackageJsonSetting::overlay) {
        merge_values(&mut value, &Value::Object(overlay.clone()));
    }
    if let Some(hooks) = hooks {
        value = hooks.package_json(value)?;
    }

    match value.get("name") {
        Some(Value::String(name)) if !name.is_empty() => Ok(value),
        _ => Err(Error::InvalidManifest(
            "the transformed manifest must be an object with a string 'name'".to_string(),
        )),
    }
}

/// Synthesize and write `out_dir/package.json`. Legacy output also gets
/// `out_dir/cjs/package.json` marking that subtree as CommonJS.
pub async fn copy_package(
    pkg: &PackageJson,
    out_dir: &Path,
    legacy: bool,
    setting: Option<&PackageJsonSetting>,
    hooks: Option<&dyn TargetHooks>,
) -> Result<PathBuf> {
    let dual = legacy && pkg.exports.is_none();
    let manifest = apply_hooks(synthesize(pkg, legacy), setting, hooks)?;

    let path = out_dir.join("package.json");
    write_json(&path, &manifest).await?;
    if dual {
        write_json(&out_dir.join("cjs").join("package.json"), &json!({ "type": "commonjs" }))
            .await?;
    }

    info!(path = %path.display(), "wrote package manifest");
    Ok(path)
}

async fn write_json(path: &Path, value: &Value) -> Result<()> {
    let content = serde_json::to_string_pretty(value)
        .map_err(|e| Error::InvalidManifest(e.to_string()))?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, content).await.map_err(|e| {
        Error::WriteFailure(format!("Failed to write '{}': {}", path.display(), e))
    })
}

/// Copy `root/README.md` into `out_dir`.
///
/// Only a missing README is skipped. Any failure while copying one that
/// exists is returned.
pub async fn copy_readme(root: &Path, out_dir: &Path) -> Result<Option<PathBuf>> {
    let source = root.join("README.md");
    if !source.is_file() {
        debug!(path = %source.display(), "no README to copy");
        return Ok(None);
    }
    let dest = out_dir.join("README.md");
    tokio::fs::create_dir_all(out_dir).await?;
    tokio::fs::copy(&source, &dest).await?;
    Ok(Some(dest))
}
