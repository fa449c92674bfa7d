//! # qoi-config
//!
//! Everything the build pipeline reads before it starts bundling: project
//! roots, the package manifest, the active target configuration and the
//! environment overlay.
//!
//! ```no_run
//! use qoi_config::{ConfigResolver, PackageJson, ProjectContext};
//!
//! # fn main() -> qoi_config::Result<()> {
//! let ctx = ProjectContext::from_env()?;
//! let pkg = PackageJson::load(&ctx)?;
//! let targets = ConfigResolver::new(ctx.clone()).resolve(None)?.into_targets();
//! println!("{} has {} target(s)", pkg.short_name(), targets.len());
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod discovery;
pub mod env;
pub mod error;
pub mod loader;
pub mod manifest;
pub mod merge;
pub mod selectors;
pub mod target;

pub use context::{CONFIG_ROOT_ENV, ProjectContext, ROOT_ENV};
pub use discovery::{ConfigProvider, ConfigResolver, ConfigSource};
pub use env::{EnvOverlay, load_env, load_script_env};
pub use error::{ConfigError, Result};
pub use loader::{FileModuleLoader, ModuleLoader};
pub use manifest::{PackageJson, short_name};
pub use merge::merge_values;
pub use selectors::{DeclarationMode, MinifyMode, ResolveMode};
pub use target::{
    BuildEndStep, ConfigSet, DtsOptions, DtsSetting, EntryInput, OutputOverrides,
    PackageJsonSetting, TargetConfig, TransformOptions,
};
