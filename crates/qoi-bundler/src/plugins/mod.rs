//! Built-in Rolldown plugins.
//!
//! - [`LicenseStripPlugin`] drops `@license` markers so minified output can
//!   shed the banner comments
//! - [`LiteralMinifyPlugin`] collapses whitespace in `html`/`css`/`svg`
//!   tagged templates

pub mod license;
pub mod literals;
pub mod registry;

pub use license::LicenseStripPlugin;
pub use literals::LiteralMinifyPlugin;
pub use registry::{PluginPhase, PluginRegistry, QoiPlugin};

/// Modules under `node_modules` are never rewritten by the built-in
/// transforms.
pub(crate) fn is_dependency(id: &str) -> bool {
    id.contains("/node_modules/") || id.contains("\\node_modules\\")
}
