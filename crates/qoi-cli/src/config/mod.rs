//! Build option layering.
//!
//! One [`BuildOptions`] value drives a run. It is assembled from three
//! sources. Priority: CLI flags > `QOI_*` environment variables > defaults.
//! Per-target settings live in the project's config file and are read later
//! by the orchestrator.

mod loading;

pub use loading::{ENV_PREFIX, load_build_options, options_figment};
pub use qoi_bundler::BuildOptions;
