//! File-based config discovery.
//!
//! Finds the active build configuration for a project and loads it into a
//! [`ConfigSet`]. A missing config is never an error: the result is then a
//! single anonymous target with default settings.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};

use crate::context::ProjectContext;
use crate::error::{ConfigError, Result};
use crate::loader::{FileModuleLoader, ModuleLoader};
use crate::target::ConfigSet;

/// Conventional config file names, in lookup order.
pub const CONFIG_FILE_NAMES: &[&str] = &["qoi.config.json", "qoi.config.toml"];

/// Directories (relative to the config root) searched for a config file.
/// `dist` holds a pre-built config.
pub const CONFIG_LOCATIONS: &[&str] = &["", ".config", "dist"];

/// Field of `package.json` holding an embedded config.
pub const PACKAGE_FIELD: &str = "qoi";

/// Factory invoked with no arguments to produce a config.
pub type ConfigProvider = Arc<dyn Fn() -> Result<ConfigSet> + Send + Sync>;

/// Where a config came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// The `qoi` field of a `package.json`.
    PackageField(PathBuf),
    /// A registered provider, looked up by module name.
    Provider(String),
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::PackageField(path) => {
                write!(f, "{}#{}", path.display(), PACKAGE_FIELD)
            }
            ConfigSource::Provider(name) => write!(f, "provider:{name}"),
        }
    }
}

/// Locates and loads the active configuration.
///
/// Resolution order:
/// 1. an explicit path (relative to the project root) naming an existing file;
/// 2. a bare module reference resolved inside the dependency directory, either
///    to a registered provider or to a config file inside that package;
/// 3. [`CONFIG_FILE_NAMES`] across [`CONFIG_LOCATIONS`] under the config root;
/// 4. the [`PACKAGE_FIELD`] field of the config root's `package.json`.
pub struct ConfigResolver {
    ctx: ProjectContext,
    loader: Arc<dyn ModuleLoader>,
    providers: IndexMap<String, ConfigProvider>,
}

impl ConfigResolver {
    pub fn new(ctx: ProjectContext) -> Self {
        Self {
            ctx,
            loader: Arc::new(FileModuleLoader),
            providers: IndexMap::new(),
        }
    }

    pub fn with_loader(mut self, loader: Arc<dyn ModuleLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// Register a provider answering to the module reference `name`.
    pub fn with_provider<F>(mut self, name: impl Into<String>, provider: F) -> Self
    where
        F: Fn() -> Result<ConfigSet> + Send + Sync + 'static,
    {
        self.providers.insert(name.into(), Arc::new(provider));
        self
    }

    pub fn context(&self) -> &ProjectContext {
        &self.ctx
    }

    /// Find the config source without loading it.
    ///
    /// Order: an explicit file, then the conventional names under
    /// `config_root` (and its `"qoi"` package field), then a bare module
    /// reference inside `modules_dir`.
    pub fn find(&self, reference: Option<&str>) -> Option<ConfigSource> {
        let reference = reference.map(str::trim).filter(|r| !r.is_empty());
        if let Some(reference) = reference {
            let explicit = self.ctx.resolve(reference);
            if explicit.is_file() {
                return Some(ConfigSource::File(explicit));
            }
        }

        if let Some(source) = find_in(self.ctx.config_root()) {
            return Some(source);
        }

        let reference = reference?;
        let module = is_bare_reference(reference)
            .then(|| self.find_module(reference))
            .flatten();
        if module.is_none() {
            warn!(config = reference, "config not found");
        }
        module
    }

    /// Resolve and load the active configuration.
    pub fn resolve(&self, reference: Option<&str>) -> Result<ConfigSet> {
        match self.find(reference) {
            Some(source) => {
                debug!(%source, "loading config");
                self.load(&source)
            }
            None => {
                debug!("no config found, using a single default target");
                Ok(ConfigSet::empty())
            }
        }
    }

    pub fn load(&self, source: &ConfigSource) -> Result<ConfigSet> {
        match source {
            ConfigSource::File(path) => ConfigSet::from_value(self.loader.load(path)?),
            ConfigSource::PackageField(path) => {
                let manifest = self.loader.load(path)?;
                let field = manifest.get(PACKAGE_FIELD).cloned().unwrap_or(Value::Null);
                ConfigSet::from_value(field)
            }
            ConfigSource::Provider(name) => {
                let provider = self.providers.get(name).ok_or_else(|| {
                    ConfigError::Provider {
                        name: name.clone(),
                        message: "no provider registered under this name".to_string(),
                    }
                })?;
                provider()
            }
        }
    }

    fn find_module(&self, reference: &str) -> Option<ConfigSource> {
        if self.providers.contains_key(reference) {
            return Some(ConfigSource::Provider(reference.to_string()));
        }

        let module = self.ctx.modules_dir().join(reference);
        if module.is_file() {
            return Some(ConfigSource::File(module));
        }
        if module.is_dir() {
            return find_in(&module);
        }
        None
    }
}

fn is_bare_reference(reference: &str) -> bool {
    !(reference.starts_with('.') || Path::new(reference).is_absolute())
}

fn find_in(root: &Path) -> Option<ConfigSource> {
    for location in CONFIG_LOCATIONS {
        let dir = root.join(location);
        for name in CONFIG_FILE_NAMES {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(ConfigSource::File(candidate));
            }
        }
    }

    let manifest = root.join("package.json");
    has_package_field(&manifest).then_some(ConfigSource::PackageField(manifest))
}

fn has_package_field(manifest: &Path) -> bool {
    let Ok(content) = std::fs::read_to_string(manifest) else {
        return false;
    };
    serde_json::from_str::<Value>(&content)
        .ok()
        .and_then(|parsed| parsed.get(PACKAGE_FIELD).map(|field| !field.is_null()))
        .unwrap_or(false)
}
