//! Project roots threaded through every resolver call.

use std::path::{Path, PathBuf};

use path_clean::PathClean;

use crate::error::Result;

/// Environment variable overriding the project base directory.
pub const ROOT_ENV: &str = "APP_ROOT_PATH";

/// Environment variable overriding the directory used for config discovery.
pub const CONFIG_ROOT_ENV: &str = "QOI_CONFIG_ROOT";

/// Roots used by manifest, entry and config discovery.
///
/// `root` and `config_root` may diverge on purpose: config discovery can look
/// at a pre-built location while the manifest is read from the live project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectContext {
    root: PathBuf,
    config_root: PathBuf,
    modules_dir: PathBuf,
}

impl ProjectContext {
    /// Create a context where every root is `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into().clean();
        Self {
            config_root: root.clone(),
            modules_dir: root.join("node_modules"),
            root,
        }
    }

    /// Build a context from the process environment and working directory.
    pub fn from_env() -> Result<Self> {
        let cwd = std::env::current_dir()?;
        Ok(Self::from_lookup(&cwd, |key| std::env::var(key).ok()))
    }

    /// Build a context from an arbitrary variable lookup.
    ///
    /// Relative overrides resolve against `cwd`; empty values are ignored.
    pub fn from_lookup(cwd: &Path, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .map(|value| cwd.join(value.trim()).clean())
        };

        let root = read(ROOT_ENV).unwrap_or_else(|| cwd.to_path_buf());
        let mut context = Self::new(root);
        if let Some(config_root) = read(CONFIG_ROOT_ENV) {
            context.config_root = config_root;
        }
        context
    }

    pub fn with_config_root(mut self, config_root: impl Into<PathBuf>) -> Self {
        self.config_root = self.resolve(config_root.into());
        self
    }

    pub fn with_modules_dir(mut self, modules_dir: impl Into<PathBuf>) -> Self {
        self.modules_dir = self.resolve(modules_dir.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_root(&self) -> &Path {
        &self.config_root
    }

    pub fn modules_dir(&self) -> &Path {
        &self.modules_dir
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join("package.json")
    }

    /// Resolve `path` against the project root unless it is already absolute.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf().clean()
        } else {
            self.root.join(path).clean()
        }
    }
}
