//! Behavior attached to a target from Rust code.
//!
//! Config files carry declarative data. Anything that needs code (an output
//! transform, a manifest transform, extra engine plugins or a post-build
//! step) is supplied through [`TargetHooks`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use qoi_config::TargetConfig;
use serde_json::Value;

use crate::output::OutputDescriptor;
use crate::{Result, SharedPluginable};

/// Every method has a pass-through default, so implementors override only
/// what they need.
#[async_trait]
pub trait TargetHooks: Send + Sync {
    /// Extra engine plugins, placed first in the chain.
    fn plugins(&self) -> Vec<SharedPluginable> {
        Vec::new()
    }

    /// Reshape a computed output descriptor.
    fn output(&self, descriptor: OutputDescriptor) -> OutputDescriptor {
        descriptor
    }

    /// Reshape the synthesized `package.json`.
    fn package_json(&self, manifest: Value) -> Result<Value> {
        Ok(manifest)
    }

    /// Runs after every build task of the target has settled.
    async fn build_end(&self) -> Result<()> {
        Ok(())
    }
}

/// A target config together with its optional hooks.
#[derive(Clone)]
pub struct Target {
    pub config: TargetConfig,
    pub hooks: Option<Arc<dyn TargetHooks>>,
}

impl Target {
    pub fn new(config: TargetConfig) -> Self {
        Self {
            config,
            hooks: None,
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn TargetHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn label(&self) -> &str {
        self.config.label()
    }
}

impl From<TargetConfig> for Target {
    fn from(config: TargetConfig) -> Self {
        Self::new(config)
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("config", &self.config)
            .field("hooks", &self.hooks.is_some())
            .finish()
    }
}
