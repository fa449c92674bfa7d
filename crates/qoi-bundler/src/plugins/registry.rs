//! Plugin registry with execution phases.
//!
//! Rolldown runs plugins in the order it receives them. The registry keeps
//! every plugin tagged with a phase and hands them over sorted, so the
//! transform chain stays stable no matter in which order steps were added.

use std::sync::Arc;

use rolldown_plugin::Plugin;

use crate::SharedPluginable;

/// Plugin execution phases, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PluginPhase {
    /// Plugins supplied by target hooks. They see untouched sources.
    User = 0,

    /// Source cleanup ahead of the code transform (license markers).
    Prepare = 20,

    /// Whitespace collapsing inside tagged template literals.
    Literals = 40,
}

/// A built-in plugin that knows its own phase.
pub trait QoiPlugin: Plugin {
    fn phase(&self) -> PluginPhase;
}

/// Plugin registry that maintains plugins in phase order
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<(PluginPhase, SharedPluginable)>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a built-in plugin at its declared phase.
    pub fn add<P: QoiPlugin + 'static>(&mut self, plugin: P) {
        let phase = plugin.phase();
        self.plugins.push((phase, Arc::new(plugin)));
    }

    /// Add a plugin with an explicit phase
    ///
    /// Used for hook-supplied plugins, which are plain Rolldown plugins.
    pub fn add_with_phase(&mut self, plugin: SharedPluginable, phase: PluginPhase) {
        self.plugins.push((phase, plugin));
    }

    /// Convert to Rolldown plugins in phase order.
    ///
    /// The sort is stable, so plugins of one phase keep insertion order.
    pub fn into_rolldown_plugins(mut self) -> Vec<SharedPluginable> {
        self.plugins.sort_by_key(|(phase, _)| *phase);
        self.plugins.into_iter().map(|(_, plugin)| plugin).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::{LicenseStripPlugin, LiteralMinifyPlugin};
    use rolldown_plugin::HookUsage;
    use std::borrow::Cow;

    #[derive(Debug)]
    struct Named(&'static str);

    impl Plugin for Named {
        fn name(&self) -> Cow<'static, str> {
            self.0.into()
        }

        fn register_hook_usage(&self) -> HookUsage {
            HookUsage::empty()
        }
    }

    #[test]
    fn plugins_come_out_in_phase_order() {
        let mut registry = PluginRegistry::new();
        registry.add(LiteralMinifyPlugin);
        registry.add(LicenseStripPlugin);
        registry.add_with_phase(Arc::new(Named("first")), PluginPhase::User);
        registry.add_with_phase(Arc::new(Named("second")), PluginPhase::User);

        let names: Vec<String> = registry
            .into_rolldown_plugins()
            .iter()
            .map(|plugin| plugin.call_name().to_string())
            .collect();
        assert_eq!(
            names,
            ["first", "second", "qoi:license", "qoi:minify-literals"]
        );
    }
}
