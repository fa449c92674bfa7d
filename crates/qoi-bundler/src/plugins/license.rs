//! `@license` marker removal.
//!
//! Minifiers keep comments tagged `@license`. Erasing the tag lets the
//! engine drop those banners along with every other comment.

use std::borrow::Cow;

use rolldown_plugin::{
    HookTransformArgs, HookTransformOutput, HookTransformReturn, HookUsage, Plugin,
    SharedTransformPluginContext,
};

use super::registry::{PluginPhase, QoiPlugin};

const MARKER: &str = "@license";

#[derive(Debug, Clone, Copy, Default)]
pub struct LicenseStripPlugin;

/// Erase every `@license` marker in `code`, or `None` when there is none.
pub fn strip_license(code: &str) -> Option<String> {
    code.contains(MARKER).then(|| code.replace(MARKER, ""))
}

impl Plugin for LicenseStripPlugin {
    fn name(&self) -> Cow<'static, str> {
        "qoi:license".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::Transform
    }

    fn transform(
        &self,
        _ctx: SharedTransformPluginContext,
        args: &HookTransformArgs<'_>,
    ) -> impl std::future::Future<Output = HookTransformReturn> + Send {
        let code = strip_license(args.code);
        async move {
            Ok(code.map(|code| HookTransformOutput {
                code: Some(code),
                map: None,
                side_effects: None,
                module_type: None,
            }))
        }
    }
}

impl QoiPlugin for LicenseStripPlugin {
    fn phase(&self) -> PluginPhase {
        PluginPhase::Prepare
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erases_markers() {
        let code = "/** @license MIT */\nexport const a = 1;";
        assert_eq!(
            strip_license(code).unwrap(),
            "/**  MIT */\nexport const a = 1;"
        );
    }

    #[test]
    fn untouched_sources_are_skipped() {
        assert_eq!(strip_license("export const a = 1;"), None);
    }
}
