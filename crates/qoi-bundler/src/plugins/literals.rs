//! Tagged template literal minification.
//!
//! Quasis of templates tagged `html`, `svg` or `css` have their whitespace
//! collapsed. Interpolations are never touched, and a quasi containing an
//! escape sequence is left as written.

use std::borrow::Cow;

use oxc_allocator::Allocator;
use oxc_ast::ast::{Expression, TaggedTemplateExpression};
use oxc_ast_visit::{Visit, walk};
use oxc_parser::{Parser, ParserReturn};
use oxc_span::SourceType as OxcSourceType;
use rolldown_plugin::{
    HookTransformArgs, HookTransformOutput, HookTransformReturn, HookUsage, Plugin,
    SharedTransformPluginContext,
};
use tracing::trace;

use super::is_dependency;
use super::registry::{PluginPhase, QoiPlugin};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LiteralKind {
    Markup,
    Style,
}

impl LiteralKind {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "html" | "svg" => Some(Self::Markup),
            "css" => Some(Self::Style),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralMinifyPlugin;

/// Minify the tagged literals of one module, or `None` when nothing changed.
///
/// Sources that fail to parse are returned untouched; the engine reports the
/// syntax error itself.
pub fn minify_literals(code: &str, path: &str) -> Option<String> {
    let source_type = OxcSourceType::from_path(path).unwrap_or_else(|_| OxcSourceType::mjs());
    let allocator = Allocator::default();
    let ParserReturn {
        program, errors, ..
    } = Parser::new(&allocator, code, source_type).parse();
    if !errors.is_empty() {
        trace!(path, "skipping literal minification of unparsable module");
        return None;
    }

    let mut collector = LiteralCollector {
        source: code,
        edits: Vec::new(),
    };
    collector.visit_program(&program);
    if collector.edits.is_empty() {
        return None;
    }

    let mut edits = collector.edits;
    edits.sort_by(|a, b| b.0.cmp(&a.0));
    let mut out = code.to_string();
    for (start, end, text) in edits {
        out.replace_range(start..end, &text);
    }
    Some(out)
}

struct LiteralCollector<'s> {
    source: &'s str,
    edits: Vec<(usize, usize, String)>,
}

impl<'s> LiteralCollector<'s> {
    fn collect(&mut self, kind: LiteralKind, expr: &TaggedTemplateExpression<'_>) {
        for quasi in &expr.quasi.quasis {
            let (start, end) = (quasi.span.start as usize, quasi.span.end as usize);
            let raw = quasi.value.raw.as_str();
            if raw.contains('\\') || self.source.get(start..end) != Some(raw) {
                continue;
            }
            let minified = match kind {
                LiteralKind::Markup => collapse_markup(raw),
                LiteralKind::Style => collapse_style(raw),
            };
            if minified != raw {
                self.edits.push((start, end, minified));
            }
        }
    }
}

impl<'a, 's> Visit<'a> for LiteralCollector<'s> {
    fn visit_tagged_template_expression(&mut self, it: &TaggedTemplateExpression<'a>) {
        if let Expression::Identifier(tag) = &it.tag {
            if let Some(kind) = LiteralKind::from_tag(tag.name.as_str()) {
                self.collect(kind, it);
            }
        }
        walk::walk_tagged_template_expression(self, it);
    }
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Whitespace runs become one space. A space between two tags is kept, since
/// it renders between inline elements.
pub fn collapse_markup(text: &str) -> String {
    collapse_whitespace(text)
}

/// Whitespace runs become one space; spaces around block and declaration
/// punctuation go away.
pub fn collapse_style(text: &str) -> String {
    let mut out = collapse_whitespace(text);
    for punct in ["{", "}", ";", ","] {
        out = out
            .replace(&format!(" {punct}"), punct)
            .replace(&format!("{punct} "), punct);
    }
    out.replace(": ", ":")
}

impl Plugin for LiteralMinifyPlugin {
    fn name(&self) -> Cow<'static, str> {
        "qoi:minify-literals".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::Transform
    }

    fn transform(
        &self,
        _ctx: SharedTransformPluginContext,
        args: &HookTransformArgs<'_>,
    ) -> impl std::future::Future<Output = HookTransformReturn> + Send {
        let code = if is_dependency(args.id) {
            None
        } else {
            minify_literals(args.code, args.id)
        };
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

impl QoiPlugin for LiteralMinifyPlugin {
    fn phase(&self) -> PluginPhase {
        PluginPhase::Literals
    }
}
