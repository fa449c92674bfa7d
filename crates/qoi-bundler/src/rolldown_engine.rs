//! The production [`BundleEngine`], backed by Rolldown and OXC.
//!
//! Code builds map a [`BundleInput`] and one [`OutputDescriptor`] onto
//! Rolldown's `BundlerOptions`. Declaration builds run OXC isolated
//! declarations over the entry and every relative TypeScript module it
//! reaches, mirroring the source layout next to the main declaration file.
//! Imports of packages are kept as imports in every resolve mode.

use std::collections::VecDeque;
use std::hash::BuildHasherDefault;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use async_trait::async_trait;
use indexmap::IndexMap;
use oxc_allocator::Allocator;
use oxc_ast::ast::Statement;
use oxc_codegen::Codegen;
use oxc_isolated_declarations::{IsolatedDeclarations, IsolatedDeclarationsOptions};
use oxc_parser::Parser;
use oxc_span::SourceType as OxcSourceType;
use path_clean::PathClean;
use regex::Regex;
use rolldown::{
    BundlerBuilder, BundlerOptions, InputItem, IsExternal, OutputFormat, Platform,
    RawMinifyOptions, ResolveOptions, SourceMapType,
};
use rolldown_common::{
    BundlerTransformOptions, ChunkFilenamesOutputOption, DecoratorOptions, Output,
};
use rustc_hash::{FxHashSet, FxHasher};
use tracing::{debug, warn};

use crate::engine::{Artifact, ArtifactKind, BundleEngine, BundleInput, DeclarationPlan};
use crate::output::{ModuleFormat, OutputDescriptor};
use crate::plan::PluginStep;
use crate::plugins::{LicenseStripPlugin, LiteralMinifyPlugin, PluginPhase, PluginRegistry};
use crate::{Error, Result, SharedPluginable};

const RESOLVE_EXTENSIONS: &[&str] = &[".js", ".json", ".mjs", ".ts", ".tsx"];
const DECLARATION_SOURCES: &[&str] = &[".ts", ".tsx", ".mts", ".cts"];

static STYLE_IMPORT: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"(?m)^import\s+['"][^'"]+\.(?:css|scss|sass|less)['"];?[ \t]*\r?\n?"#).ok()
});

/// Rolldown-backed engine.
#[derive(Debug, Clone, Default)]
pub struct RolldownEngine {
    platform: Option<Platform>,
}

impl RolldownEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the target platform. Libraries default to Node resolution.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    fn bundler_options(&self, input: &BundleInput, output: &OutputDescriptor) -> BundlerOptions {
        let mut aliases = Vec::new();
        for step in &input.plugins {
            if let PluginStep::PathAliases(entries) = step {
                aliases.extend(entries.iter().map(|(alias, targets)| {
                    (
                        alias.clone(),
                        targets.iter().cloned().map(Some).collect::<Vec<_>>(),
                    )
                }));
            }
        }

        let transform = input.transform.decorators.then(|| BundlerTransformOptions {
            decorator: Some(DecoratorOptions {
                legacy: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        });
        if let Some(target) = &input.transform.target {
            debug!(target = %target, "syntax lowering follows the engine default");
        }
        let defines = input.defines();

        BundlerOptions {
            input: Some(
                input
                    .entries
                    .iter()
                    .map(|entry| InputItem {
                        name: entry.name.clone(),
                        import: input
                            .cwd
                            .join(&entry.import)
                            .clean()
                            .to_string_lossy()
                            .into_owned(),
                    })
                    .collect(),
            ),
            cwd: Some(input.cwd.clone()),
            format: Some(match output.format {
                ModuleFormat::Es => OutputFormat::Esm,
                ModuleFormat::Cjs => OutputFormat::Cjs,
                ModuleFormat::Iife => OutputFormat::Iife,
                ModuleFormat::Umd => OutputFormat::Umd,
            }),
            entry_filenames: Some(ChunkFilenamesOutputOption::String(
                output.entry_file_names.clone(),
            )),
            chunk_filenames: Some(ChunkFilenamesOutputOption::String(
                output.chunk_file_names.clone(),
            )),
            sourcemap: output.sourcemap.then_some(SourceMapType::File),
            external: Some(IsExternal::from(input.external.clone())),
            minify: input.minify.then(|| RawMinifyOptions::from(true)),
            define: (!defines.is_empty()).then(|| {
                defines
                    .into_iter()
                    .collect::<IndexMap<_, _, BuildHasherDefault<FxHasher>>>()
            }),
            platform: Some(self.platform.unwrap_or(Platform::Node)),
            transform,
            resolve: Some(resolve_options(&input.cwd, aliases)),
            ..Default::default()
        }
    }
}

fn resolve_options(cwd: &Path, aliases: Vec<(String, Vec<Option<String>>)>) -> ResolveOptions {
    let mut modules: Vec<String> = cwd
        .ancestors()
        .map(|dir| dir.join("node_modules").to_string_lossy().into_owned())
        .collect();
    modules.push("node_modules".to_string());

    ResolveOptions {
        alias: (!aliases.is_empty()).then_some(aliases),
        main_fields: Some(vec!["module".to_string(), "main".to_string()]),
        condition_names: Some(vec![
            "import".to_string(),
            "module".to_string(),
            "node".to_string(),
            "default".to_string(),
        ]),
        extensions: Some(RESOLVE_EXTENSIONS.iter().map(|ext| ext.to_string()).collect()),
        modules: Some(modules),
        symlinks: Some(true),
        ..Default::default()
    }
}

/// Turn the plugin chain into phase-ordered Rolldown plugins.
///
/// CommonJS interop, node resolution and the TypeScript transform are
/// native to Rolldown. Path aliases travel through `resolve.alias` and
/// defines through Rolldown's `define`, which rewrites expressions on the
/// parsed AST. None of those steps add a plugin of their own.
pub fn plugin_chain(input: &BundleInput) -> Vec<SharedPluginable> {
    let mut registry = PluginRegistry::new();
    for step in &input.plugins {
        match step {
            PluginStep::User(plugin) => registry.add_with_phase(plugin.clone(), PluginPhase::User),
            PluginStep::StripLicense => registry.add(LicenseStripPlugin),
            PluginStep::MinifyLiterals => registry.add(LiteralMinifyPlugin),
            PluginStep::PathAliases(_)
            | PluginStep::CommonJs
            | PluginStep::NodeResolve
            | PluginStep::Transform => {}
        }
    }
    registry.into_rolldown_plugins()
}

fn collect_artifacts(outputs: &[Output]) -> Vec<Artifact> {
    let mut artifacts = Vec::with_capacity(outputs.len());
    let mut names = FxHashSet::default();
    for output in outputs {
        if let Output::Asset(asset) = output {
            names.insert(asset.filename.to_string());
        }
    }

    for output in outputs {
        match output {
            Output::Chunk(chunk) => {
                artifacts.push(Artifact::chunk(chunk.filename.to_string(), chunk.code.clone()));
                if let (Some(map), Some(map_name)) = (&chunk.map, &chunk.sourcemap_filename) {
                    if !names.contains(map_name.as_str()) {
                        artifacts.push(Artifact::new(
                            map_name.clone(),
                            map.to_json_string().into_bytes(),
                            ArtifactKind::Asset,
                        ));
                    }
                }
            }
            Output::Asset(asset) => artifacts.push(Artifact::new(
                asset.filename.to_string(),
                asset.source.as_bytes().to_vec(),
                ArtifactKind::Asset,
            )),
        }
    }
    artifacts
}

#[async_trait]
impl BundleEngine for RolldownEngine {
    async fn build(&self, input: &BundleInput, output: &OutputDescriptor) -> Result<Vec<Artifact>> {
        let options = self.bundler_options(input, output);
        let plugins = plugin_chain(input);
        debug!(
            target = %input.target,
            format = %output.format,
            plugins = plugins.len(),
            "starting rolldown"
        );

        let mut bundler = BundlerBuilder::default()
            .with_options(options)
            .with_plugins(plugins)
            .build()
            .map_err(|e| Error::from_rolldown_batch(&e))?;

        let bundle = bundler
            .generate()
            .await
            .map_err(|e| Error::from_rolldown_batch(&e))?;

        for warning in &bundle.warnings {
            warn!(target = %input.target, "{:?}", warning);
        }
        Ok(collect_artifacts(&bundle.assets))
    }

    async fn declaration_build(&self, plan: &DeclarationPlan) -> Result<Vec<Artifact>> {
        let main_name = plan
            .file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                Error::Declaration(format!("invalid declaration file '{}'", plan.file.display()))
            })?;
        // Only relative modules are emitted, so package types are never
        // inlined and `respect_external` leaves the output unchanged.
        debug!(
            target = %plan.target,
            respect_external = plan.respect_external,
            "bare imports stay as imports"
        );

        let mut artifacts = Vec::new();
        for (index, entry) in plan.entries.iter().enumerate() {
            let entry_path = plan.cwd.join(&entry.import).clean();
            let entry_name = if index == 0 {
                main_name.clone()
            } else {
                format!("{}.d.ts", entry.name.as_deref().unwrap_or_else(|| stem(&entry_path)))
            };
            emit_module_graph(&entry_path, &entry_name, &mut artifacts)?;
        }
        Ok(artifacts)
    }
}

fn stem(path: &Path) -> &str {
    path.file_stem().and_then(|s| s.to_str()).unwrap_or("index")
}

/// Declarations for `entry` under `entry_name`, plus one file per reachable
/// relative module, named by its path relative to the entry's directory.
fn emit_module_graph(entry: &Path, entry_name: &str, artifacts: &mut Vec<Artifact>) -> Result<()> {
    let base = entry.parent().unwrap_or(Path::new("")).to_path_buf();
    let mut seen: FxHashSet<PathBuf> = artifacts
        .iter()
        .map(|artifact| PathBuf::from(&artifact.file_name))
        .collect();
    let mut queue = VecDeque::from([(entry.to_path_buf(), entry_name.to_string())]);

    while let Some((path, name)) = queue.pop_front() {
        if !seen.insert(PathBuf::from(&name)) {
            continue;
        }
        let source = std::fs::read_to_string(&path).map_err(|e| {
            Error::Declaration(format!("failed to read '{}': {}", path.display(), e))
        })?;
        let (declarations, imports) = generate_declarations(&source, &path)?;
        artifacts.push(Artifact::declaration(name, declarations));

        let dir = path.parent().unwrap_or(Path::new(""));
        for specifier in imports {
            let Some(resolved) = resolve_relative(dir, &specifier) else {
                continue;
            };
            let Ok(relative) = resolved.strip_prefix(&base) else {
                warn!(
                    module = %resolved.display(),
                    "skipping declarations outside the entry directory"
                );
                continue;
            };
            let mut file = relative.to_path_buf();
            file.set_extension("d.ts");
            queue.push_back((resolved, file.to_string_lossy().replace('\\', "/")));
        }
    }
    Ok(())
}

/// Isolated declarations for one module, with the relative specifiers it
/// imports or re-exports.
pub fn generate_declarations(source: &str, path: &Path) -> Result<(String, Vec<String>)> {
    let is_typescript = DECLARATION_SOURCES
        .iter()
        .any(|ext| path.to_string_lossy().ends_with(ext));
    if !is_typescript {
        return Err(Error::Declaration(format!(
            "'{}' is not a TypeScript module",
            path.display()
        )));
    }

    let allocator = Allocator::default();
    let source_type = OxcSourceType::from_path(path)
        .map_err(|e| Error::Declaration(format!("{}: {:?}", path.display(), e)))?;

    let parsed = Parser::new(&allocator, source, source_type).parse();
    if !parsed.errors.is_empty() {
        let messages: Vec<String> = parsed.errors.iter().map(|e| format!("{e:?}")).collect();
        return Err(Error::Declaration(format!(
            "failed to parse {}: {}",
            path.display(),
            messages.join(", ")
        )));
    }

    let imports = relative_specifiers(&parsed.program.body);

    let dts = IsolatedDeclarations::new(
        &allocator,
        IsolatedDeclarationsOptions {
            strip_internal: true,
        },
    )
    .build(&parsed.program);
    if !dts.errors.is_empty() {
        let messages: Vec<String> = dts.errors.iter().map(|e| format!("{e:?}")).collect();
        return Err(Error::Declaration(format!(
            "{}: {}",
            path.display(),
            messages.join(", ")
        )));
    }

    let mut code = Codegen::new().build(&dts.program).code;
    if let Some(re) = STYLE_IMPORT.as_ref() {
        code = re.replace_all(&code, "").into_owned();
    }
    Ok((code, imports))
}

fn relative_specifiers(body: &[Statement<'_>]) -> Vec<String> {
    body.iter()
        .filter_map(|statement| match statement {
            Statement::ImportDeclaration(decl) => Some(decl.source.value.as_str()),
            Statement::ExportAllDeclaration(decl) => Some(decl.source.value.as_str()),
            Statement::ExportNamedDeclaration(decl) => {
                decl.source.as_ref().map(|source| source.value.as_str())
            }
            _ => None,
        })
        .filter(|specifier| specifier.starts_with('.'))
        .map(str::to_string)
        .collect()
}

/// Resolve a relative specifier to a TypeScript source file.
fn resolve_relative(dir: &Path, specifier: &str) -> Option<PathBuf> {
    let base = dir.join(specifier).clean();
    let raw = base.to_string_lossy().into_owned();
    let stripped = [".js", ".mjs", ".cjs", ".jsx"]
        .iter()
        .find_map(|ext| raw.strip_suffix(ext))
        .unwrap_or(&raw)
        .to_string();

    let mut candidates = Vec::new();
    for stem in [&raw, &stripped] {
        for ext in DECLARATION_SOURCES {
            candidates.push(PathBuf::from(format!("{stem}{ext}")));
        }
    }
    candidates.extend(
        DECLARATION_SOURCES
            .iter()
            .map(|ext| base.join(format!("index{ext}"))),
    );
    candidates.push(base);

    candidates.into_iter().find(|candidate| {
        candidate.is_file()
            && DECLARATION_SOURCES
                .iter()
                .any(|ext| candidate.to_string_lossy().ends_with(ext))
    })
}
