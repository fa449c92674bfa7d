//! The bundling engine boundary.
//!
//! Module resolution, transpilation and chunk generation live behind
//! [`BundleEngine`]. The orchestrator only ever talks to this trait, which is
//! what lets tests drive whole runs with an in-memory engine.

use std::borrow::Cow;
use std::path::PathBuf;

use async_trait::async_trait;
use indexmap::IndexMap;
use qoi_config::{EnvOverlay, TransformOptions};
use serde_json::Value;
use tracing::warn;

use crate::Result;
use crate::output::OutputDescriptor;
use crate::plan::PluginStep;

/// One entry point handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryItem {
    pub name: Option<String>,
    /// Path relative to the engine's `cwd`.
    pub import: String,
}

/// Everything the engine needs for a code build, minus the output shape.
#[derive(Debug, Clone)]
pub struct BundleInput {
    /// Target label, for logs and errors.
    pub target: String,
    pub cwd: PathBuf,
    pub entries: Vec<EntryItem>,
    pub external: Vec<String>,
    /// Ordered plugin chain.
    pub plugins: Vec<PluginStep>,
    pub transform: TransformOptions,
    /// Engine-level code minification.
    pub minify: bool,
    /// Build-time environment of the target. Values only reach the bundle
    /// through [`BundleInput::defines`].
    pub env: EnvOverlay,
}

impl BundleInput {
    /// Compile-time replacements for the engine: every `transform.define`
    /// entry plus `process.env.KEY` for each key listed in
    /// `transform.defineEnv`. An explicit `define` of the same expression
    /// wins.
    pub fn defines(&self) -> IndexMap<String, String> {
        let mut defines = self.transform.define.clone();
        for key in &self.transform.define_env {
            let Some(value) = self.env.get(key) else {
                warn!(target = %self.target, key = %key, "defineEnv key is not set");
                continue;
            };
            defines
                .entry(format!("process.env.{key}"))
                .or_insert_with(|| Value::String(value.to_string()).to_string());
        }
        defines
    }
}

/// Inputs of a declaration build.
#[derive(Debug, Clone)]
pub struct DeclarationPlan {
    pub target: String,
    pub cwd: PathBuf,
    pub entries: Vec<EntryItem>,
    pub external: Vec<String>,
    /// Keep declarations of external modules out of the bundle. Engines
    /// that never inline package types may ignore it.
    pub respect_external: bool,
    /// Absolute path of the declaration file. Artifact names are relative to
    /// its parent directory.
    pub file: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Chunk,
    Asset,
    Declaration,
}

/// One emitted file, named relative to its output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub contents: Vec<u8>,
    pub kind: ArtifactKind,
}

impl Artifact {
    pub fn new(file_name: impl Into<String>, contents: Vec<u8>, kind: ArtifactKind) -> Self {
        Self {
            file_name: file_name.into(),
            contents,
            kind,
        }
    }

    pub fn chunk(file_name: impl Into<String>, code: impl Into<String>) -> Self {
        Self::new(file_name, code.into().into_bytes(), ArtifactKind::Chunk)
    }

    pub fn declaration(file_name: impl Into<String>, code: impl Into<String>) -> Self {
        Self::new(file_name, code.into().into_bytes(), ArtifactKind::Declaration)
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.contents)
    }
}

#[async_trait]
pub trait BundleEngine: Send + Sync {
    /// Bundle `input` into the shape described by `output`.
    async fn build(&self, input: &BundleInput, output: &OutputDescriptor) -> Result<Vec<Artifact>>;

    /// Produce one ES-module declaration bundle, plus companion declaration
    /// files for the relative modules it references.
    async fn declaration_build(&self, plan: &DeclarationPlan) -> Result<Vec<Artifact>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(transform: TransformOptions, env: &[(&str, &str)]) -> BundleInput {
        let mut overlay = EnvOverlay::new();
        for (key, value) in env {
            overlay.insert(*key, *value);
        }
        BundleInput {
            target: "default".into(),
            cwd: PathBuf::from("/project"),
            entries: Vec::new(),
            external: Vec::new(),
            plugins: Vec::new(),
            transform,
            minify: false,
            env: overlay,
        }
    }

    #[test]
    fn environment_stays_out_of_defines_by_default() {
        let input = input(
            TransformOptions::default(),
            &[("DB_PASSWORD", "hunter2"), ("API", "https://x.dev")],
        );
        assert!(input.defines().is_empty());
    }

    #[test]
    fn listed_env_keys_become_string_literals() {
        let transform = TransformOptions {
            define: IndexMap::from([
                ("__DEV__".to_string(), "false".to_string()),
                ("process.env.MODE".to_string(), "\"fixed\"".to_string()),
            ]),
            define_env: vec!["API".into(), "MODE".into(), "MISSING".into()],
            ..Default::default()
        };
        let defines = input(
            transform,
            &[("API", "say \"hi\""), ("MODE", "dev"), ("SECRET", "x")],
        )
        .defines();

        assert_eq!(defines.get("__DEV__").map(String::as_str), Some("false"));
        assert_eq!(
            defines.get("process.env.API").map(String::as_str),
            Some(r#""say \"hi\"""#)
        );
        assert_eq!(
            defines.get("process.env.MODE").map(String::as_str),
            Some("\"fixed\"")
        );
        assert!(!defines.contains_key("process.env.MISSING"));
        assert!(!defines.contains_key("process.env.SECRET"));
    }
}
