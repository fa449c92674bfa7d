//! Shared test utilities for qoi-bundler tests
//!
//! [`FakeEngine`] stands in for Rolldown: it records every call and emits one
//! small artifact per request, so whole orchestrator runs stay fast and
//! deterministic.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use qoi_bundler::{
    Artifact, BundleEngine, BundleInput, DeclarationPlan, Error, OutputDescriptor, Result,
};
use serde_json::Value;
use tempfile::TempDir;

/// One recorded engine call.
#[derive(Debug, Clone)]
pub enum Call {
    Build {
        target: String,
        entries: Vec<String>,
        external: Vec<String>,
        plugins: Vec<&'static str>,
        dir: PathBuf,
        entry_file_names: String,
        env: Vec<(String, String)>,
        defines: Vec<(String, String)>,
    },
    Declarations {
        target: String,
        file: PathBuf,
        respect_external: bool,
    },
}

#[derive(Default)]
pub struct FakeEngine {
    calls: Mutex<Vec<Call>>,
    fail_code: Option<String>,
    fail_declarations: Option<String>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every code build with `message`.
    pub fn failing_code(mut self, message: &str) -> Self {
        self.fail_code = Some(message.to_string());
        self
    }

    /// Fail every declaration build with `message`.
    pub fn failing_declarations(mut self, message: &str) -> Self {
        self.fail_declarations = Some(message.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn builds(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Build { .. }))
            .collect()
    }

    pub fn declaration_builds(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Declarations { .. }))
            .collect()
    }
}

#[async_trait]
impl BundleEngine for FakeEngine {
    async fn build(&self, input: &BundleInput, output: &OutputDescriptor) -> Result<Vec<Artifact>> {
        let defines: Vec<(String, String)> = input.defines().into_iter().collect();
        self.calls.lock().push(Call::Build {
            target: input.target.clone(),
            entries: input.entries.iter().map(|e| e.import.clone()).collect(),
            external: input.external.clone(),
            plugins: input.plugins.iter().map(|p| p.name()).collect(),
            dir: output.dir.clone(),
            entry_file_names: output.entry_file_names.clone(),
            env: input
                .env
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            defines: defines.clone(),
        });
        if let Some(message) = &self.fail_code {
            return Err(Error::Engine(message.clone()));
        }
        // Defines are baked into the chunk the way a real engine would.
        let mut code = format!("// {} ({})\n", input.target, output.format);
        for (key, value) in &defines {
            code.push_str(&format!("const {} = {};\n", key.replace('.', "_"), value));
        }
        Ok(vec![Artifact::chunk(output.entry_file_names.clone(), code)])
    }

    async fn declaration_build(&self, plan: &DeclarationPlan) -> Result<Vec<Artifact>> {
        self.calls.lock().push(Call::Declarations {
            target: plan.target.clone(),
            file: plan.file.clone(),
            respect_external: plan.respect_external,
        });
        if let Some(message) = &self.fail_declarations {
            return Err(Error::Declaration(message.clone()));
        }
        let name = plan
            .file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(vec![Artifact::declaration(name, "export {};\n")])
    }
}

/// A throwaway project directory.
pub struct Project {
    pub dir: TempDir,
}

impl Project {
    /// A project with `package.json` for `name` and a `src/index.ts` entry.
    pub fn new(name: &str) -> Self {
        let project = Self {
            dir: TempDir::new().unwrap(),
        };
        project.write(
            "package.json",
            &serde_json::json!({
                "name": name,
                "version": "1.0.0",
                "dependencies": { "a": "^1.0.0" },
                "devDependencies": { "typescript": "^5.0.0" }
            })
            .to_string(),
        );
        project.write("src/index.ts", "export const answer = 42;\n");
        project
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn write(&self, relative: &str, content: &str) {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    pub fn remove(&self, relative: &str) {
        fs::remove_file(self.path(relative)).unwrap();
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.path(relative).exists()
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path(relative)).unwrap()
    }

    pub fn read_json(&self, relative: &str) -> Value {
        serde_json::from_str(&self.read(relative)).unwrap()
    }

    /// Every file under `relative` with its contents, keyed by path.
    pub fn snapshot(&self, relative: &str) -> BTreeMap<PathBuf, Vec<u8>> {
        let base = self.path(relative);
        walkdir::WalkDir::new(&base)
            .into_iter()
            .map(std::result::Result::unwrap)
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| {
                let path = entry.path().strip_prefix(&base).unwrap().to_path_buf();
                (path, fs::read(entry.path()).unwrap())
            })
            .collect()
    }
}
