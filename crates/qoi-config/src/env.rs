//! Environment injection.
//!
//! An `--env` spec is either a dotenv file or inline `KEY=VALUE` pairs. The
//! result is an explicit overlay handed to the build and to spawned scripts.
//! Only spawned scripts fall back to the project's `.env`. The process
//! environment itself is never mutated.

use std::fs;

use indexmap::IndexMap;
use tracing::debug;

use crate::context::ProjectContext;
use crate::error::{ConfigError, Result};

/// Ordered set of environment variables injected for a run or a target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverlay {
    vars: IndexMap<String, String>,
}

impl EnvOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// A copy of this overlay with `vars` layered on top.
    pub fn layered<'a, I>(&self, vars: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut layered = self.clone();
        for (key, value) in vars {
            layered.insert(key.clone(), value.clone());
        }
        layered
    }
}

impl FromIterator<(String, String)> for EnvOverlay {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            vars: iter.into_iter().collect(),
        }
    }
}

/// Build the overlay described by an explicit `--env` spec.
///
/// An existing file (relative to the project root) is parsed as dotenv.
/// Any other spec is read as comma-separated `KEY=VALUE` pairs. Without a
/// spec the overlay is empty: builds never pick up the project's `.env` on
/// their own.
pub fn load_env(spec: Option<&str>, ctx: &ProjectContext) -> Result<EnvOverlay> {
    match spec.map(str::trim).filter(|s| !s.is_empty()) {
        Some(spec) => {
            let path = ctx.resolve(spec);
            if path.is_file() {
                debug!(path = %path.display(), "loading env file");
                parse_dotenv(&fs::read_to_string(&path)?)
            } else {
                parse_inline(spec)
            }
        }
        None => Ok(EnvOverlay::new()),
    }
}

/// Overlay for a spawned script: the explicit spec, else `root/.env` when
/// present.
pub fn load_script_env(spec: Option<&str>, ctx: &ProjectContext) -> Result<EnvOverlay> {
    if spec.is_some_and(|s| !s.trim().is_empty()) {
        return load_env(spec, ctx);
    }
    let path = ctx.root().join(".env");
    if path.is_file() {
        debug!(path = %path.display(), "loading project .env");
        parse_dotenv(&fs::read_to_string(&path)?)
    } else {
        Ok(EnvOverlay::new())
    }
}

/// Parse `A=1,B=2` (newlines also separate entries).
pub fn parse_inline(spec: &str) -> Result<EnvOverlay> {
    spec.split([',', '\n'])
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (key, value) = entry
                .split_once('=')
                .ok_or_else(|| ConfigError::InvalidEnvEntry(entry.to_string()))?;
            let key = key.trim();
            if !is_valid_key(key) {
                return Err(ConfigError::InvalidEnvEntry(entry.to_string()));
            }
            Ok((key.to_string(), unquote(value.trim())))
        })
        .collect()
}

/// Parse dotenv file content.
///
/// Supports comments, blank lines, an optional `export` prefix and single or
/// double quoted values. Lines without `=` are skipped.
pub fn parse_dotenv(content: &str) -> Result<EnvOverlay> {
    let mut overlay = EnvOverlay::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            debug!(line = index + 1, "skipping env line without '='");
            continue;
        };
        let key = key.trim();
        if !is_valid_key(key) {
            return Err(ConfigError::InvalidEnvEntry(line.to_string()));
        }
        overlay.insert(key, unquote(value.trim()));
    }
    Ok(overlay)
}

fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

fn unquote(value: &str) -> String {
    if value.len() >= 2 {
        if let Some(inner) = value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
            return inner.replace("\\n", "\n");
        }
        if let Some(inner) = value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')) {
            return inner.to_string();
        }
    }
    // Unquoted values end at an inline comment.
    match value.find(" #") {
        Some(pos) => value[..pos].trim_end().to_string(),
        None => value.to_string(),
    }
}
