//! CLI-level build options.
//!
//! One `BuildOptions` value drives a whole run. It is serializable so the CLI
//! can layer defaults, `QOI_*` environment variables and flags with figment.

use qoi_config::{DeclarationMode, MinifyMode, ResolveMode};
use serde::{Deserialize, Serialize};

use crate::externals::split_csv;
use crate::output::ModuleFormat;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildOptions {
    /// Source directory searched for a conventional entry file.
    pub dir: String,

    /// Comma-joined target names; empty selects every target.
    pub name: Option<String>,

    /// Explicit config path or module reference.
    pub config: Option<String>,

    #[serde(alias = "out_dir")]
    pub out_dir: String,

    /// Module-only output: forces `es` and the `.mjs` extension.
    pub module: bool,

    /// Comma-joined list of formats.
    pub format: String,

    /// Comma-joined extra externals.
    pub external: Option<String>,

    pub resolve: Option<ResolveMode>,

    #[serde(alias = "clean_out_dir")]
    pub clean_out_dir: bool,

    pub minify: MinifyMode,

    pub sourcemap: bool,

    /// Write artifacts to disk; off keeps them in memory.
    pub write: bool,

    pub dts: DeclarationMode,

    /// Env file path or inline `KEY=VALUE` pairs.
    pub env: Option<String>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            dir: "src".to_string(),
            name: None,
            config: None,
            out_dir: "dist".to_string(),
            module: false,
            format: "es".to_string(),
            external: None,
            resolve: None,
            clean_out_dir: false,
            minify: MinifyMode::Off,
            sourcemap: false,
            write: true,
            dts: DeclarationMode::Off,
            env: None,
        }
    }
}

impl BuildOptions {
    /// Selected target names.
    pub fn names(&self) -> Vec<String> {
        self.name
            .as_deref()
            .map(|names| split_csv(names).map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Requested output formats in order, with the raw token kept for
    /// directory routing.
    pub fn formats(&self) -> Result<Vec<(String, ModuleFormat)>> {
        let tokens: Vec<&str> = split_csv(&self.format).collect();
        if tokens.is_empty() {
            return Err(Error::InvalidOutput("no output format requested".to_string()));
        }
        tokens
            .into_iter()
            .map(|token| Ok((token.to_string(), token.parse::<ModuleFormat>()?)))
            .collect()
    }

    /// Extra externals from the CLI.
    pub fn externals(&self) -> Vec<String> {
        self.external
            .as_deref()
            .map(|list| split_csv(list).map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Whether CommonJS output is requested alongside ES output.
    pub fn legacy(&self) -> bool {
        split_csv(&self.format).any(|token| matches!(token, "cjs" | "commonjs"))
    }
}
