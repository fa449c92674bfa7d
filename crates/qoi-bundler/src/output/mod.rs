//! Output descriptors and artifact writing.

pub mod writer;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use qoi_config::OutputOverrides;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default pattern for split chunks.
pub const CHUNK_FILE_NAMES: &str = "[name].[hash].js";

/// Module format of one code bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleFormat {
    Es,
    Cjs,
    Iife,
    Umd,
}

impl FromStr for ModuleFormat {
    type Err = Error;

    fn from_str(token: &str) -> Result<Self> {
        match token.trim() {
            "es" | "esm" | "module" => Ok(ModuleFormat::Es),
            "cjs" | "commonjs" => Ok(ModuleFormat::Cjs),
            "iife" => Ok(ModuleFormat::Iife),
            "umd" => Ok(ModuleFormat::Umd),
            other => Err(Error::InvalidOutput(format!(
                "unknown format '{other}', expected es, cjs, iife or umd"
            ))),
        }
    }
}

impl fmt::Display for ModuleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ModuleFormat::Es => "es",
            ModuleFormat::Cjs => "cjs",
            ModuleFormat::Iife => "iife",
            ModuleFormat::Umd => "umd",
        })
    }
}

/// Where and how one code bundle is emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDescriptor {
    pub dir: PathBuf,
    pub format: ModuleFormat,
    pub entry_file_names: String,
    pub chunk_file_names: String,
    pub sourcemap: bool,
}

impl OutputDescriptor {
    /// Default descriptor for one format token.
    ///
    /// CommonJS output lands in `out_dir/cjs`. Module-only output forces the
    /// ES format and the `.mjs` extension.
    pub fn for_format(
        out_dir: &Path,
        token: &str,
        format: ModuleFormat,
        short_name: &str,
        module_only: bool,
        sourcemap: bool,
    ) -> Self {
        let extension = if module_only { "mjs" } else { "js" };
        let dir = if token.contains("cjs") || format == ModuleFormat::Cjs {
            out_dir.join("cjs")
        } else {
            out_dir.to_path_buf()
        };

        Self {
            dir,
            format: if module_only { ModuleFormat::Es } else { format },
            entry_file_names: format!("{short_name}.{extension}"),
            chunk_file_names: CHUNK_FILE_NAMES.to_string(),
            sourcemap,
        }
    }

    /// Apply the declarative `output` overlay. Relative directories resolve
    /// against `root`.
    pub fn apply_overrides(mut self, overrides: &OutputOverrides, root: &Path) -> Result<Self> {
        if let Some(dir) = &overrides.dir {
            self.dir = if dir.trim().is_empty() {
                PathBuf::new()
            } else {
                root.join(dir)
            };
        }
        if let Some(format) = &overrides.format {
            self.format = format.parse()?;
        }
        if let Some(entry) = &overrides.entry_file_names {
            self.entry_file_names = entry.clone();
        }
        if let Some(chunk) = &overrides.chunk_file_names {
            self.chunk_file_names = chunk.clone();
        }
        if let Some(sourcemap) = overrides.sourcemap {
            self.sourcemap = sourcemap;
        }
        Ok(self)
    }

    /// Every descriptor handed to the engine must name a directory.
    pub fn validate(self) -> Result<Self> {
        if self.dir.as_os_str().is_empty() {
            return Err(Error::InvalidOutput(
                "output descriptor has an empty 'dir'".to_string(),
            ));
        }
        if self.entry_file_names.trim().is_empty() {
            return Err(Error::InvalidOutput(
                "output descriptor has an empty 'entryFileNames'".to_string(),
            ));
        }
        Ok(self)
    }

    pub fn entry_path(&self) -> PathBuf {
        self.dir.join(&self.entry_file_names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_tokens() {
        assert_eq!("esm".parse::<ModuleFormat>().unwrap(), ModuleFormat::Es);
        assert_eq!("module".parse::<ModuleFormat>().unwrap(), ModuleFormat::Es);
        assert_eq!("commonjs".parse::<ModuleFormat>().unwrap(), ModuleFormat::Cjs);
        assert!(matches!(
            "system".parse::<ModuleFormat>(),
            Err(Error::InvalidOutput(_))
        ));
    }

    fn descriptor(
        token: &str,
        format: ModuleFormat,
        module_only: bool,
        sourcemap: bool,
    ) -> OutputDescriptor {
        let dir = Path::new("/p/dist");
        OutputDescriptor::for_format(dir, token, format, "y", module_only, sourcemap)
    }

    #[test]
    fn cjs_routes_to_subdirectory() {
        let d = descriptor("cjs", ModuleFormat::Cjs, false, false);
        assert_eq!(d.dir, Path::new("/p/dist/cjs"));
        assert_eq!(d.entry_file_names, "y.js");
        assert_eq!(d.chunk_file_names, CHUNK_FILE_NAMES);
    }

    #[test]
    fn module_only_forces_es_and_mjs() {
        let d = descriptor("iife", ModuleFormat::Iife, true, true);
        assert_eq!(d.format, ModuleFormat::Es);
        assert_eq!(d.entry_file_names, "y.mjs");
        assert!(d.sourcemap);
    }

    #[test]
    fn overrides_apply_and_empty_dir_is_rejected() {
        let base = descriptor("es", ModuleFormat::Es, false, false);
        let shaped = base
            .clone()
            .apply_overrides(
                &OutputOverrides {
                    dir: Some("lib".into()),
                    entry_file_names: Some("[name].js".into()),
                    ..Default::default()
                },
                Path::new("/p"),
            )
            .unwrap()
            .validate()
            .unwrap();
        assert_eq!(shaped.dir, Path::new("/p/lib"));
        assert_eq!(shaped.entry_file_names, "[name].js");

        let emptied = base
            .apply_overrides(
                &OutputOverrides {
                    dir: Some(String::new()),
                    ..Default::default()
                },
                Path::new("/p"),
            )
            .unwrap();
        assert!(matches!(emptied.validate(), Err(Error::InvalidOutput(_))));
    }
}
