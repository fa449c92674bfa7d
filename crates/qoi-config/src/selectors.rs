//! Tagged option selectors.
//!
//! `resolve`, `dts` and `minify` accept a boolean, a string or (for `resolve`)
//! a list wherever they appear. They are decided once here so the rest of the
//! pipeline only ever matches on an enum.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Wire shape shared by every selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawSelector {
    Flag(bool),
    List(Vec<String>),
    Text(String),
}

fn split_list(text: &str) -> IndexSet<String> {
    text.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Which otherwise-external module identifiers get bundled.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawSelector", into = "RawSelector")]
pub enum ResolveMode {
    /// Keep the full external list.
    #[default]
    None,
    /// Bundle everything; the external list becomes empty.
    All,
    /// Bundle exactly these identifiers.
    Only(IndexSet<String>),
}

impl ResolveMode {
    pub fn only<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ResolveMode::Only(ids.into_iter().map(Into::into).collect())
    }

    /// Whether the selector was set to anything other than "keep externals".
    pub fn is_set(&self) -> bool {
        !matches!(self, ResolveMode::None)
    }

    /// Boolean used by the declaration build to decide whether external
    /// boundaries are respected broadly.
    pub fn collapse(&self) -> bool {
        match self {
            ResolveMode::None => false,
            ResolveMode::All => true,
            ResolveMode::Only(ids) => !ids.is_empty(),
        }
    }
}

impl TryFrom<RawSelector> for ResolveMode {
    type Error = ConfigError;

    fn try_from(raw: RawSelector) -> Result<Self, Self::Error> {
        Ok(match raw {
            RawSelector::Flag(true) => ResolveMode::All,
            RawSelector::Flag(false) => ResolveMode::None,
            RawSelector::List(ids) => ResolveMode::only(
                ids.iter()
                    .map(|id| id.trim())
                    .filter(|id| !id.is_empty())
                    .map(str::to_string),
            ),
            RawSelector::Text(text) => text.parse()?,
        })
    }
}

impl From<ResolveMode> for RawSelector {
    fn from(mode: ResolveMode) -> Self {
        match mode {
            ResolveMode::None => RawSelector::Flag(false),
            ResolveMode::All => RawSelector::Flag(true),
            ResolveMode::Only(ids) => RawSelector::List(ids.into_iter().collect()),
        }
    }
}

impl FromStr for ResolveMode {
    type Err = ConfigError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Ok(match text.trim() {
            "true" => ResolveMode::All,
            "" | "false" => ResolveMode::None,
            other => ResolveMode::Only(split_list(other)),
        })
    }
}

/// Whether and how type declarations are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawSelector", into = "RawSelector")]
pub enum DeclarationMode {
    #[default]
    Off,
    On,
    /// Declarations only; the code build is skipped.
    DeclarationsOnly,
}

impl DeclarationMode {
    pub fn is_requested(self) -> bool {
        !matches!(self, DeclarationMode::Off)
    }
}

impl TryFrom<RawSelector> for DeclarationMode {
    type Error = ConfigError;

    fn try_from(raw: RawSelector) -> Result<Self, Self::Error> {
        match raw {
            RawSelector::Flag(true) => Ok(DeclarationMode::On),
            RawSelector::Flag(false) => Ok(DeclarationMode::Off),
            RawSelector::Text(text) => text.parse(),
            RawSelector::List(_) => Err(ConfigError::invalid_value(
                "dts",
                "expected a boolean or \"only\"",
            )),
        }
    }
}

impl From<DeclarationMode> for RawSelector {
    fn from(mode: DeclarationMode) -> Self {
        match mode {
            DeclarationMode::Off => RawSelector::Flag(false),
            DeclarationMode::On => RawSelector::Flag(true),
            DeclarationMode::DeclarationsOnly => RawSelector::Text("only".to_string()),
        }
    }
}

impl FromStr for DeclarationMode {
    type Err = ConfigError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text.trim() {
            "true" => Ok(DeclarationMode::On),
            "" | "false" => Ok(DeclarationMode::Off),
            "only" => Ok(DeclarationMode::DeclarationsOnly),
            other => Err(ConfigError::invalid_value(
                "dts",
                format!("expected true, false or \"only\", got \"{other}\""),
            )),
        }
    }
}

/// Minification passes applied to the code build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawSelector", into = "RawSelector")]
pub enum MinifyMode {
    #[default]
    Off,
    /// Engine minification plus license-comment stripping.
    Code,
    /// Template-literal minification plus license-comment stripping.
    /// Code minification is left to the transform options.
    CodeAndLiterals,
}

impl MinifyMode {
    /// License comments are stripped under either minify mode.
    pub fn strips_license(self) -> bool {
        !matches!(self, MinifyMode::Off)
    }

    pub fn minifies_literals(self) -> bool {
        matches!(self, MinifyMode::CodeAndLiterals)
    }
}

impl TryFrom<RawSelector> for MinifyMode {
    type Error = ConfigError;

    fn try_from(raw: RawSelector) -> Result<Self, Self::Error> {
        match raw {
            RawSelector::Flag(true) => Ok(MinifyMode::Code),
            RawSelector::Flag(false) => Ok(MinifyMode::Off),
            RawSelector::Text(text) => text.parse(),
            RawSelector::List(_) => Err(ConfigError::invalid_value(
                "minify",
                "expected a boolean or \"literals\"",
            )),
        }
    }
}

impl From<MinifyMode> for RawSelector {
    fn from(mode: MinifyMode) -> Self {
        match mode {
            MinifyMode::Off => RawSelector::Flag(false),
            MinifyMode::Code => RawSelector::Flag(true),
            MinifyMode::CodeAndLiterals => RawSelector::Text("literals".to_string()),
        }
    }
}

impl FromStr for MinifyMode {
    type Err = ConfigError;

    /// Any string mentioning `literals` enables the literal pass. Other
    /// strings besides `true` leave minification off.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        Ok(if text.contains("literals") {
            MinifyMode::CodeAndLiterals
        } else if text == "true" {
            MinifyMode::Code
        } else {
            MinifyMode::Off
        })
    }
}

impl fmt::Display for ResolveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveMode::None => f.write_str("false"),
            ResolveMode::All => f.write_str("true"),
            ResolveMode::Only(ids) => {
                let joined: Vec<&str> = ids.iter().map(String::as_str).collect();
                f.write_str(&joined.join(","))
            }
        }
    }
}
