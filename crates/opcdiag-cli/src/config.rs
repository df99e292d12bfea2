//! Configuration Settings
//!
//! Settings are read from an optional TOML file, either the one named with
//! `--config` or `opcdiag.toml` in the working directory:
//!
//! ```toml
//! [diff]
//! context_lines = 5
//!
//! [extract]
//! prettify = false
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use opcdiag_core::DEFAULT_CONTEXT_LINES;

/// Settings file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "opcdiag.toml";

/// Top-level settings structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Diff output settings
    pub diff: DiffSettings,
    /// Extract command settings
    pub extract: ExtractSettings,
}

impl Settings {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Load settings from `path`, or from `opcdiag.toml` when no path is given
    ///
    /// An explicitly named file must exist. The implicit file is optional and
    /// defaults apply when it is absent. A file that does not parse is always
    /// an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let implicit = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !implicit.is_file() {
                    debug!("no {} found, using default settings", DEFAULT_CONFIG_FILE);
                    return Ok(Self::default());
                }
                implicit
            }
        };

        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let settings = Self::from_toml_str(&text)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        debug!("loaded settings from {}: {:?}", path.display(), settings);
        Ok(settings)
    }
}

/// Diff output configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffSettings {
    /// Unchanged lines shown around each change
    pub context_lines: usize,
}

impl Default for DiffSettings {
    fn default() -> Self {
        Self {
            context_lines: DEFAULT_CONTEXT_LINES,
        }
    }
}

/// Extract command configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractSettings {
    /// Pretty-print XML items before writing them out
    pub prettify: bool,
}

impl Default for ExtractSettings {
    fn default() -> Self {
        Self { prettify: true }
    }
}
