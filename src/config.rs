//! TOML configuration for building and querying indexes.
//!
//! Every field has a default, so a missing file or a partial file is valid:
//!
//! ```toml
//! [tokenizer]
//! min_term_length = 3
//! stem = true
//!
//! [query]
//! title_weight = 2.0
//! max_query_length = 256
//!
//! [cache]
//! enabled = true
//! ```

use crate::error::Result;
use crate::search::{QueryOptions, TokenizerSettings};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How pages and queries are split into terms
    pub tokenizer: TokenizerSettings,
    /// Query-time ranking and limits
    pub query: QueryOptions,
    /// Binary build cache
    pub cache: CacheConfig,
}

/// Build cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Cache directory; defaults to the platform cache dir
    pub dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

impl CacheConfig {
    /// Resolved cache directory, if one is configured or the platform provides one.
    pub fn directory(&self) -> Option<PathBuf> {
        self.dir
            .clone()
            .or_else(|| dirs::cache_dir().map(|dir| dir.join("docindex")))
    }
}

impl Config {
    /// Default configuration file location (`<config dir>/docindex/config.toml`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("docindex").join("config.toml"))
    }

    /// Loads configuration.
    ///
    /// An explicit path must exist. Without one, the default location is used
    /// when present, and built-in defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        match Self::default_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => {
                tracing::debug!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Reads and parses a TOML configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}
