//! Run configuration.
//!
//! Settings are resolved once at startup from three layers, highest first:
//! command-line flags (and their environment variables), the optional YAML
//! file, and built-in defaults. The result is a plain [`Settings`] value
//! handed to the rest of the program by reference.
//!
//! # YAML Example
//!
//! ```yaml
//! feeds:
//!   - https://bitcoinmagazine.com/feed
//! output_file: ./data/news.json
//! target_language: Malay
//! gemini_model: gemini-2.0-flash
//! timeouts:
//!   feed_secs: 30
//!   article_secs: 10
//!   translate_secs: 60
//! ```

use crate::cli::Cli;
use crate::ingest::IngestOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument};

pub const DEFAULT_FEEDS: &[&str] = &["https://bitcoinmagazine.com/feed"];
pub const DEFAULT_OUTPUT_FILE: &str = "./data/news.json";
pub const DEFAULT_TARGET_LANGUAGE: &str = "Malay";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_FALLBACK_IMAGE: &str = "https://images.unsplash.com/photo-1518546305927-5a555bb7020d?auto=format&fit=crop&w=800&q=80";

const DEFAULT_FEED_TIMEOUT_SECS: u64 = 30;
const DEFAULT_ARTICLE_TIMEOUT_SECS: u64 = 10;
const DEFAULT_TRANSLATE_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid config file {path}: timeouts.{key} must be at least 1 second")]
    ZeroTimeout { path: PathBuf, key: &'static str },
}

/// Contents of the optional YAML config file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub feeds: Option<Vec<String>>,
    pub output_file: Option<PathBuf>,
    pub target_language: Option<String>,
    pub gemini_model: Option<String>,
    pub fallback_image: Option<String>,
    pub timeouts: Timeouts,
}

/// Network timeouts, in seconds.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Timeouts {
    pub feed_secs: u64,
    pub article_secs: u64,
    pub translate_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            feed_secs: DEFAULT_FEED_TIMEOUT_SECS,
            article_secs: DEFAULT_ARTICLE_TIMEOUT_SECS,
            translate_secs: DEFAULT_TRANSLATE_TIMEOUT_SECS,
        }
    }
}

impl Timeouts {
    /// Name of the first timeout set to zero, if any.
    fn zero_key(&self) -> Option<&'static str> {
        [
            ("feed_secs", self.feed_secs),
            ("article_secs", self.article_secs),
            ("translate_secs", self.translate_secs),
        ]
        .into_iter()
        .find_map(|(key, secs)| (secs == 0).then_some(key))
    }
}

impl FileConfig {
    /// Parse a YAML config file.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        // reqwest treats a zero timeout as already expired.
        if let Some(key) = config.timeouts.zero_key() {
            return Err(ConfigError::ZeroTimeout {
                path: path.to_path_buf(),
                key,
            });
        }
        info!("Loaded configuration file");
        Ok(config)
    }

    fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        // An empty file deserializes to `null`.
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub feeds: Vec<String>,
    pub output_file: PathBuf,
    pub target_language: String,
    /// `None` disables translation.
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub fallback_image: String,
    pub timeouts: Timeouts,
}

impl Settings {
    /// Read the config file named by `cli` (if any) and resolve.
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Ok(Self::resolve(cli, file))
    }

    /// Merge CLI/env values over file values over defaults.
    pub fn resolve(cli: Cli, file: FileConfig) -> Self {
        let feeds = if !cli.feeds.is_empty() {
            cli.feeds
        } else {
            file.feeds
                .filter(|f| !f.is_empty())
                .unwrap_or_else(|| DEFAULT_FEEDS.iter().map(|s| s.to_string()).collect())
        };

        Self {
            feeds,
            output_file: cli
                .output_file
                .or(file.output_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE)),
            target_language: cli
                .target_language
                .or(file.target_language)
                .unwrap_or_else(|| DEFAULT_TARGET_LANGUAGE.to_string()),
            gemini_api_key: cli.gemini_api_key.filter(|k| !k.trim().is_empty()),
            gemini_model: cli
                .gemini_model
                .or(file.gemini_model)
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            fallback_image: file
                .fallback_image
                .unwrap_or_else(|| DEFAULT_FALLBACK_IMAGE.to_string()),
            timeouts: file.timeouts,
        }
    }

    pub fn translate_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.translate_secs)
    }

    /// The subset of settings the ingestor needs.
    pub fn ingest_options(&self) -> IngestOptions {
        IngestOptions {
            target_language: self.target_language.clone(),
            fallback_image: self.fallback_image.clone(),
            feed_timeout: Duration::from_secs(self.timeouts.feed_secs),
            article_timeout: Duration::from_secs(self.timeouts.article_secs),
        }
    }
}
