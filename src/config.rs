//! Configuration file parser for ~/.config/feedflow/config.toml.
//!
//! The config file is optional — a missing file yields `Config::default()`.
//! All keys are individually optional thanks to `#[serde(default)]`.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::feed::ConcurrencyPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds the maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

/// Top-level application configuration.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Refresh interval in minutes for the CLI's loop mode. 0 = single run.
    pub refresh_interval_minutes: u64,

    /// Days to keep feed items before the retention sweep drops them.
    pub retention_days: u32,

    /// Worker-pool sizing overrides for the refresh pipeline.
    pub concurrency: ConcurrencyConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval_minutes: 0,
            retention_days: 7,
            concurrency: ConcurrencyConfig::default(),
        }
    }
}

/// Pipeline worker-pool sizing, mirroring [`ConcurrencyPolicy`].
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConcurrencyConfig {
    pub threshold: usize,
    pub standard_fetchers: usize,
    pub reduced_fetchers: usize,
    pub standard_savers: usize,
    pub reduced_savers: usize,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        let policy = ConcurrencyPolicy::default();
        Self {
            threshold: policy.threshold,
            standard_fetchers: policy.standard_fetchers,
            reduced_fetchers: policy.reduced_fetchers,
            standard_savers: policy.standard_savers,
            reduced_savers: policy.reduced_savers,
        }
    }
}

impl From<ConcurrencyConfig> for ConcurrencyPolicy {
    fn from(config: ConcurrencyConfig) -> Self {
        Self {
            threshold: config.threshold,
            standard_fetchers: config.standard_fetchers,
            reduced_fetchers: config.reduced_fetchers,
            standard_savers: config.standard_savers,
            reduced_savers: config.reduced_savers,
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB); anything bigger is rejected unread.
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// A missing file is not an error; defaults apply.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let metadata = std::fs::metadata(path)?;
        if metadata.len() > Self::MAX_FILE_SIZE {
            return Err(ConfigError::TooLarge(format!(
                "{} bytes (max {})",
                metadata.len(),
                Self::MAX_FILE_SIZE
            )));
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}
