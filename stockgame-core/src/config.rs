//! Sampler and service configuration.
//!
//! Every constraint the sampler enforces is a field here rather than a literal
//! in the sampling loop. Config files are TOML; every field has a default, so
//! an empty file is a valid config.
//!
//! ```toml
//! data_dir = "stockinfo"
//!
//! [sampler]
//! threshold_date = "2016-01-01"
//! min_lookback = 60
//! min_forward = 500
//! lookback_window = 300
//! max_attempts = 100
//! ```

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Constraints for drawing a game-start position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Game-start rows must be dated strictly after midnight of this day.
    pub threshold_date: NaiveDate,

    /// Minimum number of rows that must precede the game-start row.
    pub min_lookback: usize,

    /// Minimum number of rows from the game-start row (inclusive) to the end.
    pub min_forward: usize,

    /// Number of history rows kept before the game-start row.
    pub lookback_window: usize,

    /// Files drawn before giving up.
    pub max_attempts: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            threshold_date: NaiveDate::from_ymd_opt(2016, 1, 1).unwrap_or(NaiveDate::MIN),
            min_lookback: 60,
            min_forward: 500,
            lookback_window: 300,
            max_attempts: 100,
        }
    }
}

impl SamplerConfig {
    /// The threshold as a timestamp (midnight of `threshold_date`).
    pub fn threshold(&self) -> NaiveDateTime {
        self.threshold_date.and_time(NaiveTime::MIN)
    }

    /// Reject values the sampler cannot honor.
    ///
    /// `min_forward == 0` would let the draw land one past the last row.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_forward == 0 {
            return Err(ConfigError::Invalid("min_forward must be at least 1".into()));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid("max_attempts must be at least 1".into()));
        }
        Ok(())
    }

    /// Parse and validate a sampler config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a sampler config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::from_toml(&read_config(path)?)
    }
}

/// Top-level service config: where the corpus lives plus sampler constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub data_dir: PathBuf,
    pub sampler: SamplerConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("stockinfo"),
            sampler: SamplerConfig::default(),
        }
    }
}

impl ServiceConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.sampler.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::from_toml(&read_config(path)?)
    }
}

fn read_config(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}
