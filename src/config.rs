//! Nibble engine configuration
//!
//! Read once when a `NibbleEngine` is built. Every field has a default, so an
//! empty JSON object is a valid configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::observability::{log_event, Event, Logger, Severity};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

fn default_warn_interval() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> Severity {
    Severity::Info
}

/// Configuration for the nibble engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NibbleConfig {
    /// Minimum seconds between two unindexed-column warnings for the same
    /// table and column.
    #[serde(default = "default_warn_interval")]
    pub unindexed_warn_interval_secs: u64,
    /// Reuse statement sets across invocations. When false every invocation
    /// resolves its statements again.
    #[serde(default = "default_true")]
    pub statement_cache_enabled: bool,
    /// Log begin/complete events for every invocation.
    #[serde(default = "default_true")]
    pub log_progress: bool,
    /// Process-wide minimum log severity applied by `apply_logging`.
    #[serde(default = "default_log_level")]
    pub log_level: Severity,
}

impl Default for NibbleConfig {
    fn default() -> Self {
        Self {
            unindexed_warn_interval_secs: default_warn_interval(),
            statement_cache_enabled: true,
            log_progress: true,
            log_level: default_log_level(),
        }
    }
}

impl NibbleConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: NibbleConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&content)?;
        log_event(
            Event::ConfigLoaded,
            &[("path", path.display().to_string().as_str())],
        );
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.unindexed_warn_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "unindexed_warn_interval_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn unindexed_warn_interval(&self) -> Duration {
        Duration::from_secs(self.unindexed_warn_interval_secs)
    }

    /// Applies `log_level` to the process-wide logger.
    pub fn apply_logging(&self) {
        Logger::set_min_severity(self.log_level);
    }
}
