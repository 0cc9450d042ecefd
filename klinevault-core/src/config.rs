//! Downloader configuration, loadable from a TOML file.
//!
//! Constructed once per run and shared read-only by every component.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloaderConfig {
    /// Base address of the bulk-data host.
    pub base_url: String,
    /// Retries for connection-level failures (timeouts, resets).
    pub retry_count: u32,
    /// Base backoff delay between retries, in seconds.
    pub retry_delay_secs: u64,
    /// Pause between successive downloads in a batch, in seconds.
    pub request_interval_secs: u64,
    /// Root of the local archive cache.
    pub data_dir: PathBuf,
    /// Below this row count a monthly archive is flagged as suspiciously short.
    pub min_rows_per_file: usize,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://data.binance.vision/data".to_string(),
            retry_count: 3,
            retry_delay_secs: 2,
            request_interval_secs: 2,
            data_dir: PathBuf::from("data"),
            min_rows_per_file: 1000,
        }
    }
}

impl DownloaderConfig {
    /// Load a configuration from a TOML file. Missing keys fall back to
    /// the defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn request_interval(&self) -> Duration {
        Duration::from_secs(self.request_interval_secs)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
