//! Archive fetching: idempotent cache checks, bounded retry, atomic writes.
//!
//! The `Fetcher` is the one context object owning the HTTP client; it is
//! constructed once per run and shared read-only. Transport and status
//! failures are folded into `FetchOutcome::Failed` at this boundary so a
//! batch run continues past bad months.

use crate::config::DownloaderConfig;
use crate::error::DataError;
use crate::locate::ArchiveKey;
use std::fs;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Outcome of a single fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The local file already existed; no network call was made.
    AlreadyCached,
    Downloaded,
    Failed,
}

impl FetchOutcome {
    pub fn is_success(self) -> bool {
        !matches!(self, FetchOutcome::Failed)
    }
}

pub struct Fetcher<'a> {
    client: reqwest::blocking::Client,
    config: &'a DownloaderConfig,
}

impl<'a> Fetcher<'a> {
    pub fn new(config: &'a DownloaderConfig) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");

        Self { client, config }
    }

    pub fn config(&self) -> &DownloaderConfig {
        self.config
    }

    /// Fetch one archive into the local cache.
    ///
    /// Idempotent: an existing local file short-circuits without a network
    /// call, which makes re-invocation after a partial run safe.
    pub fn fetch(&self, key: &ArchiveKey) -> FetchOutcome {
        let path = key.local_path(self.config);
        if path.exists() {
            debug!(archive = %key, "already cached, skipping");
            return FetchOutcome::AlreadyCached;
        }

        match self.download(key) {
            Ok(()) => FetchOutcome::Downloaded,
            Err(e) => {
                error!(archive = %key, error = %e, "fetch failed");
                FetchOutcome::Failed
            }
        }
    }

    fn download(&self, key: &ArchiveKey) -> Result<(), DataError> {
        let url = key.remote_url(self.config);
        let path = key.local_path(self.config);
        info!(archive = %key, url = %url, "downloading");

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut response = self.get_with_retry(&url)?;
        if !response.status().is_success() {
            return Err(DataError::Transport {
                url,
                reason: format!("HTTP {}", response.status()),
            });
        }

        // Stream to a temp path and rename into place, so a partial
        // download can never be mistaken for a cached archive.
        let tmp_path = path.with_extension("zip.tmp");
        let mut file = fs::File::create(&tmp_path)?;
        if let Err(e) = response.copy_to(&mut file) {
            let _ = fs::remove_file(&tmp_path);
            return Err(DataError::Transport {
                url,
                reason: e.to_string(),
            });
        }
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::from(e)
        })?;
        Ok(())
    }

    /// Issue the GET, retrying connection-level failures (timeouts,
    /// resets) with exponential backoff. Application-level failures such
    /// as a 404 for a month the host never published are not retried; the
    /// idempotency check makes a later run retry them for free.
    fn get_with_retry(&self, url: &str) -> Result<reqwest::blocking::Response, DataError> {
        let mut last_error = None;

        for attempt in 0..=self.config.retry_count {
            if attempt > 0 {
                let delay = self.config.retry_delay() * 2u32.pow(attempt - 1);
                warn!(url, attempt, "retrying after transport failure");
                std::thread::sleep(delay);
            }

            match self.client.get(url).send() {
                Ok(response) => return Ok(response),
                Err(e) if e.is_connect() || e.is_timeout() => {
                    last_error = Some(DataError::Transport {
                        url: url.to_string(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    return Err(DataError::Transport {
                        url: url.to_string(),
                        reason: e.to_string(),
                    })
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::Transport {
            url: url.to_string(),
            reason: "max retries exceeded".to_string(),
        }))
    }
}
