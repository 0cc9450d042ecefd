//! Batch download driver: plan months, fetch each archive, report progress.

use crate::error::DataError;
use crate::fetch::{FetchOutcome, Fetcher};
use crate::klines::Period;
use crate::locate::ArchiveKey;
use crate::plan::month_range;
use chrono::NaiveDate;

/// Progress callbacks for a multi-month download.
pub trait DownloadProgress {
    fn on_start(&self, key: &ArchiveKey, index: usize, total: usize);
    fn on_complete(&self, key: &ArchiveKey, index: usize, total: usize, outcome: FetchOutcome);
}

/// Prints `[i/n]` progress lines to stdout.
pub struct StdoutProgress;

impl DownloadProgress for StdoutProgress {
    fn on_start(&self, key: &ArchiveKey, index: usize, total: usize) {
        println!("[{}/{}] Fetching {key}...", index + 1, total);
    }

    fn on_complete(&self, key: &ArchiveKey, _index: usize, _total: usize, outcome: FetchOutcome) {
        match outcome {
            FetchOutcome::Downloaded => println!("  OK: {key}"),
            FetchOutcome::AlreadyCached => println!("  skip (cached): {key}"),
            FetchOutcome::Failed => println!("  FAIL: {key}"),
        }
    }
}

/// Summary of one (symbol, period) download run.
#[derive(Debug, Default)]
pub struct DownloadSummary {
    pub total: usize,
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub failed_keys: Vec<ArchiveKey>,
}

impl DownloadSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Fetch every monthly archive for a symbol/period across a date range.
///
/// Failures are recorded, not raised: a month missing on the remote host
/// must not stop the rest of the range, and the idempotent fetch makes a
/// re-run pick up exactly the failed months. A fixed pause follows each
/// request that actually touched the network, keeping the aggregate rate
/// within the host's expectations; cache hits skip it.
pub fn download_range(
    fetcher: &Fetcher,
    symbol: &str,
    period: Period,
    start: NaiveDate,
    end: NaiveDate,
    progress: &dyn DownloadProgress,
) -> Result<DownloadSummary, DataError> {
    let months = month_range(start, end)?;
    let total = months.len();
    let mut summary = DownloadSummary {
        total,
        ..Default::default()
    };

    for (i, month) in months.iter().enumerate() {
        let key = ArchiveKey::new(symbol, period, month.year, month.month);
        progress.on_start(&key, i, total);

        let outcome = fetcher.fetch(&key);
        progress.on_complete(&key, i, total, outcome);

        match outcome {
            FetchOutcome::Downloaded => summary.downloaded += 1,
            FetchOutcome::AlreadyCached => summary.skipped += 1,
            FetchOutcome::Failed => {
                summary.failed += 1;
                summary.failed_keys.push(key);
            }
        }

        let touched_network = !matches!(outcome, FetchOutcome::AlreadyCached);
        if touched_network && i + 1 < total {
            std::thread::sleep(fetcher.config().request_interval());
        }
    }

    Ok(summary)
}
