//! KlineVault core: monthly kline archive acquisition pipeline.
//!
//! The pipeline, in order:
//! - Range planner expands a date range into calendar-month keys
//! - Fetcher materializes each monthly archive into the local cache
//! - Parser decodes a cached archive into typed kline rows
//! - Validator checks schema completeness, cadence, and price sanity
//! - Merger combines all months into one ascending, duplicate-free series
//! - Verifier audits the merged series against its expected row count

pub mod config;
pub mod download;
pub mod error;
pub mod fetch;
pub mod klines;
pub mod locate;
pub mod merge;
pub mod parse;
pub mod plan;
pub mod validate;
pub mod verify;

pub use config::DownloaderConfig;
pub use download::{download_range, DownloadProgress, DownloadSummary, StdoutProgress};
pub use error::DataError;
pub use fetch::{FetchOutcome, Fetcher};
pub use klines::{Kline, KlineBatch, KlineSeries, Period, COLUMNS};
pub use locate::ArchiveKey;
pub use merge::{merge_archives, read_series, series_path, write_series};
pub use parse::parse_archive;
pub use plan::{month_range, MonthKey};
pub use validate::{validate_batch, Finding, Severity};
pub use verify::verify_series;
