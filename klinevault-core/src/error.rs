//! Structured error types for the acquisition pipeline.
//!
//! Each variant carries enough context (archive path, URL, underlying
//! cause) to diagnose a failure from the log line alone.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("archive not found: {path}")]
    NotFound { path: PathBuf },

    #[error("bad archive {path}: {reason}")]
    BadArchive { path: PathBuf, reason: String },

    #[error("schema violation: {reason}")]
    SchemaViolation { reason: String },

    #[error("transport failure for {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("no cached archives for {symbol}/{period}, run `download` first")]
    NoData { symbol: String, period: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
