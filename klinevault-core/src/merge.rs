//! Merging cached archives into one canonical series, plus CSV persistence.

use crate::config::DownloaderConfig;
use crate::error::DataError;
use crate::klines::{Kline, KlineSeries, Period, COLUMNS};
use crate::parse::parse_archive;
use crate::validate::validate_batch;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Render/parse format for merged-series timestamps. Fractional digits
/// are always written so close times (…:59.999) survive a round trip.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Merge every cached archive for a symbol/period into one ascending,
/// duplicate-free series.
///
/// Archives are processed sorted by filename, which the fixed naming
/// scheme makes chronological. A structurally broken archive aborts only
/// itself; the rest of the merge continues with a warning.
pub fn merge_archives(
    config: &DownloaderConfig,
    symbol: &str,
    period: Period,
) -> Result<KlineSeries, DataError> {
    let dir = config.data_dir.join(symbol).join(period.as_str());
    let archives = list_archives(&dir)?;
    if archives.is_empty() {
        return Err(no_data(symbol, period));
    }

    let total = archives.len();
    let mut klines: Vec<Kline> = Vec::new();

    for (i, path) in archives.iter().enumerate() {
        info!(file = %path.display(), "merging archive {}/{total}", i + 1);

        let batch = match parse_archive(path) {
            Ok(batch) => batch,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "skipping unreadable archive");
                continue;
            }
        };
        match validate_batch(&batch, period, config.min_rows_per_file) {
            Ok(findings) => {
                for finding in &findings {
                    warn!(file = %path.display(), "{}", finding.message);
                }
                klines.extend(batch.klines);
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "skipping archive");
            }
        }
    }

    if klines.is_empty() {
        return Err(no_data(symbol, period));
    }

    Ok(KlineSeries {
        symbol: symbol.to_string(),
        period,
        klines: canonicalize(klines),
    })
}

/// Sort by open time and drop duplicate open times, first occurrence wins.
/// The sort is stable, so duplicate resolution is deterministic.
pub fn canonicalize(mut klines: Vec<Kline>) -> Vec<Kline> {
    klines.sort_by_key(|k| k.open_time);
    klines.dedup_by_key(|k| k.open_time);
    klines
}

fn list_archives(dir: &Path) -> Result<Vec<PathBuf>, DataError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("zip"))
        .collect();
    paths.sort();
    Ok(paths)
}

fn no_data(symbol: &str, period: Period) -> DataError {
    DataError::NoData {
        symbol: symbol.to_string(),
        period: period.to_string(),
    }
}

/// Canonical merged output path: `<data_dir>/<symbol>/<symbol>-<period>.csv`.
pub fn series_path(config: &DownloaderConfig, symbol: &str, period: Period) -> PathBuf {
    config
        .data_dir
        .join(symbol)
        .join(format!("{symbol}-{period}.csv"))
}

/// Persist a merged series as a headered CSV.
///
/// Writes to a temp path and renames into place, so a partially written
/// output is never indistinguishable from a complete one.
pub fn write_series(config: &DownloaderConfig, series: &KlineSeries) -> Result<PathBuf, DataError> {
    let path = series_path(config, &series.symbol, series.period);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("csv.tmp");
    let mut writer = csv::Writer::from_path(&tmp_path)?;
    writer.write_record(COLUMNS)?;
    for k in &series.klines {
        writer.write_record(&[
            k.open_time.format(TIMESTAMP_FORMAT).to_string(),
            decimal_cell(k.open),
            decimal_cell(k.high),
            decimal_cell(k.low),
            decimal_cell(k.close),
            decimal_cell(k.volume),
            k.close_time.format(TIMESTAMP_FORMAT).to_string(),
            decimal_cell(k.quote_volume),
            k.trade_count.to_string(),
            decimal_cell(k.taker_buy_base),
            decimal_cell(k.taker_buy_quote),
            decimal_cell(k.ignore),
        ])?;
    }
    writer.flush()?;
    drop(writer);
    fs::rename(&tmp_path, &path)?;

    info!(file = %path.display(), rows = series.klines.len() as u64, "merged series saved");
    Ok(path)
}

/// Read a merged series CSV back into memory (verify-only mode and
/// round-trip checks).
pub fn read_series(
    config: &DownloaderConfig,
    symbol: &str,
    period: Period,
) -> Result<KlineSeries, DataError> {
    let path = series_path(config, symbol, period);
    if !path.exists() {
        return Err(DataError::NotFound { path });
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(&path)?;

    let mut klines = Vec::new();
    for record in reader.records() {
        let record = record?;
        klines.push(series_row(&path, &record)?);
    }

    Ok(KlineSeries {
        symbol: symbol.to_string(),
        period,
        klines,
    })
}

fn series_row(path: &Path, record: &csv::StringRecord) -> Result<Kline, DataError> {
    let instant = |idx: usize| -> Result<DateTime<Utc>, DataError> {
        let cell = record.get(idx).unwrap_or_default();
        let naive = NaiveDateTime::parse_from_str(cell, TIMESTAMP_FORMAT).map_err(|e| {
            DataError::BadArchive {
                path: path.to_path_buf(),
                reason: format!("bad timestamp '{cell}': {e}"),
            }
        })?;
        Ok(naive.and_utc())
    };
    let decimal = |idx: usize| -> f64 {
        record
            .get(idx)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|s| s.parse().ok())
            .unwrap_or(f64::NAN)
    };

    Ok(Kline {
        open_time: instant(0)?,
        open: decimal(1),
        high: decimal(2),
        low: decimal(3),
        close: decimal(4),
        volume: decimal(5),
        close_time: instant(6)?,
        quote_volume: decimal(7),
        trade_count: record
            .get(8)
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0),
        taker_buy_base: decimal(9),
        taker_buy_quote: decimal(10),
        ignore: decimal(11),
    })
}

/// NaN cells round-trip as empty strings.
fn decimal_cell(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}
