//! Archive parsing: one zip, one headerless CSV member, typed rows.
//!
//! No rows are dropped here; data-quality checks live in the validator.
//! Only structural faults (missing file, broken zip, unparseable cells
//! that have no NaN rendition) fail the parse.

use crate::error::DataError;
use crate::klines::{Kline, KlineBatch, COLUMNS};
use chrono::{DateTime, Utc};
use std::fs;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

/// Decode a cached monthly archive into a typed batch.
pub fn parse_archive(path: &Path) -> Result<KlineBatch, DataError> {
    if !path.exists() {
        return Err(DataError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let file = fs::File::open(path)?;
    let mut archive =
        ZipArchive::new(file).map_err(|e| bad(path, format!("unreadable zip: {e}")))?;

    // Exactly one CSV member is expected per monthly archive.
    let csv_names: Vec<String> = archive
        .file_names()
        .filter(|name| name.ends_with(".csv"))
        .map(str::to_string)
        .collect();
    let member = match csv_names.as_slice() {
        [one] => one.clone(),
        [] => return Err(bad(path, "no CSV member in archive")),
        many => {
            return Err(bad(
                path,
                format!("expected one CSV member, found {}", many.len()),
            ))
        }
    };

    let mut payload = String::new();
    archive
        .by_name(&member)
        .map_err(|e| bad(path, format!("cannot open member {member}: {e}")))?
        .read_to_string(&mut payload)
        .map_err(|e| bad(path, format!("cannot read member {member}: {e}")))?;

    decode_rows(path, &payload)
}

fn decode_rows(path: &Path, payload: &str) -> Result<KlineBatch, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(payload.as_bytes());

    let mut klines = Vec::new();
    let mut width = COLUMNS.len();

    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| bad(path, format!("row {row}: {e}")))?;
        width = width.min(record.len());
        klines.push(decode_row(path, row, &record)?);
    }

    Ok(KlineBatch { klines, width })
}

fn decode_row(path: &Path, row: usize, record: &csv::StringRecord) -> Result<Kline, DataError> {
    Ok(Kline {
        open_time: instant_field(path, row, record, 0)?,
        open: numeric_field(path, row, record, 1)?,
        high: numeric_field(path, row, record, 2)?,
        low: numeric_field(path, row, record, 3)?,
        close: numeric_field(path, row, record, 4)?,
        volume: numeric_field(path, row, record, 5)?,
        close_time: instant_field(path, row, record, 6)?,
        quote_volume: numeric_field(path, row, record, 7)?,
        trade_count: count_field(path, row, record, 8)?,
        taker_buy_base: numeric_field(path, row, record, 9)?,
        taker_buy_quote: numeric_field(path, row, record, 10)?,
        ignore: numeric_field(path, row, record, 11)?,
    })
}

/// Millisecond-epoch timestamp cell. Timestamps anchor ordering and
/// merging, so an absent or garbled one is a structural failure.
fn instant_field(
    path: &Path,
    row: usize,
    record: &csv::StringRecord,
    idx: usize,
) -> Result<DateTime<Utc>, DataError> {
    let cell = cell_at(record, idx).ok_or_else(|| {
        bad(path, format!("row {row}: missing '{}' value", COLUMNS[idx]))
    })?;
    let millis: i64 = cell.parse().map_err(|_| {
        bad(
            path,
            format!("row {row}: bad timestamp '{cell}' in '{}'", COLUMNS[idx]),
        )
    })?;
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        bad(
            path,
            format!("row {row}: out-of-range timestamp {millis} in '{}'", COLUMNS[idx]),
        )
    })
}

/// Decimal cell. An empty cell decodes to NaN (surfaced later as a soft
/// validator finding); a non-numeric cell is a structural failure.
fn numeric_field(
    path: &Path,
    row: usize,
    record: &csv::StringRecord,
    idx: usize,
) -> Result<f64, DataError> {
    match cell_at(record, idx) {
        None => Ok(f64::NAN),
        Some(cell) => cell.parse().map_err(|_| {
            bad(
                path,
                format!("row {row}: bad number '{cell}' in '{}'", COLUMNS[idx]),
            )
        }),
    }
}

fn count_field(
    path: &Path,
    row: usize,
    record: &csv::StringRecord,
    idx: usize,
) -> Result<u64, DataError> {
    match cell_at(record, idx) {
        None => Ok(0),
        Some(cell) => cell.parse().map_err(|_| {
            bad(
                path,
                format!("row {row}: bad count '{cell}' in '{}'", COLUMNS[idx]),
            )
        }),
    }
}

fn cell_at<'r>(record: &'r csv::StringRecord, idx: usize) -> Option<&'r str> {
    record.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

fn bad(path: &Path, reason: impl Into<String>) -> DataError {
    DataError::BadArchive {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use zip::write::SimpleFileOptions;

    fn write_zip(dir: &Path, name: &str, members: &[(&str, &str)]) -> PathBuf {
        let path = dir.join(name);
        let file = fs::File::create(&path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        for (member, content) in members {
            writer
                .start_file(member.to_string(), SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
        path
    }

    const ROW_A: &str =
        "1609459200000,736.42,741.0,735.0,740.1,1200.5,1609462799999,885000.0,3400,600.2,442000.0,0\n";
    const ROW_B: &str =
        "1609462800000,740.1,744.9,739.0,743.2,980.0,1609466399999,728000.0,2900,480.0,356000.0,0\n";

    #[test]
    fn parses_single_member_archive() {
        let dir = tempfile::tempdir().unwrap();
        let payload = format!("{ROW_A}{ROW_B}");
        let path = write_zip(
            dir.path(),
            "ETHUSDT-1h-2021-01.zip",
            &[("ETHUSDT-1h-2021-01.csv", &payload)],
        );

        let batch = parse_archive(&path).unwrap();
        assert_eq!(batch.klines.len(), 2);
        assert_eq!(batch.width, 12);
        assert_eq!(
            batch.klines[0].open_time,
            DateTime::from_timestamp_millis(1_609_459_200_000).unwrap()
        );
        assert_eq!(batch.klines[0].open, 736.42);
        assert_eq!(batch.klines[1].trade_count, 2900);
        assert!(batch.klines[0].close_time > batch.klines[0].open_time);
    }

    #[test]
    fn empty_numeric_cell_becomes_nan() {
        let dir = tempfile::tempdir().unwrap();
        let payload =
            "1609459200000,736.42,741.0,735.0,740.1,,1609462799999,885000.0,3400,600.2,442000.0,0\n";
        let path = write_zip(dir.path(), "a.zip", &[("a.csv", payload)]);

        let batch = parse_archive(&path).unwrap();
        assert!(batch.klines[0].volume.is_nan());
        assert_eq!(batch.width, 12);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = parse_archive(&dir.path().join("absent.zip"));
        assert!(matches!(result, Err(DataError::NotFound { .. })));
    }

    #[test]
    fn archive_without_csv_member_is_bad() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_zip(dir.path(), "a.zip", &[("readme.txt", "hello")]);
        let result = parse_archive(&path);
        assert!(matches!(result, Err(DataError::BadArchive { .. })));
    }

    #[test]
    fn archive_with_two_csv_members_is_bad() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_zip(
            dir.path(),
            "a.zip",
            &[("one.csv", ROW_A), ("two.csv", ROW_B)],
        );
        let result = parse_archive(&path);
        assert!(matches!(result, Err(DataError::BadArchive { .. })));
    }

    #[test]
    fn garbage_timestamp_is_bad() {
        let dir = tempfile::tempdir().unwrap();
        let payload = "Open time,Open,High,Low,Close,Volume,Close time,q,n,t,u,i\n";
        let path = write_zip(dir.path(), "a.zip", &[("a.csv", payload)]);
        let result = parse_archive(&path);
        assert!(matches!(result, Err(DataError::BadArchive { .. })));
    }

    #[test]
    fn corrupt_zip_is_bad() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.zip");
        fs::write(&path, b"this is not a zip archive").unwrap();
        let result = parse_archive(&path);
        assert!(matches!(result, Err(DataError::BadArchive { .. })));
    }
}
