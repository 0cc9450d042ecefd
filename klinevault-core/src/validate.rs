//! Batch validation: hard schema checks plus soft data-quality findings.
//!
//! Upstream archives are occasionally malformed around exchange outages
//! and maintenance windows. The pipeline must surface those anomalies
//! without silently hiding them and without aborting the whole batch, so
//! everything short of a structural violation is a warning-level finding.

use crate::error::DataError;
use crate::klines::{Kline, KlineBatch, Period, COLUMNS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// One data-quality observation about a batch.
#[derive(Debug, Clone)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
}

impl Finding {
    fn warning(message: String) -> Self {
        Self {
            severity: Severity::Warning,
            message,
        }
    }
}

/// Validate a decoded batch against the fixed schema and the period's
/// cadence.
///
/// Hard failures (missing columns, empty batch) return `SchemaViolation`
/// and abort consumption of this batch only. Soft findings leave the
/// batch usable.
pub fn validate_batch(
    batch: &KlineBatch,
    period: Period,
    min_rows: usize,
) -> Result<Vec<Finding>, DataError> {
    if batch.width < COLUMNS.len() {
        let missing: Vec<&str> = COLUMNS[batch.width..].to_vec();
        return Err(DataError::SchemaViolation {
            reason: format!("missing required columns: {}", missing.join(", ")),
        });
    }
    if batch.klines.is_empty() {
        return Err(DataError::SchemaViolation {
            reason: "empty batch".to_string(),
        });
    }

    let mut findings = Vec::new();

    let null_cells: usize = batch.klines.iter().map(|k| k.null_cell_count()).sum();
    if null_cells > 0 {
        findings.push(Finding::warning(format!(
            "batch contains {null_cells} missing values"
        )));
    }

    if batch.klines.len() < min_rows {
        findings.push(Finding::warning(format!(
            "batch contains fewer rows than expected: {}",
            batch.klines.len()
        )));
    }

    // Cadence regularity. The first row has no predecessor, so diffs start
    // at row 1; reported indices name the later row of each irregular pair.
    let expected = period.duration();
    let gaps: Vec<usize> = batch
        .klines
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| pair[1].open_time - pair[0].open_time != expected)
        .map(|(i, _)| i + 1)
        .collect();
    if !gaps.is_empty() {
        findings.push(Finding::warning(format!(
            "found {} irregular time intervals (expected {expected}), rows: {gaps:?}",
            gaps.len()
        )));
    }

    let price_columns: [(&str, fn(&Kline) -> f64); 4] = [
        ("Open", |k| k.open),
        ("High", |k| k.high),
        ("Low", |k| k.low),
        ("Close", |k| k.close),
    ];
    for (name, field) in price_columns {
        let count = batch.klines.iter().filter(|k| field(k) <= 0.0).count();
        if count > 0 {
            findings.push(Finding::warning(format!(
                "found {count} non-positive values in {name} column"
            )));
        }
    }

    let inverted = batch.klines.iter().filter(|k| k.high < k.low).count();
    if inverted > 0 {
        findings.push(Finding::warning(format!(
            "found {inverted} records where High price is lower than Low price"
        )));
    }

    Ok(findings)
}
