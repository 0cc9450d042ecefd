//! Integrity audit: compare actual row count against the count implied by
//! the series' time span and cadence. Never mutates or repairs.

use crate::klines::{KlineSeries, Period};
use tracing::warn;

/// Up to 5% of rows may be missing before a series is flagged.
const COMPLETENESS_THRESHOLD: f64 = 0.95;

/// Returns false when the series looks incomplete for its time span.
pub fn verify_series(series: &KlineSeries, period: Period) -> bool {
    let (Some(first), Some(last)) = (series.klines.first(), series.klines.last()) else {
        return false;
    };

    let span = last.open_time - first.open_time;
    let cadence = period.duration();
    let expected = span.num_milliseconds() as f64 / cadence.num_milliseconds() as f64;
    let actual = series.klines.len() as f64;

    if actual < expected * COMPLETENESS_THRESHOLD {
        warn!(
            symbol = %series.symbol,
            period = %period,
            expected = expected.round(),
            actual = series.klines.len() as u64,
            "dataset looks incomplete"
        );
        return false;
    }
    true
}
