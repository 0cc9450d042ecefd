//! Domain types: cadences, kline rows, decoded batches, merged series.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Column names of the fixed 12-field kline schema, in payload order.
pub const COLUMNS: [&str; 12] = [
    "Open time",
    "Open",
    "High",
    "Low",
    "Close",
    "Volume",
    "Close time",
    "Quote asset volume",
    "Number of trades",
    "Taker buy base asset volume",
    "Taker buy quote asset volume",
    "Ignore",
];

/// Candlestick cadence. Only cadences with a fixed bar duration are
/// supported, since the regularity check needs an exact expected delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    M1,
    M5,
    M15,
    H1,
    H4,
    D1,
}

impl Period {
    pub const ALL: [Period; 6] = [
        Period::M1,
        Period::M5,
        Period::M15,
        Period::H1,
        Period::H4,
        Period::D1,
    ];

    /// Exact duration of one bar at this cadence.
    pub fn duration(self) -> Duration {
        match self {
            Period::M1 => Duration::minutes(1),
            Period::M5 => Duration::minutes(5),
            Period::M15 => Duration::minutes(15),
            Period::H1 => Duration::hours(1),
            Period::H4 => Duration::hours(4),
            Period::D1 => Duration::days(1),
        }
    }

    /// Wire/path spelling, as used by the remote host and cache layout.
    pub fn as_str(self) -> &'static str {
        match self {
            Period::M1 => "1m",
            Period::M5 => "5m",
            Period::M15 => "15m",
            Period::H1 => "1h",
            Period::H4 => "4h",
            Period::D1 => "1d",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown period '{0}'; expected one of 1m, 5m, 15m, 1h, 4h, 1d")]
pub struct ParsePeriodError(String);

impl FromStr for Period {
    type Err = ParsePeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1m" => Ok(Period::M1),
            "5m" => Ok(Period::M5),
            "15m" => Ok(Period::M15),
            "1h" => Ok(Period::H1),
            "4h" => Ok(Period::H4),
            "1d" => Ok(Period::D1),
            other => Err(ParsePeriodError(other.to_string())),
        }
    }
}

/// One candlestick observation. Missing numeric cells decode to NaN so a
/// noisy source row survives parsing and surfaces as a validator finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kline {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub close_time: DateTime<Utc>,
    pub quote_volume: f64,
    pub trade_count: u64,
    pub taker_buy_base: f64,
    pub taker_buy_quote: f64,
    /// Reserved field, carried through verbatim.
    pub ignore: f64,
}

impl Kline {
    /// Number of NaN cells in this row.
    pub fn null_cell_count(&self) -> usize {
        [
            self.open,
            self.high,
            self.low,
            self.close,
            self.volume,
            self.quote_volume,
            self.taker_buy_base,
            self.taker_buy_quote,
            self.ignore,
        ]
        .iter()
        .filter(|v| v.is_nan())
        .count()
    }
}

/// Rows decoded from one monthly archive, plus the minimum column width
/// observed across its records. A width below 12 means trailing columns
/// are absent from the payload, which the validator treats as a hard
/// schema violation.
#[derive(Debug, Clone)]
pub struct KlineBatch {
    pub klines: Vec<Kline>,
    pub width: usize,
}

/// Merged series for one (symbol, period): ascending by open time, with
/// open times unique.
#[derive(Debug, Clone)]
pub struct KlineSeries {
    pub symbol: String,
    pub period: Period,
    pub klines: Vec<Kline>,
}

impl KlineSeries {
    pub fn len(&self) -> usize {
        self.klines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.klines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_roundtrips_through_str() {
        for period in Period::ALL {
            assert_eq!(period.as_str().parse::<Period>().unwrap(), period);
        }
    }

    #[test]
    fn unknown_period_is_rejected() {
        assert!("3m".parse::<Period>().is_err());
        assert!("".parse::<Period>().is_err());
    }

    #[test]
    fn durations_are_exact() {
        assert_eq!(Period::M1.duration(), Duration::minutes(1));
        assert_eq!(Period::H4.duration(), Duration::hours(4));
        assert_eq!(Period::D1.duration(), Duration::hours(24));
    }

    #[test]
    fn null_cell_count_sees_nan() {
        let mut k = Kline {
            open_time: DateTime::from_timestamp_millis(0).unwrap(),
            open: 1.0,
            high: 2.0,
            low: 0.5,
            close: 1.5,
            volume: 10.0,
            close_time: DateTime::from_timestamp_millis(59_999).unwrap(),
            quote_volume: 15.0,
            trade_count: 3,
            taker_buy_base: 5.0,
            taker_buy_quote: 7.5,
            ignore: 0.0,
        };
        assert_eq!(k.null_cell_count(), 0);
        k.volume = f64::NAN;
        k.quote_volume = f64::NAN;
        assert_eq!(k.null_cell_count(), 2);
    }
}
