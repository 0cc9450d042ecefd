//! Property-based tests for the range planner and merge canonicalization.

use chrono::{DateTime, Duration, NaiveDate};
use klinevault_core::merge::canonicalize;
use klinevault_core::{month_range, Kline};
use proptest::prelude::*;

fn kline(open_ms: i64, close: f64) -> Kline {
    let open_time = DateTime::from_timestamp_millis(open_ms).unwrap();
    Kline {
        open_time,
        open: 100.0,
        high: 101.0,
        low: 99.0,
        close,
        volume: 10.0,
        close_time: open_time + Duration::milliseconds(59_999),
        quote_volume: 1000.0,
        trade_count: 1,
        taker_buy_base: 5.0,
        taker_buy_quote: 500.0,
        ignore: 0.0,
    }
}

proptest! {
    #[test]
    fn planner_emits_one_key_per_calendar_month(
        start_days in 0i64..20_000,
        extra_days in 0i64..2_000,
    ) {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        let start = epoch + Duration::days(start_days);
        let end = start + Duration::days(extra_days);

        let keys = month_range(start, end).unwrap();

        let months = |d: NaiveDate| {
            use chrono::Datelike;
            d.year() as i64 * 12 + d.month() as i64
        };
        prop_assert_eq!(keys.len() as i64, months(end) - months(start) + 1);

        // Ascending, contiguous, endpoints included.
        prop_assert_eq!((keys[0].year as i64 * 12) + keys[0].month as i64, months(start));
        for pair in keys.windows(2) {
            let a = pair[0].year as i64 * 12 + pair[0].month as i64;
            let b = pair[1].year as i64 * 12 + pair[1].month as i64;
            prop_assert_eq!(b, a + 1);
        }
    }

    #[test]
    fn planner_rejects_inverted_ranges(
        start_days in 1i64..20_000,
        back_days in 1i64..1_000,
    ) {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        let start = epoch + Duration::days(start_days);
        let end = start - Duration::days(back_days);
        prop_assert!(month_range(start, end).is_err());
    }

    #[test]
    fn canonicalize_yields_strictly_ascending_unique_series(
        stamps in proptest::collection::vec(0i64..10_000, 0..200),
    ) {
        let rows: Vec<Kline> = stamps
            .iter()
            .enumerate()
            .map(|(i, &minute)| kline(minute * 60_000, i as f64))
            .collect();

        let merged = canonicalize(rows);

        for pair in merged.windows(2) {
            prop_assert!(pair[0].open_time < pair[1].open_time);
        }

        // One row per distinct open time, and the survivor is the first
        // occurrence in input order.
        let mut expected: std::collections::BTreeMap<i64, f64> = std::collections::BTreeMap::new();
        for (i, &minute) in stamps.iter().enumerate() {
            expected.entry(minute * 60_000).or_insert(i as f64);
        }
        prop_assert_eq!(merged.len(), expected.len());
        for row in &merged {
            prop_assert_eq!(row.close, expected[&row.open_time.timestamp_millis()]);
        }
    }
}
