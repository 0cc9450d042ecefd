//! Range planning: expand a date range into calendar-month keys.

use crate::error::DataError;
use chrono::{Datelike, NaiveDate};

/// One calendar month to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

/// Expand `[start, end]` into the ordered sequence of months touching the
/// range, one key per calendar month, inclusive of both endpoints.
pub fn month_range(start: NaiveDate, end: NaiveDate) -> Result<Vec<MonthKey>, DataError> {
    if start > end {
        return Err(DataError::InvalidRange { start, end });
    }

    let mut keys = Vec::new();
    let (mut year, mut month) = (start.year(), start.month());
    loop {
        keys.push(MonthKey { year, month });
        if year == end.year() && month == end.month() {
            break;
        }
        month += 1;
        if month > 12 {
            month = 1;
            year += 1;
        }
    }
    Ok(keys)
}
