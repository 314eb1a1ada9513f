use std::fmt;

use chrono::{DateTime, NaiveDate};

use core_types::types::{MS_PER_DAY, TimestampMs};

/// Всё, что меньше, это секунды, а не миллисекунды (2001-09-09 в ms).
pub const SECONDS_EPOCH_CUTOFF: i64 = 100_000_000_000;

/// Приводит сырой timestamp к миллисекундам.
/// Коллектор и источники свечей отдают то секунды, то ms.
pub fn normalize_timestamp_ms(raw: i64) -> TimestampMs {
    if raw.abs() < SECONDS_EPOCH_CUTOFF {
        TimestampMs(raw.saturating_mul(1000))
    } else {
        TimestampMs(raw)
    }
}

/// Календарный UTC-день (граница: полночь UTC).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UtcDay(pub NaiveDate);

impl UtcDay {
    /// floor(ts / 86_400_000) → дата. None только для дат вне диапазона chrono.
    pub fn from_ts(ts: TimestampMs) -> Option<Self> {
        let midnight = ts.day_index().checked_mul(MS_PER_DAY)?;
        DateTime::from_timestamp_millis(midnight).map(|dt| UtcDay(dt.date_naive()))
    }

    pub fn parse(s: &str) -> Option<Self> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().map(UtcDay)
    }
}

impl fmt::Display for UtcDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}
