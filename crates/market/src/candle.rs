use core_types::types::{Money, Price, Qty, TimestampMs};

use crate::day::{UtcDay, normalize_timestamp_ms};

/// Дневная OHLCV-свеча торговой пары пула.
/// volume в base-токене.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Candle {
    pub ts: TimestampMs,
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
    pub volume: Qty,
}

impl Candle {
    /// Сырой ряд `[timestamp, open, high, low, close, volume]`.
    /// timestamp может быть в секундах или миллисекундах.
    pub fn from_row(row: &[f64]) -> Option<Candle> {
        let [ts, open, high, low, close, volume] = row.get(..6)? else {
            return None;
        };
        if !ts.is_finite() {
            return None;
        }
        Some(Candle {
            ts: normalize_timestamp_ms(*ts as i64),
            open: Price(*open),
            high: Price(*high),
            low: Price(*low),
            close: Price(*close),
            volume: Qty(*volume),
        })
    }

    /// Средняя цена дня = (open + close) / 2
    pub fn mid(&self) -> Price {
        Price((self.open.0 + self.close.0) / 2.0)
    }

    /// Дневной объём в USD = mid * volume
    pub fn volume_usd(&self) -> Money {
        self.volume * self.mid()
    }

    pub fn day(&self) -> Option<UtcDay> {
        UtcDay::from_ts(self.ts)
    }
}
