//! Синтетическая история пула для тестов engine.

use core_types::types::{MS_PER_DAY, Price, Qty, TimestampMs};
use market::snapshot::NumOrStr;
use market::{BinReserve, Candle, Snapshot};

/// 2024-01-01T00:00:00Z
pub const DAY0: i64 = 1_704_067_200_000;
pub const DAY: i64 = MS_PER_DAY;
const HOUR: i64 = 3_600_000;

/// Снапшоты по активным бинам, разложенные поровну на `days` UTC-дней
/// (по часу между снапшотами внутри дня).
pub fn history(actives: &[i32], days: usize) -> Vec<Snapshot> {
    let per_day = actives.len().div_ceil(days.max(1)).max(1);
    actives
        .iter()
        .enumerate()
        .map(|(i, &active)| {
            let ts = DAY0 + (i / per_day) as i64 * DAY + (i % per_day) as i64 * HOUR;
            Snapshot {
                timestamp: ts,
                active_bin_id: active,
                bin_step: 100,
                protocol_fee: 2000.0,
                current_price: NumOrStr::Num(2.0),
                decimals_x: 0,
                decimals_y: 0,
                bin_data: vec![BinReserve {
                    bin_id: active,
                    liquidity_x: NumOrStr::Num(1000.0),
                    liquidity_y: NumOrStr::Num(1000.0),
                    price: NumOrStr::Num(2.0),
                }],
            }
        })
        .collect()
}

/// По одной дневной свече на каждый день, где есть снапшоты.
pub fn candles_for_days(snapshots: &[Snapshot], open: f64, close: f64, volume: f64) -> Vec<Candle> {
    let mut days: Vec<i64> = snapshots.iter().map(|s| s.ts().day_index()).collect();
    days.dedup();
    days.into_iter()
        .map(|d| Candle {
            ts: TimestampMs(d * DAY),
            open: Price(open),
            high: Price(open.max(close)),
            low: Price(open.min(close)),
            close: Price(close),
            volume: Qty(volume),
        })
        .collect()
}
