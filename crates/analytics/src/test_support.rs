//! Общие фикстуры для тестов analytics.

use core_types::types::{BinId, Money, Price, Qty, TimestampMs};
use liquidity::{AllocationParams, PerStrategy, PoolAnchor, StrategyAllocation, WeightParams, allocate_all};
use market::snapshot::NumOrStr;
use market::{BinReserve, Candle, Snapshot};

/// 2024-01-01T00:00:00Z
pub const DAY0: i64 = 1_704_067_200_000;
pub const HOUR: i64 = 3_600_000;

/// Снапшот на DAY0 + hour часов, без резервов.
pub fn snap(hour: i64, active: i32) -> Snapshot {
    snap_with_bins(DAY0 + hour * HOUR, active, &[])
}

/// bins: (bin_id, x, y, price), decimals = 0
pub fn snap_with_bins(ts: i64, active: i32, bins: &[(i32, f64, f64, f64)]) -> Snapshot {
    Snapshot {
        timestamp: ts,
        active_bin_id: active,
        bin_step: 100,
        protocol_fee: 2000.0,
        current_price: NumOrStr::Num(2.0),
        decimals_x: 0,
        decimals_y: 0,
        bin_data: bins
            .iter()
            .map(|(id, x, y, p)| BinReserve {
                bin_id: *id,
                liquidity_x: NumOrStr::Str(x.to_string()),
                liquidity_y: NumOrStr::Str(y.to_string()),
                price: NumOrStr::Num(*p),
            })
            .collect(),
    }
}

pub fn candle(ts: i64, open: f64, close: f64, volume: f64) -> Candle {
    Candle {
        ts: TimestampMs(ts),
        open: Price(open),
        high: Price(open.max(close)),
        low: Price(open.min(close)),
        close: Price(close),
        volume: Qty(volume),
    }
}

/// Все три стратегии вокруг бина 100, bin_step 100, цена 2.0
pub fn allocations(usd: f64, range_percent: f64) -> PerStrategy<StrategyAllocation> {
    allocate_all(
        PoolAnchor {
            active_bin: BinId(100),
            price: Price(2.0),
            bin_step: 100,
        },
        AllocationParams {
            total_liquidity: Money(usd),
            range_percent,
            weights: WeightParams::default(),
        },
    )
    .unwrap()
}
