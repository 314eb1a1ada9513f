//! Один прогон бэктеста: аллокация (один раз) → активность → эффективность
//! → дневной объём → комиссии.

use serde::Serialize;
use tracing::debug;

use analytics::activity::track_all;
use analytics::efficiency::efficiency_all;
use analytics::fees::distribute_fees;
use analytics::volume::attribute_daily_volume;
use analytics::{EfficiencyStats, FeeDistribution, FeeParams};
use core_types::types::{Money, TimestampMs};
use liquidity::{AllocationParams, PerStrategy, PoolAnchor, StrategyAllocation, WeightParams, allocate_all};
use market::snapshot::period_slice;
use market::{Candle, Snapshot, UtcDay};

use crate::error::BacktestError;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RunParams {
    pub total_liquidity_usd: f64,
    pub bin_range_percent: f64,
    /// 0 = вся история
    pub period_days: u32,
    pub weights: WeightParams,
    pub fees: FeeParams,
}

/// Итог стратегии за окно
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize)]
pub struct StrategyPerformance {
    pub time_in_range: f64,
    pub avg_utilization_when_active: f64,
    pub liquidity_efficiency: f64,
    pub peak_utilization: f64,
    pub utilization_stability: f64,
    pub fees_usd: f64,
}

impl StrategyPerformance {
    pub fn new(eff: &EfficiencyStats, fees: Money) -> Self {
        Self {
            time_in_range: eff.time_in_range,
            avg_utilization_when_active: eff.avg_utilization_when_active,
            liquidity_efficiency: eff.overall_efficiency,
            peak_utilization: eff.peak_utilization,
            utilization_stability: eff.utilization_stability,
            fees_usd: fees.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestReport {
    pub params: RunParams,
    pub window_start: TimestampMs,
    pub window_end: TimestampMs,
    pub snapshot_count: usize,
    pub anchor: PoolAnchor,
    pub allocations: PerStrategy<StrategyAllocation>,
    pub efficiency: PerStrategy<EfficiencyStats>,
    pub fees: FeeDistribution,
    pub performance: PerStrategy<StrategyPerformance>,
    /// дни без свечи: комиссии за них не считались
    pub missing_market_data_days: Vec<UtcDay>,
}

pub fn anchor_of(snapshot: &Snapshot) -> PoolAnchor {
    PoolAnchor {
        active_bin: snapshot.active_bin(),
        price: snapshot.price(),
        bin_step: snapshot.bin_step,
    }
}

/// Границы окна периода по отсортированным снапшотам.
pub fn window_bounds(snapshots: &[Snapshot], period_days: u32) -> Option<(TimestampMs, TimestampMs)> {
    let window = period_slice(snapshots, period_days);
    Some((window.first()?.ts(), window.last()?.ts()))
}

/// Прогон на уже вырезанном окне.
pub fn run_window(
    window: &[Snapshot],
    candles: &[Candle],
    params: RunParams,
) -> Result<BacktestReport, BacktestError> {
    let (Some(first), Some(last)) = (window.first(), window.last()) else {
        return Err(BacktestError::EmptyWindow {
            period_days: params.period_days,
        });
    };

    let anchor = anchor_of(first);
    let allocations = allocate_all(
        anchor,
        AllocationParams {
            total_liquidity: Money(params.total_liquidity_usd),
            range_percent: params.bin_range_percent,
            weights: params.weights,
        },
    )?;

    let activity = track_all(&allocations, window);
    let efficiency = efficiency_all(&allocations, window, &activity);

    let volume = attribute_daily_volume(window, candles);
    let fees = distribute_fees(&volume, &allocations, params.fees);

    let performance = efficiency.map(|s, eff| StrategyPerformance::new(eff, *fees.strategy_fees.get(s)));

    debug!(
        snapshots = window.len(),
        bins = allocations.spot.bins.len(),
        days = fees.days.len(),
        missing_days = volume.missing_days.len(),
        "backtest window done"
    );

    Ok(BacktestReport {
        params,
        window_start: first.ts(),
        window_end: last.ts(),
        snapshot_count: window.len(),
        anchor,
        allocations,
        efficiency,
        fees,
        performance,
        missing_market_data_days: volume.missing_days,
    })
}

/// Полный прогон: вырезает окно period_days и считает его.
pub fn run_backtest(
    snapshots: &[Snapshot],
    candles: &[Candle],
    params: RunParams,
) -> Result<BacktestReport, BacktestError> {
    run_window(period_slice(snapshots, params.period_days), candles, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{DAY, candles_for_days, history};
    use liquidity::AllocationError;

    fn params(period_days: u32) -> RunParams {
        RunParams {
            total_liquidity_usd: 1000.0,
            bin_range_percent: 1.0,
            period_days,
            weights: WeightParams::default(),
            fees: FeeParams::default(),
        }
    }

    #[test]
    fn allocation_is_anchored_on_first_window_snapshot() {
        let snaps = history(&[100, 100, 101, 102, 103, 103, 104, 104], 4);
        // окно 1 день → только последние снапшоты
        let rep = run_backtest(&snaps, &[], params(1)).unwrap();
        assert_eq!(rep.anchor.active_bin.0, rep.allocations.spot.bins[1].bin_id.0);
        assert!(rep.snapshot_count < snaps.len());
        assert_eq!(rep.window_end, snaps.last().unwrap().ts());
    }

    #[test]
    fn time_in_range_matches_counts() {
        let snaps = history(&[100, 101, 102, 99, 100, 150], 6);
        let rep = run_backtest(&snaps, &[], params(0)).unwrap();
        // бины 99..=101: в диапазоне 4 из 6
        assert!((rep.performance.spot.time_in_range - 4.0 / 6.0).abs() < 1e-12);
        assert_eq!(rep.performance.spot.time_in_range, rep.performance.curve.time_in_range);
    }

    #[test]
    fn missing_candles_zero_fees_but_keep_efficiency() {
        let snaps = history(&[100, 100, 101, 101], 2);
        let rep = run_backtest(&snaps, &[], params(0)).unwrap();
        for (_, p) in rep.performance.iter() {
            assert_eq!(p.fees_usd, 0.0);
            assert!(p.time_in_range > 0.0);
        }
        assert_eq!(rep.missing_market_data_days.len(), 2);
    }

    #[test]
    fn fees_flow_to_strategies_with_candles() {
        let snaps = history(&[100, 100, 101, 101], 2);
        let candles = candles_for_days(&snaps, 0.40, 0.42, 100_000.0);
        let rep = run_backtest(&snaps, &candles, params(0)).unwrap();
        assert!(rep.missing_market_data_days.is_empty());
        assert!(rep.performance.spot.fees_usd > 0.0);
        // 2 дня по 328 USD на пул
        let pool: f64 = rep.fees.bin_wise_fees.values().map(|m| m.0).sum();
        assert!((pool - 656.0).abs() < 1e-6);
    }

    #[test]
    fn empty_window_is_an_error() {
        assert_eq!(
            run_backtest(&[], &[], params(7)).unwrap_err(),
            BacktestError::EmptyWindow { period_days: 7 }
        );
    }

    #[test]
    fn invalid_budget_surfaces_allocation_error() {
        let snaps = history(&[100], 1);
        let mut p = params(0);
        p.total_liquidity_usd = -5.0;
        assert!(matches!(
            run_backtest(&snaps, &[], p),
            Err(BacktestError::Allocation(AllocationError::InvalidParameter { .. }))
        ));
    }

    #[test]
    fn rerun_is_identical() {
        let snaps = history(&[100, 101, 99, 100, 102, 98, 100], 3);
        let candles = candles_for_days(&snaps, 1.0, 1.1, 5000.0);
        let a = run_backtest(&snaps, &candles, params(0)).unwrap();
        let b = run_backtest(&snaps, &candles, params(0)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn window_bounds_follow_period() {
        let snaps = history(&[1, 2, 3, 4], 4);
        let (start, end) = window_bounds(&snaps, 1).unwrap();
        assert!(end.0 - start.0 <= DAY);
        assert!(window_bounds(&[], 1).is_none());
    }
}
