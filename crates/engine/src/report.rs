//! Плоские строки для CSV и JSON-отчёт прогона.

use std::collections::BTreeMap;

use serde::Serialize;

use liquidity::{PerStrategy, Strategy};

use crate::backtest::{BacktestReport, StrategyPerformance};
use crate::sweep::{BestPerformer, SweepResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationRow {
    pub strategy: Strategy,
    pub bin_id: i32,
    pub weight: f64,
    pub liquidity_x: f64,
    pub liquidity_y: f64,
    pub total_liquidity_usd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyActivityRow {
    pub date: String,
    pub bin_id: i32,
    pub snapshot_count: usize,
    pub proportion: f64,
    pub avg_liquidity_usd: f64,
    pub volume_usd: f64,
    pub fees_usd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyFeeRow {
    pub date: String,
    pub spot: f64,
    pub curve: f64,
    pub bid_ask: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepSummaryRow {
    pub liquidity_usd: f64,
    pub bin_range_percent: f64,
    pub period_days: u32,
    pub strategy: Strategy,
    pub snapshot_count: usize,
    pub missing_market_data_days: usize,
    pub time_in_range: f64,
    pub avg_utilization_when_active: f64,
    pub liquidity_efficiency: f64,
    pub peak_utilization: f64,
    pub utilization_stability: f64,
    pub fees_usd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowJson {
    pub start_ms: i64,
    pub end_ms: i64,
    pub snapshot_count: usize,
    pub active_bin_id: i32,
    pub current_price: f64,
    pub bin_step: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamsJson {
    pub total_liquidity_usd: f64,
    pub bin_range_percent: f64,
    pub period_days: u32,
    pub bid_ask_epsilon: f64,
    pub base_fee_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportJson {
    pub params: ParamsJson,
    pub window: WindowJson,
    pub time_in_range: PerStrategy<f64>,
    pub liquidity_efficiency: PerStrategy<f64>,
    /// bin_id → USD комиссий пула
    pub bin_wise_fees: BTreeMap<i32, f64>,
    pub strategy_wise_fees: PerStrategy<f64>,
    pub performance: PerStrategy<StrategyPerformance>,
    pub missing_market_data_days: Vec<String>,
}

impl ReportJson {
    pub fn from_report(r: &BacktestReport) -> Self {
        Self {
            params: ParamsJson {
                total_liquidity_usd: r.params.total_liquidity_usd,
                bin_range_percent: r.params.bin_range_percent,
                period_days: r.params.period_days,
                bid_ask_epsilon: r.params.weights.bid_ask_epsilon,
                base_fee_rate: r.params.fees.base_fee_rate.0,
            },
            window: WindowJson {
                start_ms: r.window_start.0,
                end_ms: r.window_end.0,
                snapshot_count: r.snapshot_count,
                active_bin_id: r.anchor.active_bin.0,
                current_price: r.anchor.price.0,
                bin_step: r.anchor.bin_step,
            },
            time_in_range: r.performance.map(|_, p| p.time_in_range),
            liquidity_efficiency: r.performance.map(|_, p| p.liquidity_efficiency),
            bin_wise_fees: r.fees.bin_wise_fees.iter().map(|(b, m)| (b.0, m.0)).collect(),
            strategy_wise_fees: r.fees.strategy_fees.map(|_, m| m.0),
            performance: r.performance.clone(),
            missing_market_data_days: r.missing_market_data_days.iter().map(|d| d.to_string()).collect(),
        }
    }
}

pub fn allocation_rows(r: &BacktestReport) -> Vec<AllocationRow> {
    r.allocations
        .iter()
        .flat_map(|(strategy, a)| {
            a.bins.iter().map(move |b| AllocationRow {
                strategy,
                bin_id: b.bin_id.0,
                weight: b.weight.0,
                liquidity_x: b.liquidity_x.0,
                liquidity_y: b.liquidity_y.0,
                total_liquidity_usd: b.total_liquidity_usd.0,
            })
        })
        .collect()
}

pub fn daily_activity_rows(r: &BacktestReport) -> Vec<DailyActivityRow> {
    r.fees
        .days
        .iter()
        .flat_map(|d| d.bins.iter())
        .map(|b| DailyActivityRow {
            date: b.date.to_string(),
            bin_id: b.bin_id.0,
            snapshot_count: b.snapshot_count,
            proportion: b.proportion.0,
            avg_liquidity_usd: b.avg_liquidity_usd.0,
            volume_usd: b.volume_usd.0,
            fees_usd: b.fees_usd.0,
        })
        .collect()
}

pub fn daily_fee_rows(r: &BacktestReport) -> Vec<DailyFeeRow> {
    r.fees
        .daily_strategy_fees
        .iter()
        .map(|d| DailyFeeRow {
            date: d.date.to_string(),
            spot: d.fees.spot.0,
            curve: d.fees.curve.0,
            bid_ask: d.fees.bid_ask.0,
        })
        .collect()
}

/// По строке на (конфигурация, стратегия), в порядке свипа.
pub fn sweep_summary_rows(res: &SweepResult) -> Vec<SweepSummaryRow> {
    res.rows
        .iter()
        .flat_map(|row| {
            row.performance.iter().map(move |(strategy, p)| SweepSummaryRow {
                liquidity_usd: row.config.liquidity_usd,
                bin_range_percent: row.config.bin_range_percent,
                period_days: row.config.period_days,
                strategy,
                snapshot_count: row.snapshot_count,
                missing_market_data_days: row.missing_market_data_days,
                time_in_range: p.time_in_range,
                avg_utilization_when_active: p.avg_utilization_when_active,
                liquidity_efficiency: p.liquidity_efficiency,
                peak_utilization: p.peak_utilization,
                utilization_stability: p.utilization_stability,
                fees_usd: p.fees_usd,
            })
        })
        .collect()
}

/// `strategy=curve liquidity=1000.00 range=5.00 period=30 value=0.1234`
pub fn describe_best(best: &BestPerformer) -> String {
    format!(
        "strategy={} liquidity={:.2} range={:.2} period={} value={:.6}",
        best.strategy,
        best.config.liquidity_usd,
        best.config.bin_range_percent,
        best.config.period_days,
        best.value
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::{RunParams, run_backtest};
    use crate::test_support::{candles_for_days, history};
    use analytics::FeeParams;
    use liquidity::WeightParams;

    fn report() -> BacktestReport {
        let snaps = history(&[100, 100, 101, 101], 2);
        let candles = candles_for_days(&snaps, 0.40, 0.42, 100_000.0);
        run_backtest(
            &snaps,
            &candles,
            RunParams {
                total_liquidity_usd: 1000.0,
                bin_range_percent: 1.0,
                period_days: 0,
                weights: WeightParams::default(),
                fees: FeeParams::default(),
            },
        )
        .unwrap()
    }

    #[test]
    fn allocation_rows_cover_every_strategy_bin() {
        let r = report();
        let rows = allocation_rows(&r);
        assert_eq!(rows.len(), 9);
        let spot_usd: f64 = rows
            .iter()
            .filter(|row| row.strategy == Strategy::Spot)
            .map(|row| row.total_liquidity_usd)
            .sum();
        assert!((spot_usd - 1000.0).abs() < 1e-6);
    }

    #[test]
    fn json_report_uses_collector_keys() {
        let r = report();
        let v = serde_json::to_value(ReportJson::from_report(&r)).unwrap();
        assert!(v["timeInRange"]["bidAsk"].is_number());
        assert!(v["strategyWiseFees"]["spot"].as_f64().unwrap() > 0.0);
        assert!(v["binWiseFees"]["100"].is_number());
        assert_eq!(v["missingMarketDataDays"].as_array().unwrap().len(), 0);
        assert_eq!(v["window"]["snapshot_count"], 4);
    }

    #[test]
    fn daily_rows_match_fee_totals() {
        let r = report();
        let total: f64 = daily_activity_rows(&r).iter().map(|row| row.fees_usd).sum();
        assert!((total - 656.0).abs() < 1e-6);
        let days = daily_fee_rows(&r);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, "2024-01-01");
    }
}
