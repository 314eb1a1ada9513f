//! Свип по матрице (ликвидность × диапазон × период).
//!
//! Строки независимы и считаются параллельно (rayon), порядок результата
//! совпадает с порядком конфигураций. Упавшая строка выкидывается из
//! таблицы, свип всё равно доходит до Done.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use analytics::FeeParams;
use liquidity::{PerStrategy, Strategy, WeightParams};
use market::snapshot::period_slice;
use market::{Candle, Snapshot};
use state_machine::{SweepCause, SweepState, TransitionError, transition};

use crate::backtest::{RunParams, StrategyPerformance, run_window};
use crate::error::BacktestError;

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct SweepConfig {
    pub liquidity_usd: f64,
    pub bin_range_percent: f64,
    pub period_days: u32,
}

/// Оси матрицы
#[derive(Debug, Clone, PartialEq)]
pub struct SweepGrid {
    pub liquidity_usd: Vec<f64>,
    pub bin_range_percent: Vec<f64>,
    pub period_days: Vec<u32>,
}

impl SweepGrid {
    /// Декартово произведение; порядок: ликвидность, диапазон, период.
    pub fn configs(&self) -> Vec<SweepConfig> {
        let mut out = Vec::with_capacity(
            self.liquidity_usd.len() * self.bin_range_percent.len() * self.period_days.len(),
        );
        for &liquidity_usd in &self.liquidity_usd {
            for &bin_range_percent in &self.bin_range_percent {
                for &period_days in &self.period_days {
                    out.push(SweepConfig {
                        liquidity_usd,
                        bin_range_percent,
                        period_days,
                    });
                }
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepRow {
    pub config: SweepConfig,
    pub snapshot_count: usize,
    pub missing_market_data_days: usize,
    pub performance: PerStrategy<StrategyPerformance>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestPerformer {
    pub strategy: Strategy,
    pub config: SweepConfig,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FailedRow {
    pub config: SweepConfig,
    pub error: BacktestError,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepResult {
    pub rows: Vec<SweepRow>,
    pub failed: Vec<FailedRow>,
    pub best_efficiency: Option<BestPerformer>,
    pub best_fees: Option<BestPerformer>,
}

/// Вход свипа. Свечи загружены заранее (это I/O), по периоду.
pub struct SweepInput<'a> {
    pub snapshots: &'a [Snapshot],
    pub candles_by_period: &'a BTreeMap<u32, Vec<Candle>>,
    pub weights: WeightParams,
    pub fees: FeeParams,
}

pub fn run_row(input: &SweepInput<'_>, config: SweepConfig) -> Result<SweepRow, BacktestError> {
    let candles = input
        .candles_by_period
        .get(&config.period_days)
        .ok_or(BacktestError::MissingCandles {
            period_days: config.period_days,
        })?;
    let window = period_slice(input.snapshots, config.period_days);
    let report = run_window(
        window,
        candles,
        RunParams {
            total_liquidity_usd: config.liquidity_usd,
            bin_range_percent: config.bin_range_percent,
            period_days: config.period_days,
            weights: input.weights,
            fees: input.fees,
        },
    )?;
    Ok(SweepRow {
        config,
        snapshot_count: report.snapshot_count,
        missing_market_data_days: report.missing_market_data_days.len(),
        performance: report.performance,
    })
}

/// Линейный проход; при равенстве остаётся первый встреченный.
pub fn best_by(rows: &[SweepRow], metric: impl Fn(&StrategyPerformance) -> f64) -> Option<BestPerformer> {
    let mut best: Option<BestPerformer> = None;
    for row in rows {
        for (strategy, perf) in row.performance.iter() {
            let value = metric(perf);
            if value.is_nan() {
                continue;
            }
            if best.as_ref().is_none_or(|b| value > b.value) {
                best = Some(BestPerformer {
                    strategy,
                    config: row.config,
                    value,
                });
            }
        }
    }
    best
}

#[derive(Debug)]
pub struct SweepComparator {
    state: SweepState,
}

impl Default for SweepComparator {
    fn default() -> Self {
        Self::new()
    }
}

impl SweepComparator {
    pub fn new() -> Self {
        Self {
            state: SweepState::Idle,
        }
    }

    pub fn state(&self) -> SweepState {
        self.state
    }

    /// Done → Idle, чтобы прогнать ещё раз
    pub fn reset(&mut self) -> Result<(), TransitionError> {
        self.state = transition(self.state, SweepCause::Reset)?;
        Ok(())
    }

    pub fn run(&mut self, grid: &SweepGrid, input: &SweepInput<'_>) -> Result<SweepResult, TransitionError> {
        self.state = transition(self.state, SweepCause::Started)?;

        let configs = grid.configs();
        info!(configs = configs.len(), "sweep started");

        let outcomes: Vec<(SweepConfig, Result<SweepRow, BacktestError>)> = configs
            .par_iter()
            .map(|&cfg| (cfg, run_row(input, cfg)))
            .collect();

        let (rows, failed) = outcomes.into_iter().fold(
            (Vec::new(), Vec::new()),
            |(mut rows, mut failed), (config, outcome)| {
                match outcome {
                    Ok(row) => rows.push(row),
                    Err(error) => {
                        warn!(?config, %error, "sweep row dropped");
                        failed.push(FailedRow { config, error });
                    }
                }
                (rows, failed)
            },
        );

        let best_efficiency = best_by(&rows, |p| p.liquidity_efficiency);
        let best_fees = best_by(&rows, |p| p.fees_usd);

        self.state = transition(self.state, SweepCause::RowsFinished)?;
        info!(ok = rows.len(), failed = failed.len(), "sweep done");

        Ok(SweepResult {
            rows,
            failed,
            best_efficiency,
            best_fees,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{candles_for_days, history};

    fn grid() -> SweepGrid {
        SweepGrid {
            liquidity_usd: vec![1000.0, 5000.0],
            bin_range_percent: vec![1.0, 5.0],
            period_days: vec![1, 3],
        }
    }

    #[test]
    fn configs_are_full_cartesian_product_in_order() {
        let cfgs = grid().configs();
        assert_eq!(cfgs.len(), 8);
        assert_eq!(
            cfgs[0],
            SweepConfig { liquidity_usd: 1000.0, bin_range_percent: 1.0, period_days: 1 }
        );
        assert_eq!(cfgs[1].period_days, 3);
        assert_eq!(cfgs[2].bin_range_percent, 5.0);
        assert_eq!(cfgs[4].liquidity_usd, 5000.0);
    }

    #[test]
    fn sweep_goes_idle_running_done() {
        let snaps = history(&[100, 101, 100, 102, 99, 100], 3);
        let candles = candles_for_days(&snaps, 1.0, 1.0, 10_000.0);
        let by_period = BTreeMap::from([(1, candles.clone()), (3, candles)]);
        let input = SweepInput {
            snapshots: &snaps,
            candles_by_period: &by_period,
            weights: WeightParams::default(),
            fees: FeeParams::default(),
        };

        let mut cmp = SweepComparator::new();
        assert_eq!(cmp.state(), SweepState::Idle);
        let res = cmp.run(&grid(), &input).unwrap();
        assert_eq!(cmp.state(), SweepState::Done);
        assert_eq!(res.rows.len(), 8);
        assert!(res.failed.is_empty());
        assert!(res.best_efficiency.is_some());
        assert!(res.best_fees.is_some());

        // второй запуск без reset запрещён
        assert!(cmp.run(&grid(), &input).is_err());
        cmp.reset().unwrap();
        assert_eq!(cmp.run(&grid(), &input).unwrap(), res);
    }

    #[test]
    fn failing_rows_are_dropped_not_fatal() {
        let snaps = history(&[100, 101, 100], 3);
        let candles = candles_for_days(&snaps, 1.0, 1.0, 10_000.0);
        // для периода 3 свечей нет
        let by_period = BTreeMap::from([(1, candles)]);
        let input = SweepInput {
            snapshots: &snaps,
            candles_by_period: &by_period,
            weights: WeightParams::default(),
            fees: FeeParams::default(),
        };
        let g = SweepGrid {
            liquidity_usd: vec![0.0, 1000.0],
            bin_range_percent: vec![1.0],
            period_days: vec![1, 3],
        };

        let res = SweepComparator::new().run(&g, &input).unwrap();
        assert_eq!(res.rows.len(), 1);
        assert_eq!(res.rows[0].config.liquidity_usd, 1000.0);
        assert_eq!(res.failed.len(), 3);
        assert!(res.failed.iter().any(|f| f.error == BacktestError::MissingCandles { period_days: 3 }));
    }

    #[test]
    fn ties_keep_first_seen() {
        let row = |liq: f64| SweepRow {
            config: SweepConfig { liquidity_usd: liq, bin_range_percent: 1.0, period_days: 1 },
            snapshot_count: 1,
            missing_market_data_days: 0,
            performance: PerStrategy::from_fn(|_| StrategyPerformance {
                liquidity_efficiency: 0.5,
                ..StrategyPerformance::default()
            }),
        };
        let rows = vec![row(1.0), row(2.0)];
        let best = best_by(&rows, |p| p.liquidity_efficiency).unwrap();
        assert_eq!(best.strategy, Strategy::Spot);
        assert_eq!(best.config.liquidity_usd, 1.0);
        assert!(best_by(&[], |p| p.fees_usd).is_none());
    }

    #[test]
    fn best_picks_the_maximum() {
        let mk = |eff: [f64; 3]| SweepRow {
            config: SweepConfig { liquidity_usd: eff[0], bin_range_percent: 1.0, period_days: 1 },
            snapshot_count: 1,
            missing_market_data_days: 0,
            performance: PerStrategy {
                spot: StrategyPerformance { fees_usd: eff[0], ..Default::default() },
                curve: StrategyPerformance { fees_usd: eff[1], ..Default::default() },
                bid_ask: StrategyPerformance { fees_usd: eff[2], ..Default::default() },
            },
        };
        let rows = vec![mk([1.0, 2.0, 3.0]), mk([2.0, 9.0, 4.0])];
        let best = best_by(&rows, |p| p.fees_usd).unwrap();
        assert_eq!(best.strategy, Strategy::Curve);
        assert_eq!(best.value, 9.0);
        assert_eq!(best.config.liquidity_usd, 2.0);
    }
}
