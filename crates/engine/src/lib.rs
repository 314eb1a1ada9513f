pub mod backtest;
pub mod error;
pub mod io;
pub mod report;
pub mod sweep;

#[cfg(test)]
mod test_support;

pub use backtest::{BacktestReport, RunParams, StrategyPerformance, run_backtest};
pub use error::BacktestError;
pub use sweep::{SweepComparator, SweepConfig, SweepGrid, SweepInput, SweepResult};
