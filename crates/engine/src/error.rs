use thiserror::Error;

use liquidity::AllocationError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum BacktestError {
    #[error(transparent)]
    Allocation(#[from] AllocationError),

    /// нет снапшотов в окне, не от чего строить аллокацию
    #[error("no snapshots in a {period_days}-day window")]
    EmptyWindow { period_days: u32 },

    /// рынок для периода так и не загрузился
    #[error("no OHLCV candles loaded for the {period_days}-day period")]
    MissingCandles { period_days: u32 },
}
