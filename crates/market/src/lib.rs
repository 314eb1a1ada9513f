pub mod candle;
pub mod day;
pub mod snapshot;

pub use candle::Candle;
pub use day::UtcDay;
pub use snapshot::{BinReserve, Snapshot};
