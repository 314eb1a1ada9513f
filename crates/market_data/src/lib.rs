pub mod rest;

pub use rest::{KlineRest, download_daily_range};
