pub mod activity;
pub mod efficiency;
pub mod fees;
pub mod volume;

#[cfg(test)]
mod test_support;

pub use efficiency::EfficiencyStats;
pub use fees::{FeeDistribution, FeeParams};
pub use volume::{DailyBinActivity, DayAttribution, VolumeAttribution};
