pub mod allocation;
pub mod bins;
pub mod error;
pub mod strategy;
pub mod weights;

pub use allocation::{Allocation, AllocationParams, PoolAnchor, StrategyAllocation, allocate, allocate_all};
pub use error::AllocationError;
pub use strategy::{PerStrategy, Strategy};
pub use weights::{Concentration, WeightParams};
