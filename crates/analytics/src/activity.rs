use liquidity::{PerStrategy, StrategyAllocation};
use market::Snapshot;

/// Был ли активный бин снапшота внутри фиксированного набора бинов стратегии.
/// Длина результата = длине снапшотов.
pub fn track_activity(allocation: &StrategyAllocation, snapshots: &[Snapshot]) -> Vec<bool> {
    snapshots
        .iter()
        .map(|s| allocation.contains(s.active_bin()))
        .collect()
}

pub fn track_all(
    allocations: &PerStrategy<StrategyAllocation>,
    snapshots: &[Snapshot],
) -> PerStrategy<Vec<bool>> {
    allocations.map(|_, a| track_activity(a, snapshots))
}
