//! Утилизация и эффективность статичной позиции.
//!
//! Утилизация снапшота = USD стратегии в текущем активном бине / весь бюджет.
//! Снапшоты вне диапазона дают 0 в overall_efficiency и не участвуют
//! в среднем/пике/разбросе.

use serde::Serialize;

use liquidity::{PerStrategy, StrategyAllocation};
use market::Snapshot;

#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize)]
pub struct EfficiencyStats {
    pub time_in_range: f64,
    pub avg_utilization_when_active: f64,
    /// sum(utilization) / все снапшоты
    pub overall_efficiency: f64,
    pub peak_utilization: f64,
    /// popul. std dev, 0 при < 2 активных
    pub utilization_stability: f64,
    pub active_snapshots: usize,
    pub total_snapshots: usize,
}

/// Some(utilization) для снапшотов в диапазоне, None вне его.
pub fn utilization_series(
    allocation: &StrategyAllocation,
    snapshots: &[Snapshot],
    activity: &[bool],
) -> Vec<Option<f64>> {
    let budget = allocation.budget.0;
    snapshots
        .iter()
        .zip(activity)
        .map(|(s, &active)| {
            if !active || budget <= 0.0 {
                return active.then_some(0.0);
            }
            Some(allocation.usd_at(s.active_bin()).0 / budget)
        })
        .collect()
}

pub fn efficiency_from_series(series: &[Option<f64>]) -> EfficiencyStats {
    let total = series.len();
    if total == 0 {
        return EfficiencyStats::default();
    }
    let active: Vec<f64> = series.iter().flatten().copied().collect();
    let n = active.len();
    if n == 0 {
        return EfficiencyStats {
            total_snapshots: total,
            ..EfficiencyStats::default()
        };
    }

    let sum: f64 = active.iter().sum();
    let mean = sum / n as f64;
    let peak = active.iter().copied().fold(0.0_f64, f64::max);
    let stability = if n < 2 {
        0.0
    } else {
        let var = active.iter().map(|u| (u - mean).powi(2)).sum::<f64>() / n as f64;
        var.sqrt()
    };

    EfficiencyStats {
        time_in_range: n as f64 / total as f64,
        avg_utilization_when_active: mean,
        overall_efficiency: sum / total as f64,
        peak_utilization: peak,
        utilization_stability: stability,
        active_snapshots: n,
        total_snapshots: total,
    }
}

pub fn efficiency(
    allocation: &StrategyAllocation,
    snapshots: &[Snapshot],
    activity: &[bool],
) -> EfficiencyStats {
    efficiency_from_series(&utilization_series(allocation, snapshots, activity))
}

pub fn efficiency_all(
    allocations: &PerStrategy<StrategyAllocation>,
    snapshots: &[Snapshot],
    activity: &PerStrategy<Vec<bool>>,
) -> PerStrategy<EfficiencyStats> {
    allocations.map(|s, a| efficiency(a, snapshots, activity.get(s)))
}

/// Те же агрегаты на префиксе 0..=k (для "живого" отображения).
pub fn progressive_efficiency(series: &[Option<f64>], k: usize) -> EfficiencyStats {
    let end = k.saturating_add(1).min(series.len());
    efficiency_from_series(&series[..end])
}

/// Весь прогрессивный ряд за один проход (Welford для разброса).
pub fn progressive_series(series: &[Option<f64>]) -> Vec<EfficiencyStats> {
    let mut out = Vec::with_capacity(series.len());
    let mut n = 0usize;
    let mut sum = 0.0_f64;
    let mut mean = 0.0_f64;
    let mut m2 = 0.0_f64;
    let mut peak = 0.0_f64;

    for (i, u) in series.iter().enumerate() {
        if let Some(u) = *u {
            n += 1;
            sum += u;
            let delta = u - mean;
            mean += delta / n as f64;
            m2 += delta * (u - mean);
            peak = peak.max(u);
        }
        let total = i + 1;
        out.push(if n == 0 {
            EfficiencyStats {
                total_snapshots: total,
                ..EfficiencyStats::default()
            }
        } else {
            EfficiencyStats {
                time_in_range: n as f64 / total as f64,
                avg_utilization_when_active: mean,
                overall_efficiency: sum / total as f64,
                peak_utilization: peak,
                utilization_stability: if n < 2 { 0.0 } else { (m2 / n as f64).max(0.0).sqrt() },
                active_snapshots: n,
                total_snapshots: total,
            }
        });
    }
    out
}
