//! Распределение комиссий: день → бин → стратегия.
//!
//! bin_fees = bin_volume * base_fee_rate * lp_share
//! доля стратегии = её USD в бине / средняя USD-ликвидность бина за день (<= 1)

use std::collections::BTreeMap;

use core_types::types::{BinId, Bps, Money, Ratio};
use liquidity::{PerStrategy, Strategy, StrategyAllocation};
use market::UtcDay;

use crate::volume::{DailyBinActivity, DayAttribution, VolumeAttribution};

/// Базовая ставка комиссии пула (1%)
pub const BASE_FEE_RATE: f64 = 0.01;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FeeParams {
    pub base_fee_rate: Ratio,
}

impl Default for FeeParams {
    fn default() -> Self {
        Self {
            base_fee_rate: Ratio(BASE_FEE_RATE),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyStrategyFees {
    pub date: UtcDay,
    pub fees: PerStrategy<Money>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeeDistribution {
    /// дни с заполненным fees_usd по бинам
    pub days: Vec<DayAttribution>,
    /// комиссии пула по бину за всё окно
    pub bin_wise_fees: BTreeMap<BinId, Money>,
    pub daily_strategy_fees: Vec<DailyStrategyFees>,
    pub strategy_fees: PerStrategy<Money>,
}

/// LP share = 1 - protocol_fee / 10000
pub fn lp_share(protocol_fee: Bps) -> Ratio {
    protocol_fee.as_ratio().complement().clamp_01()
}

pub fn bin_fees(volume: Money, protocol_fee: Bps, params: FeeParams) -> Money {
    volume * params.base_fee_rate * lp_share(protocol_fee)
}

/// Доля стратегии в бине. Оценка средней ликвидности шумная,
/// поэтому доля режется сверху единицей.
pub fn share_of_bin(strategy_usd: Money, pool_avg_usd: Money) -> Ratio {
    if strategy_usd.0 <= 0.0 {
        return Ratio(0.0);
    }
    if pool_avg_usd.0 <= 0.0 {
        return Ratio(1.0);
    }
    Ratio((strategy_usd.0 / pool_avg_usd.0).min(1.0))
}

fn strategy_day_fees(bins: &[DailyBinActivity], allocation: &StrategyAllocation) -> Money {
    bins.iter()
        .filter_map(|b| {
            let a = allocation.get(b.bin_id)?;
            Some(b.fees_usd * share_of_bin(a.total_liquidity_usd, b.avg_liquidity_usd))
        })
        .fold(Money(0.0), |acc, f| acc + f)
}

fn with_bin_fees(day: &DayAttribution, params: FeeParams) -> DayAttribution {
    let bins = day
        .bins
        .iter()
        .map(|b| DailyBinActivity {
            fees_usd: bin_fees(b.volume_usd, day.protocol_fee, params),
            ..*b
        })
        .collect();
    DayAttribution {
        bins,
        ..day.clone()
    }
}

pub fn distribute_fees(
    attribution: &VolumeAttribution,
    allocations: &PerStrategy<StrategyAllocation>,
    params: FeeParams,
) -> FeeDistribution {
    let days: Vec<DayAttribution> = attribution
        .days
        .iter()
        .map(|d| with_bin_fees(d, params))
        .collect();

    let bin_wise_fees = days
        .iter()
        .flat_map(|d| d.bins.iter())
        .fold(BTreeMap::new(), |mut acc, b| {
            *acc.entry(b.bin_id).or_insert(Money(0.0)) += b.fees_usd;
            acc
        });

    let daily_strategy_fees: Vec<DailyStrategyFees> = days
        .iter()
        .map(|d| DailyStrategyFees {
            date: d.date,
            fees: allocations.map(|_, a| strategy_day_fees(&d.bins, a)),
        })
        .collect();

    let strategy_fees = PerStrategy::from_fn(|s: Strategy| {
        daily_strategy_fees
            .iter()
            .fold(Money(0.0), |acc, d| acc + *d.fees.get(s))
    });

    FeeDistribution {
        days,
        bin_wise_fees,
        daily_strategy_fees,
        strategy_fees,
    }
}
