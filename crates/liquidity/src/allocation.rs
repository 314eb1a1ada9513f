use core_types::types::{BinId, Money, Price, Qty, Ratio};

use crate::bins::resolve_bin_range;
use crate::error::AllocationError;
use crate::strategy::{PerStrategy, Strategy};
use crate::weights::{WeightParams, weights_for};

/// Позиция стратегии в одном бине
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Allocation {
    pub bin_id: BinId,
    /// base-токен (X)
    pub liquidity_x: Qty,
    /// quote-токен (Y)
    pub liquidity_y: Qty,
    pub total_liquidity_usd: Money,
    pub weight: Ratio,
}

/// Точка привязки: пул в момент первого снапшота окна
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PoolAnchor {
    pub active_bin: BinId,
    pub price: Price,
    /// bps
    pub bin_step: u16,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AllocationParams {
    pub total_liquidity: Money,
    /// ±% вокруг активного бина
    pub range_percent: f64,
    pub weights: WeightParams,
}

/// Статичная (без ребалансов) позиция одной стратегии.
/// Бины отсортированы по id и идут подряд.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyAllocation {
    pub strategy: Strategy,
    pub budget: Money,
    pub bins: Vec<Allocation>,
}

impl StrategyAllocation {
    pub fn get(&self, bin: BinId) -> Option<&Allocation> {
        self.bins
            .binary_search_by_key(&bin, |a| a.bin_id)
            .ok()
            .map(|i| &self.bins[i])
    }

    pub fn contains(&self, bin: BinId) -> bool {
        self.get(bin).is_some()
    }

    pub fn usd_at(&self, bin: BinId) -> Money {
        self.get(bin).map(|a| a.total_liquidity_usd).unwrap_or_default()
    }

    pub fn bin_ids(&self) -> impl Iterator<Item = BinId> + '_ {
        self.bins.iter().map(|a| a.bin_id)
    }

    pub fn total_usd(&self) -> Money {
        Money(crate::weights::stable_sum(
            self.bins.iter().map(|a| a.total_liquidity_usd.0),
        ))
    }
}

fn validate(anchor: PoolAnchor, params: AllocationParams) -> Result<(), AllocationError> {
    let budget = params.total_liquidity.0;
    if !(budget.is_finite() && budget > 0.0) {
        return Err(AllocationError::InvalidParameter {
            name: "total_liquidity_usd",
            value: budget,
        });
    }
    if !(anchor.price.0.is_finite() && anchor.price.0 > 0.0) {
        return Err(AllocationError::InvalidParameter {
            name: "current_price",
            value: anchor.price.0,
        });
    }
    if anchor.bin_step == 0 {
        return Err(AllocationError::InvalidParameter {
            name: "bin_step",
            value: 0.0,
        });
    }
    Ok(())
}

/// Разбиение USD бина на токены.
/// - активный бин: 50/50 по стоимости
/// - ниже активного (цена меньше): только quote
/// - выше активного: только base
pub fn split_tokens(bin: BinId, active: BinId, usd: Money, price: Price) -> (Qty, Qty) {
    match bin.cmp(&active) {
        std::cmp::Ordering::Equal => {
            let half = Money(usd.0 / 2.0);
            (half / price, Qty(half.0))
        }
        std::cmp::Ordering::Less => (Qty(0.0), Qty(usd.0)),
        std::cmp::Ordering::Greater => (usd / price, Qty(0.0)),
    }
}

/// Распределяет бюджет по бинам для одной стратегии.
pub fn allocate(
    strategy: Strategy,
    anchor: PoolAnchor,
    params: AllocationParams,
) -> Result<StrategyAllocation, AllocationError> {
    validate(anchor, params)?;

    let ids = resolve_bin_range(anchor.active_bin, params.range_percent, anchor.bin_step);
    let weights = weights_for(strategy, ids.len(), params.weights);

    let bins = ids
        .into_iter()
        .zip(weights)
        .map(|(bin_id, w)| {
            let usd = params.total_liquidity * Ratio(w);
            let (liquidity_x, liquidity_y) = split_tokens(bin_id, anchor.active_bin, usd, anchor.price);
            Allocation {
                bin_id,
                liquidity_x,
                liquidity_y,
                total_liquidity_usd: usd,
                weight: Ratio(w),
            }
        })
        .collect();

    Ok(StrategyAllocation {
        strategy,
        budget: params.total_liquidity,
        bins,
    })
}

/// Все три стратегии на одном якоре.
pub fn allocate_all(
    anchor: PoolAnchor,
    params: AllocationParams,
) -> Result<PerStrategy<StrategyAllocation>, AllocationError> {
    PerStrategy::try_from_fn(|s| allocate(s, anchor, params))
}
