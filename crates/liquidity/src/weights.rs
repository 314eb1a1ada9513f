//! Весовые функции распределения ликвидности.
//!
//! Все функции возвращают нормированные веса (сумма = 1) длины `num_bins`,
//! индекс 0..num_bins-1, центр = (num_bins - 1) / 2.

use std::str::FromStr;

use crate::strategy::Strategy;

/// sigma для bid-ask (в бинах)
pub const BID_ASK_SIGMA: f64 = 1.0;

/// Доля от максимального крайнего веса, остающаяся в активном бине у bid-ask.
pub const DEFAULT_BID_ASK_EPSILON: f64 = 0.05;

/// Пресеты концентрации curve: sigma = num_bins / divisor.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Concentration {
    Low,
    #[default]
    Medium,
    High,
}

impl Concentration {
    pub fn curve_sigma_divisor(self) -> f64 {
        match self {
            Concentration::Low => 4.0,
            Concentration::Medium => 6.0,
            Concentration::High => 8.0,
        }
    }
}

impl FromStr for Concentration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Concentration::Low),
            "medium" | "mid" => Ok(Concentration::Medium),
            "high" => Ok(Concentration::High),
            other => Err(format!("unknown concentration: {}", other)),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WeightParams {
    pub concentration: Concentration,
    /// 0..=1, при 1 центр сравнивается с краями
    pub bid_ask_epsilon: f64,
}

impl Default for WeightParams {
    fn default() -> Self {
        Self {
            concentration: Concentration::Medium,
            bid_ask_epsilon: DEFAULT_BID_ASK_EPSILON,
        }
    }
}

/// Сумма Неймайера: один проход, без накопления ошибки округления.
pub fn stable_sum(values: impl IntoIterator<Item = f64>) -> f64 {
    let mut sum = 0.0_f64;
    let mut comp = 0.0_f64;
    for v in values {
        let t = sum + v;
        if sum.abs() >= v.abs() {
            comp += (sum - t) + v;
        } else {
            comp += (v - t) + sum;
        }
        sum = t;
    }
    sum + comp
}

fn center(num_bins: usize) -> f64 {
    (num_bins as f64 - 1.0) / 2.0
}

/// Нормировка на сумму. Вырожденная сумма → равномерные веса.
fn normalize(raw: Vec<f64>) -> Vec<f64> {
    let total = stable_sum(raw.iter().copied());
    if !(total.is_finite() && total > 0.0) {
        return spot_weights(raw.len());
    }
    raw.into_iter().map(|w| w / total).collect()
}

/// Spot: 1 / num_bins на каждый бин
pub fn spot_weights(num_bins: usize) -> Vec<f64> {
    if num_bins == 0 {
        return Vec::new();
    }
    vec![1.0 / num_bins as f64; num_bins]
}

/// Curve: гаусс exp(-0.5 * ((i - c) / sigma)^2), sigma = num_bins / divisor
pub fn curve_weights(num_bins: usize, concentration: Concentration) -> Vec<f64> {
    if num_bins == 0 {
        return Vec::new();
    }
    let c = center(num_bins);
    let sigma = num_bins as f64 / concentration.curve_sigma_divisor();
    let raw = (0..num_bins)
        .map(|i| {
            let z = (i as f64 - c) / sigma;
            (-0.5 * z * z).exp()
        })
        .collect();
    normalize(raw)
}

/// Bid-Ask: exp(distance / sigma) на краях, epsilon * exp(c / sigma) в центре.
///
/// Экспоненты сдвинуты на -c / sigma, иначе exp(c) переполняется уже при
/// ~700 бинах на сторону. После нормировки результат тот же.
pub fn bid_ask_weights(num_bins: usize, epsilon: f64) -> Vec<f64> {
    if num_bins == 0 {
        return Vec::new();
    }
    let c = center(num_bins);
    let eps = if epsilon.is_finite() { epsilon.clamp(0.0, 1.0) } else { 0.0 };
    let raw = (0..num_bins)
        .map(|i| {
            let distance = (i as f64 - c).abs();
            if distance == 0.0 {
                eps
            } else {
                ((distance - c) / BID_ASK_SIGMA).exp()
            }
        })
        .collect();
    normalize(raw)
}

pub fn weights_for(strategy: Strategy, num_bins: usize, params: WeightParams) -> Vec<f64> {
    match strategy {
        Strategy::Spot => spot_weights(num_bins),
        Strategy::Curve => curve_weights(num_bins, params.concentration),
        Strategy::BidAsk => bid_ask_weights(num_bins, params.bid_ask_epsilon),
    }
}
