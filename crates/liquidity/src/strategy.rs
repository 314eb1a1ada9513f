use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Форма распределения ликвидности по бинам
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Strategy {
    /// равномерно
    Spot,
    /// колокол вокруг активного бина
    Curve,
    /// перевёрнутый колокол: максимум на краях
    BidAsk,
}

impl Strategy {
    /// Порядок важен: при равенстве в рейтинге побеждает первый.
    pub const ALL: [Strategy; 3] = [Strategy::Spot, Strategy::Curve, Strategy::BidAsk];

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Spot => "spot",
            Strategy::Curve => "curve",
            Strategy::BidAsk => "bid_ask",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spot" => Ok(Strategy::Spot),
            "curve" => Ok(Strategy::Curve),
            "bid_ask" | "bidask" | "bid-ask" => Ok(Strategy::BidAsk),
            other => Err(format!("unknown strategy: {}", other)),
        }
    }
}

/// Значение на каждую стратегию (spot / curve / bidAsk).
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerStrategy<T> {
    pub spot: T,
    pub curve: T,
    pub bid_ask: T,
}

impl<T> PerStrategy<T> {
    pub fn from_fn(mut f: impl FnMut(Strategy) -> T) -> Self {
        Self {
            spot: f(Strategy::Spot),
            curve: f(Strategy::Curve),
            bid_ask: f(Strategy::BidAsk),
        }
    }

    pub fn try_from_fn<E>(mut f: impl FnMut(Strategy) -> Result<T, E>) -> Result<Self, E> {
        Ok(Self {
            spot: f(Strategy::Spot)?,
            curve: f(Strategy::Curve)?,
            bid_ask: f(Strategy::BidAsk)?,
        })
    }

    pub fn get(&self, s: Strategy) -> &T {
        match s {
            Strategy::Spot => &self.spot,
            Strategy::Curve => &self.curve,
            Strategy::BidAsk => &self.bid_ask,
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(Strategy, &T) -> U) -> PerStrategy<U> {
        PerStrategy::from_fn(|s| f(s, self.get(s)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Strategy, &T)> {
        Strategy::ALL.into_iter().map(move |s| (s, self.get(s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_aliases() {
        assert_eq!("bid-ask".parse::<Strategy>().unwrap(), Strategy::BidAsk);
        assert_eq!("Curve".parse::<Strategy>().unwrap(), Strategy::Curve);
        assert!("grid".parse::<Strategy>().is_err());
    }

    #[test]
    fn iter_follows_fixed_order() {
        let p = PerStrategy::from_fn(|s| s.as_str().len());
        let order: Vec<Strategy> = p.iter().map(|(s, _)| s).collect();
        assert_eq!(order, Strategy::ALL.to_vec());
        assert_eq!(*p.get(Strategy::BidAsk), 7);
    }
}
