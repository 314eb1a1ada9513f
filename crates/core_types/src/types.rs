//! Core domain types.
//!
//! Цель:
//! - запретить "голые" f64 в бизнес-логике пула
//! - зафиксировать единицы измерения (USD, токены, bps)
//! - сделать ошибки очевидными на уровне типов

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Sub};

/// Цена base-токена в quote-токене (например SOL/USDC)
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
pub struct Price(pub f64);

/// Количество токена (в человеческих единицах, уже с учётом decimals)
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
pub struct Qty(pub f64);

/// Денежная сумма (USD)
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Default)]
pub struct Money(pub f64);

/// Базисные пункты (1 bps = 0.01%)
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
pub struct Bps(pub f64);

/// Доля / коэффициент (0.0 .. 1.0)
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Default)]
pub struct Ratio(pub f64);

/// Время в миллисекундах (unix epoch)
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimestampMs(pub i64);

/// Идентификатор бина. Цена монотонно растёт вместе с id.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BinId(pub i32);

pub const MS_PER_DAY: i64 = 86_400_000;

//
// --- Conversions & helpers --------------------------------------------------
//

impl Bps {
    /// Перевод bps → коэффициент
    pub fn as_ratio(self) -> Ratio {
        Ratio(self.0 / 10_000.0)
    }
}

impl Ratio {
    pub fn clamp_01(self) -> Self {
        Ratio(self.0.clamp(0.0, 1.0))
    }

    /// 1 - r, например LP share = 1 - protocol share
    pub fn complement(self) -> Self {
        Ratio(1.0 - self.0)
    }
}

impl BinId {
    pub fn offset(self, delta: i32) -> BinId {
        BinId(self.0.saturating_add(delta))
    }
}

impl TimestampMs {
    /// Номер UTC-дня от эпохи
    pub fn day_index(self) -> i64 {
        self.0.div_euclid(MS_PER_DAY)
    }
}

//
// --- Arithmetic (строго минимально) -----------------------------------------
//

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Mul<Ratio> for Money {
    type Output = Money;
    fn mul(self, r: Ratio) -> Money {
        Money(self.0 * r.0)
    }
}

impl Mul<Price> for Qty {
    type Output = Money;
    fn mul(self, price: Price) -> Money {
        Money(self.0 * price.0)
    }
}

impl Div<Price> for Money {
    type Output = Qty;
    fn div(self, price: Price) -> Qty {
        Qty(self.0 / price.0)
    }
}

//
// --- Display (для логов / отчётов) ------------------------------------------
//

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl fmt::Display for Bps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} bps", self.0)
    }
}

impl fmt::Display for BinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
