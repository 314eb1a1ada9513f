use serde::{Deserialize, Serialize};
use tracing::debug;

use core_types::types::{BinId, Bps, MS_PER_DAY, Money, Price, TimestampMs};

use crate::day::normalize_timestamp_ms;

/// Коллектор пишет числа то строкой, то числом.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumOrStr {
    Num(f64),
    Str(String),
}

impl NumOrStr {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            NumOrStr::Num(v) => Some(*v),
            NumOrStr::Str(s) => s.trim().parse::<f64>().ok(),
        }
    }
}

/// Резервы одного бина в момент снапшота (сырые единицы токенов).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinReserve {
    #[serde(alias = "binId")]
    pub bin_id: i32,
    #[serde(alias = "liquidityX", alias = "xAmount")]
    pub liquidity_x: NumOrStr,
    #[serde(alias = "liquidityY", alias = "yAmount")]
    pub liquidity_y: NumOrStr,
    pub price: NumOrStr,
}

impl BinReserve {
    pub fn id(&self) -> BinId {
        BinId(self.bin_id)
    }

    /// USD-стоимость бина: (x / 10^dx) * price + (y / 10^dy).
    /// None, если резерв или цена не парсятся.
    pub fn liquidity_usd(&self, decimals_x: u8, decimals_y: u8) -> Option<Money> {
        let x = self.liquidity_x.as_f64()?;
        let y = self.liquidity_y.as_f64()?;
        let price = self.price.as_f64()?;
        let usd = (x / 10f64.powi(decimals_x as i32)) * price + y / 10f64.powi(decimals_y as i32);
        usd.is_finite().then_some(Money(usd))
    }
}

/// Состояние пула в момент времени. После загрузки не меняется.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// ms epoch после `normalize`; в сыром файле могут быть секунды
    pub timestamp: i64,
    #[serde(alias = "activeBinId")]
    pub active_bin_id: i32,
    #[serde(alias = "binStep")]
    pub bin_step: u16,
    /// bps базовой комиссии, которые забирает протокол
    #[serde(alias = "protocolFee", default)]
    pub protocol_fee: f64,
    #[serde(alias = "currentPrice")]
    pub current_price: NumOrStr,
    #[serde(alias = "decimalsX", alias = "reserveXDecimals")]
    pub decimals_x: u8,
    #[serde(alias = "decimalsY", alias = "reserveYDecimals")]
    pub decimals_y: u8,
    #[serde(alias = "binData", default)]
    pub bin_data: Vec<BinReserve>,
}

impl Snapshot {
    pub fn ts(&self) -> TimestampMs {
        TimestampMs(self.timestamp)
    }

    pub fn active_bin(&self) -> BinId {
        BinId(self.active_bin_id)
    }

    /// Нечисловая цена считается нулевой (её отсеет аллокатор).
    pub fn price(&self) -> Price {
        Price(self.current_price.as_f64().unwrap_or(0.0))
    }

    pub fn protocol_fee(&self) -> Bps {
        Bps(self.protocol_fee)
    }

    pub fn bin(&self, id: BinId) -> Option<&BinReserve> {
        self.bin_data.iter().find(|b| b.bin_id == id.0)
    }

    pub fn bin_liquidity_usd(&self, id: BinId) -> Option<Money> {
        let bin = self.bin(id)?;
        let usd = bin.liquidity_usd(self.decimals_x, self.decimals_y);
        if usd.is_none() {
            debug!(bin = id.0, ts = self.timestamp, "unparseable bin reserve skipped");
        }
        usd
    }
}

/// Нормализует timestamps в ms и сортирует по времени.
pub fn normalize(mut snapshots: Vec<Snapshot>) -> Vec<Snapshot> {
    for s in &mut snapshots {
        s.timestamp = normalize_timestamp_ms(s.timestamp).0;
    }
    snapshots.sort_by_key(|s| s.timestamp);
    snapshots
}

/// Окно бэктеста: последние `period_days` суток до последнего снапшота.
/// period_days = 0 → вся история. Вход должен быть отсортирован.
pub fn period_slice(snapshots: &[Snapshot], period_days: u32) -> &[Snapshot] {
    let Some(last) = snapshots.last() else {
        return snapshots;
    };
    if period_days == 0 {
        return snapshots;
    }
    let start = last
        .timestamp
        .saturating_sub(i64::from(period_days).saturating_mul(MS_PER_DAY));
    let from = snapshots.partition_point(|s| s.timestamp < start);
    &snapshots[from..]
}
