//! Дневная атрибуция объёма по бинам.
//!
//! Снапшоты режутся по UTC-дням. Внутри дня доля бина = как часто он был
//! активным. Объём дня берётся из дневной OHLCV-свечи с той же датой;
//! нет свечи, и день пропускается целиком и попадает в `missing_days`.

use std::collections::BTreeMap;

use tracing::debug;

use core_types::types::{BinId, Bps, Money, Ratio};
use market::{Candle, Snapshot, UtcDay};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DailyBinActivity {
    pub date: UtcDay,
    pub bin_id: BinId,
    pub snapshot_count: usize,
    pub proportion: Ratio,
    pub avg_liquidity_usd: Money,
    pub volume_usd: Money,
    /// заполняет распределение комиссий
    pub fees_usd: Money,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayAttribution {
    pub date: UtcDay,
    pub snapshot_count: usize,
    pub day_volume_usd: Money,
    /// комиссия протокола по первому снапшоту дня
    pub protocol_fee: Bps,
    /// по возрастанию bin_id
    pub bins: Vec<DailyBinActivity>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct VolumeAttribution {
    pub days: Vec<DayAttribution>,
    /// дни со снапшотами, но без свечи
    pub missing_days: Vec<UtcDay>,
}

/// Снапшоты по UTC-дням, порядок внутри дня сохраняется.
pub fn bucket_by_day(snapshots: &[Snapshot]) -> BTreeMap<UtcDay, Vec<&Snapshot>> {
    snapshots.iter().fold(BTreeMap::new(), |mut acc, s| {
        match UtcDay::from_ts(s.ts()) {
            Some(day) => acc.entry(day).or_insert_with(Vec::new).push(s),
            None => debug!(ts = s.timestamp, "snapshot outside calendar range skipped"),
        }
        acc
    })
}

/// Сколько раз каждый бин был активным
pub fn active_bin_counts(day: &[&Snapshot]) -> BTreeMap<BinId, usize> {
    day.iter().fold(BTreeMap::new(), |mut acc, s| {
        *acc.entry(s.active_bin()).or_insert(0) += 1;
        acc
    })
}

/// Средняя USD-ликвидность бина по снапшотам дня, где этот бин есть в bin_data.
pub fn avg_bin_liquidity(day: &[&Snapshot], bin: BinId) -> Money {
    let (sum, n) = day
        .iter()
        .filter_map(|s| s.bin_liquidity_usd(bin))
        .fold((0.0_f64, 0usize), |(sum, n), usd| (sum + usd.0, n + 1));
    if n == 0 { Money(0.0) } else { Money(sum / n as f64) }
}

/// Свечи по дню; на дубликат дня берётся первая.
pub fn index_candles(candles: &[Candle]) -> BTreeMap<UtcDay, Candle> {
    candles.iter().fold(BTreeMap::new(), |mut acc, c| {
        if let Some(day) = c.day() {
            acc.entry(day).or_insert(*c);
        }
        acc
    })
}

fn attribute_day(date: UtcDay, day: &[&Snapshot], candle: &Candle) -> DayAttribution {
    let counts = active_bin_counts(day);
    let total = day.len();
    let day_volume_usd = candle.volume_usd();

    let bins = counts
        .into_iter()
        .map(|(bin_id, count)| {
            let proportion = Ratio(count as f64 / total as f64);
            DailyBinActivity {
                date,
                bin_id,
                snapshot_count: count,
                proportion,
                avg_liquidity_usd: avg_bin_liquidity(day, bin_id),
                volume_usd: day_volume_usd * proportion,
                fees_usd: Money(0.0),
            }
        })
        .collect();

    DayAttribution {
        date,
        snapshot_count: total,
        day_volume_usd,
        protocol_fee: day.first().map(|s| s.protocol_fee()).unwrap_or(Bps(0.0)),
        bins,
    }
}

pub fn attribute_daily_volume(snapshots: &[Snapshot], candles: &[Candle]) -> VolumeAttribution {
    let by_candle_day = index_candles(candles);

    bucket_by_day(snapshots)
        .into_iter()
        .fold(VolumeAttribution::default(), |mut acc, (date, day)| {
            match by_candle_day.get(&date) {
                Some(candle) => acc.days.push(attribute_day(date, &day, candle)),
                None => {
                    debug!(%date, snapshots = day.len(), "no OHLCV candle for day, skipping volume");
                    acc.missing_days.push(date);
                }
            }
            acc
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{DAY0, HOUR, candle, snap, snap_with_bins};
    use core_types::types::MS_PER_DAY;

    #[test]
    fn proportions_sum_to_one_per_day() {
        let snaps: Vec<_> = [100, 100, 101, 99, 100, 102, 101]
            .iter()
            .enumerate()
            .map(|(i, b)| snap(i as i64, *b))
            .collect();
        let va = attribute_daily_volume(&snaps, &[candle(DAY0, 0.40, 0.42, 100_000.0)]);
        assert_eq!(va.days.len(), 1);
        let day = &va.days[0];
        let total: f64 = day.bins.iter().map(|b| b.proportion.0).sum();
        assert!((total - 1.0).abs() < 1e-12);
        let b100 = day.bins.iter().find(|b| b.bin_id == BinId(100)).unwrap();
        assert_eq!(b100.snapshot_count, 3);
        assert!((b100.proportion.0 - 3.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn day_volume_is_mid_times_volume() {
        let snaps = vec![snap(0, 100), snap(1, 101)];
        let va = attribute_daily_volume(&snaps, &[candle(DAY0, 0.40, 0.42, 100_000.0)]);
        let day = &va.days[0];
        assert!((day.day_volume_usd.0 - 41_000.0).abs() < 1e-6);
        for b in &day.bins {
            assert!((b.volume_usd.0 - 20_500.0).abs() < 1e-6);
        }
    }

    #[test]
    fn missing_candle_skips_the_day() {
        let snaps = vec![snap(0, 100), snap(24, 100), snap(25, 101)];
        let va = attribute_daily_volume(&snaps, &[candle(DAY0, 1.0, 1.0, 10.0)]);
        assert_eq!(va.days.len(), 1);
        assert_eq!(va.missing_days.len(), 1);
        assert_eq!(
            va.missing_days[0],
            UtcDay::from_ts(core_types::types::TimestampMs(DAY0 + MS_PER_DAY)).unwrap()
        );
    }

    #[test]
    fn candle_in_seconds_matches_millisecond_snapshots() {
        let snaps = vec![snap(3, 100)];
        let mut c = candle(DAY0, 1.0, 1.0, 5.0);
        c.ts = market::day::normalize_timestamp_ms(DAY0 / 1000);
        assert_eq!(attribute_daily_volume(&snaps, &[c]).days.len(), 1);
    }

    #[test]
    fn avg_liquidity_only_over_snapshots_listing_the_bin() {
        // bin 100: 2 base @ 1.5 + 3 quote = 6.0 ; 4 base @ 1.5 + 0 = 6.0 → 6.0
        let s1 = snap_with_bins(DAY0, 100, &[(100, 2.0, 3.0, 1.5)]);
        let s2 = snap_with_bins(DAY0 + HOUR, 101, &[(100, 4.0, 0.0, 1.5), (101, 0.0, 10.0, 1.6)]);
        let s3 = snap_with_bins(DAY0 + 2 * HOUR, 100, &[(101, 0.0, 10.0, 1.6)]);
        let day = vec![&s1, &s2, &s3];
        assert!((avg_bin_liquidity(&day, BinId(100)).0 - 6.0).abs() < 1e-9);
        assert!((avg_bin_liquidity(&day, BinId(101)).0 - 10.0).abs() < 1e-9);
        assert_eq!(avg_bin_liquidity(&day, BinId(102)).0, 0.0);
    }

    #[test]
    fn no_snapshots_no_days() {
        let va = attribute_daily_volume(&[], &[candle(DAY0, 1.0, 1.0, 1.0)]);
        assert!(va.days.is_empty() && va.missing_days.is_empty());
    }
}
