//! Файловый ввод/вывод бинарников: снапшоты, кэш свечей, артефакты.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use core_types::types::{MS_PER_DAY, Price, Qty, TimestampMs};
use market::snapshot::normalize;
use market::{Candle, Snapshot};
use market_data::{KlineRest, download_daily_range};

pub fn parse_num_list<T>(s: &str, name: &str) -> Result<Vec<T>>
where
    T: std::str::FromStr,
    <T as std::str::FromStr>::Err: std::fmt::Display,
{
    let mut out = Vec::new();
    for raw in s.split(',') {
        let v = raw.trim();
        if v.is_empty() {
            continue;
        }
        let parsed = v
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("bad value in {}: '{}' ({})", name, v, e))?;
        out.push(parsed);
    }
    if out.is_empty() {
        anyhow::bail!("{} cannot be empty", name);
    }
    Ok(out)
}

/// `YYYY-MM-DD` → полночь UTC в ms
pub fn date_to_ms(date: &str) -> Result<i64> {
    let d = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .with_context(|| format!("bad date: {}", date))?;
    Ok(d.and_time(NaiveTime::MIN).and_utc().timestamp_millis())
}

/// Диапазон свечей, покрывающий снапшоты: от полуночи первого дня
/// до конца последнего.
pub fn candle_range(snapshots: &[Snapshot]) -> Option<(i64, i64)> {
    let first = snapshots.first()?.ts().day_index();
    let last = snapshots.last()?.ts().day_index();
    Some((first * MS_PER_DAY, (last + 1) * MS_PER_DAY - 1))
}

/// JSON-массив снапшотов → нормализованные ms timestamps, по времени.
pub fn load_snapshots(path: &str) -> Result<Vec<Snapshot>> {
    let file = File::open(path).with_context(|| format!("open snapshots {}", path))?;
    let raw: Vec<Snapshot> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parse snapshots {}", path))?;
    Ok(normalize(raw))
}

#[derive(Serialize, Deserialize)]
struct CandleRow {
    ts: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

pub fn read_candle_cache(path: &str) -> Result<Vec<Candle>> {
    let mut rdr = csv::Reader::from_path(path)?;
    let mut out = Vec::new();
    for r in rdr.deserialize::<CandleRow>() {
        let row = r?;
        out.push(Candle {
            ts: TimestampMs(row.ts),
            open: Price(row.open),
            high: Price(row.high),
            low: Price(row.low),
            close: Price(row.close),
            volume: Qty(row.volume),
        });
    }
    Ok(out)
}

pub fn write_candle_cache(path: &str, candles: &[Candle]) -> Result<()> {
    write_csv(
        path,
        candles.iter().map(|c| CandleRow {
            ts: c.ts.0,
            open: c.open.0,
            high: c.high.0,
            low: c.low.0,
            close: c.close.0,
            volume: c.volume.0,
        }),
    )
}

/// Кэш, если он есть и не просили refresh; иначе качаем и пишем кэш.
pub async fn cached_or_download(
    api: &KlineRest,
    symbol: &str,
    cache: &str,
    refresh: bool,
    start_ms: i64,
    end_ms: i64,
) -> Result<Vec<Candle>> {
    if !refresh && Path::new(cache).exists() {
        let candles = read_candle_cache(cache).with_context(|| format!("read candle cache {}", cache))?;
        tracing::debug!(cache, candles = candles.len(), "candles from cache");
        return Ok(candles);
    }
    let data = download_daily_range(api, symbol, start_ms, end_ms)
        .await
        .with_context(|| format!("download daily klines for {}", symbol))?;
    write_candle_cache(cache, &data).with_context(|| format!("write candle cache {}", cache))?;
    tracing::info!(symbol, candles = data.len(), cache, "daily klines downloaded");
    Ok(data)
}

/// Сырые OHLCV из JSON: `[[ts,o,h,l,c,v], ...]` или то же под ключом
/// `data` / `ohlcv_list`.
#[derive(Deserialize)]
#[serde(untagged)]
enum OhlcvFile {
    Rows(Vec<Vec<f64>>),
    Data { data: Vec<Vec<f64>> },
    List { ohlcv_list: Vec<Vec<f64>> },
}

pub fn parse_ohlcv_json(raw: &str) -> Result<Vec<Candle>> {
    let rows = match serde_json::from_str::<OhlcvFile>(raw).context("parse OHLCV json")? {
        OhlcvFile::Rows(rows) | OhlcvFile::Data { data: rows } | OhlcvFile::List { ohlcv_list: rows } => {
            rows
        }
    };
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let candle =
            Candle::from_row(&row).with_context(|| format!("short OHLCV row: {:?}", row))?;
        out.push(candle);
    }
    out.sort_by_key(|c| c.ts);
    Ok(out)
}

pub fn load_ohlcv_json(path: &str) -> Result<Vec<Candle>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("read OHLCV {}", path))?;
    parse_ohlcv_json(&raw).with_context(|| format!("OHLCV file {}", path))
}

fn ensure_parent(path: &str) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

pub fn write_csv<T: Serialize>(path: &str, rows: impl IntoIterator<Item = T>) -> Result<()> {
    ensure_parent(path)?;
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &str, value: &T) -> Result<()> {
    ensure_parent(path)?;
    let file = File::create(path).with_context(|| format!("create {}", path))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)?;
    Ok(())
}
