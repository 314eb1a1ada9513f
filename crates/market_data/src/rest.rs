use std::time::Duration;

use anyhow::{Context, bail};
use serde::Deserialize;

use market::Candle;

/// Дневной интервал kline
pub const DAILY_INTERVAL: &str = "D";

#[derive(Clone)]
pub struct KlineRest {
    client: reqwest::Client,
    base: String,
}

impl KlineRest {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        Self::with_base("https://api.bybit.com", timeout)
    }

    pub fn with_base(base: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("http client build failed")?;
        Ok(Self {
            client,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    pub async fn get_daily_klines(
        &self,
        symbol: &str,
        start_ms: i64,
        end_ms: i64,
        limit: u16, // 1..=1000
    ) -> anyhow::Result<Vec<Candle>> {
        let url = format!("{}/v5/market/kline", self.base);

        let resp: KlineResp = self
            .client
            .get(url)
            .query(&[
                ("category", "spot"),
                ("symbol", symbol),
                ("interval", DAILY_INTERVAL),
                ("start", &start_ms.to_string()),
                ("end", &end_ms.to_string()),
                ("limit", &limit.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if resp.ret_code != 0 {
            bail!("kline request rejected: {} ({})", resp.ret_msg, resp.ret_code);
        }

        parse_kline_list(resp.result.list)
    }
}

#[derive(Debug, Deserialize)]
struct KlineResp {
    #[serde(rename = "retCode")]
    ret_code: i64,
    #[serde(rename = "retMsg")]
    ret_msg: String,
    result: KlineResult,
}

#[derive(Debug, Deserialize)]
struct KlineResult {
    list: Vec<Vec<String>>,
}

/// Строки `[startTime, open, high, low, close, volume, ...]` → свечи по возрастанию.
/// Биржа отдаёт reverse sort by startTime, поэтому сортируем сами.
pub fn parse_kline_list(list: Vec<Vec<String>>) -> anyhow::Result<Vec<Candle>> {
    let mut out = Vec::with_capacity(list.len());
    for row in list {
        let nums = row
            .iter()
            .take(6)
            .map(|v| v.parse::<f64>())
            .collect::<Result<Vec<f64>, _>>()
            .with_context(|| format!("bad kline row: {:?}", row))?;
        let candle = Candle::from_row(&nums)
            .with_context(|| format!("short kline row: {:?}", row))?;
        out.push(candle);
    }
    out.sort_by_key(|c| c.ts);
    Ok(out)
}

pub async fn download_daily_range(
    api: &KlineRest,
    symbol: &str,
    start_ms: i64,
    end_ms: i64,
) -> anyhow::Result<Vec<Candle>> {
    let mut all: Vec<Candle> = Vec::new();
    let mut cursor_end = end_ms;

    // 1000: максимум на страницу (~2.7 года дневок)
    let limit = 1000u16;

    loop {
        if cursor_end <= start_ms {
            break;
        }

        let page = api.get_daily_klines(symbol, start_ms, cursor_end, limit).await?;
        let Some(first) = page.first() else {
            break;
        };
        let first_ts = first.ts.0;
        all.extend(page);

        // идём назад по времени, не зацикливаясь на первой свече
        cursor_end = first_ts - 1;

        tokio::time::sleep(Duration::from_millis(120)).await;
    }

    all.sort_by_key(|c| c.ts);
    all.dedup_by_key(|c| c.ts);
    all.retain(|c| c.ts.0 >= start_ms && c.ts.0 <= end_ms);

    Ok(all)
}
