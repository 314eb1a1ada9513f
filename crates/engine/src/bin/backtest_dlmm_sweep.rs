use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use analytics::FeeParams;
use core_types::types::Ratio;
use engine::io::{cached_or_download, candle_range, load_ohlcv_json, load_snapshots, parse_num_list, write_csv};
use engine::report::{describe_best, sweep_summary_rows};
use engine::sweep::{SweepComparator, SweepGrid, SweepInput};
use liquidity::{Concentration, WeightParams};
use market::Candle;
use market::snapshot::period_slice;
use market_data::KlineRest;

/// Матрица ликвидность × диапазон × период для трёх стратегий.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long)]
    snapshots: String,
    #[arg(long, default_value = "SOLUSDC")]
    symbol: String,
    #[arg(long)]
    ohlcv_file: Option<String>,
    /// кэш свечей по периоду: <dir>/candles_<period>d.csv
    #[arg(long, default_value = "data/dlmm_sweep_candles")]
    candle_cache_dir: String,
    #[arg(long, default_value_t = false)]
    refresh: bool,
    #[arg(long, default_value_t = 20)]
    timeout_secs: u64,

    #[arg(long, default_value = "500,1000,5000")]
    liquidity_list: String,
    #[arg(long, default_value = "1,2,5,10")]
    range_list: String,
    #[arg(long, default_value = "7,30,90")]
    period_list: String,
    #[arg(long, default_value = "medium")]
    concentration: Concentration,
    #[arg(long, default_value_t = liquidity::weights::DEFAULT_BID_ASK_EPSILON)]
    bid_ask_epsilon: f64,
    #[arg(long, default_value_t = analytics::fees::BASE_FEE_RATE)]
    base_fee_rate: f64,

    #[arg(long, default_value = "data/dlmm_sweep_summary.csv")]
    summary_out: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "backtest_dlmm_sweep=info,engine=info".into()),
        )
        .init();

    let args = Args::parse();
    if !(0.0..=1.0).contains(&args.base_fee_rate) {
        anyhow::bail!("base_fee_rate must be within 0..=1");
    }

    let grid = SweepGrid {
        liquidity_usd: parse_num_list(&args.liquidity_list, "liquidity_list")?,
        bin_range_percent: parse_num_list(&args.range_list, "range_list")?,
        period_days: parse_num_list(&args.period_list, "period_list")?,
    };

    let snapshots = load_snapshots(&args.snapshots)?;
    if snapshots.is_empty() {
        anyhow::bail!("no snapshots in {}", args.snapshots);
    }

    // свечи грузятся один раз на период, строки свипа их только читают
    let mut candles_by_period: BTreeMap<u32, Vec<Candle>> = BTreeMap::new();
    match &args.ohlcv_file {
        Some(path) => {
            let candles = load_ohlcv_json(path)?;
            for &p in &grid.period_days {
                candles_by_period.insert(p, candles.clone());
            }
        }
        None => {
            let api = KlineRest::new(Duration::from_secs(args.timeout_secs))?;
            for &p in &grid.period_days {
                if candles_by_period.contains_key(&p) {
                    continue;
                }
                let Some((from, to)) = candle_range(period_slice(&snapshots, p)) else {
                    continue;
                };
                let cache = format!("{}/candles_{}d.csv", args.candle_cache_dir, p);
                match cached_or_download(&api, &args.symbol, &cache, args.refresh, from, to).await {
                    Ok(candles) => {
                        candles_by_period.insert(p, candles);
                    }
                    // строки этого периода выпадут с MissingCandles
                    Err(e) => tracing::warn!(period_days = p, error = %format!("{e:#}"), "candles unavailable"),
                }
            }
        }
    }

    let input = SweepInput {
        snapshots: &snapshots,
        candles_by_period: &candles_by_period,
        weights: WeightParams {
            concentration: args.concentration,
            bid_ask_epsilon: args.bid_ask_epsilon,
        },
        fees: FeeParams {
            base_fee_rate: Ratio(args.base_fee_rate),
        },
    };

    let mut comparator = SweepComparator::new();
    let result = comparator.run(&grid, &input).context("sweep failed")?;

    let rows = sweep_summary_rows(&result);
    write_csv(&args.summary_out, &rows).context("write summary failed")?;

    println!(
        "DLMM sweep done: tested={} ok={} failed={} summary_rows={}",
        grid.configs().len(),
        result.rows.len(),
        result.failed.len(),
        rows.len()
    );
    match &result.best_efficiency {
        Some(best) => println!("best_efficiency: {}", describe_best(best)),
        None => println!("best_efficiency: none"),
    }
    match &result.best_fees {
        Some(best) => println!("best_fees: {}", describe_best(best)),
        None => println!("best_fees: none"),
    }
    println!("artifacts: summary={}", args.summary_out);

    Ok(())
}
