use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use analytics::FeeParams;
use core_types::types::Ratio;
use engine::backtest::{RunParams, run_backtest, window_bounds};
use engine::io::{cached_or_download, candle_range, load_ohlcv_json, load_snapshots, write_csv, write_json};
use engine::report::{ReportJson, allocation_rows, daily_activity_rows, daily_fee_rows};
use liquidity::{Concentration, WeightParams};
use market_data::KlineRest;

/// Бэктест spot / curve / bid-ask на истории снапшотов пула.
#[derive(Parser, Debug)]
struct Args {
    /// JSON-массив снапшотов (экспорт коллектора)
    #[arg(long)]
    snapshots: String,
    #[arg(long, default_value = "SOLUSDC")]
    symbol: String,
    /// локальный OHLCV JSON вместо биржи
    #[arg(long)]
    ohlcv_file: Option<String>,
    #[arg(long, default_value = "data/dlmm_daily_candles.csv")]
    candle_cache: String,
    #[arg(long, default_value_t = false)]
    refresh: bool,
    #[arg(long, default_value_t = 20)]
    timeout_secs: u64,

    #[arg(long, default_value_t = 1000.0)]
    total_liquidity_usd: f64,
    #[arg(long, default_value_t = 5.0)]
    bin_range_percent: f64,
    /// 0 = вся история
    #[arg(long, default_value_t = 0)]
    period_days: u32,
    #[arg(long, default_value = "medium")]
    concentration: Concentration,
    #[arg(long, default_value_t = liquidity::weights::DEFAULT_BID_ASK_EPSILON)]
    bid_ask_epsilon: f64,
    #[arg(long, default_value_t = analytics::fees::BASE_FEE_RATE)]
    base_fee_rate: f64,

    #[arg(long, default_value = "data/dlmm")]
    out_dir: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "backtest_dlmm=info,engine=info".into()),
        )
        .init();

    let args = Args::parse();
    if !(0.0..=1.0).contains(&args.base_fee_rate) {
        anyhow::bail!("base_fee_rate must be within 0..=1");
    }

    let snapshots = load_snapshots(&args.snapshots)?;
    let Some((start_ms, end_ms)) = window_bounds(&snapshots, args.period_days) else {
        anyhow::bail!("no snapshots in {}", args.snapshots);
    };
    tracing::info!(
        snapshots = snapshots.len(),
        start_ms = start_ms.0,
        end_ms = end_ms.0,
        "snapshots loaded"
    );

    let candles = match &args.ohlcv_file {
        Some(path) => load_ohlcv_json(path)?,
        None => {
            let window = market::snapshot::period_slice(&snapshots, args.period_days);
            let (from, to) = candle_range(window).context("empty window")?;
            let api = KlineRest::new(Duration::from_secs(args.timeout_secs))?;
            cached_or_download(&api, &args.symbol, &args.candle_cache, args.refresh, from, to).await?
        }
    };

    let params = RunParams {
        total_liquidity_usd: args.total_liquidity_usd,
        bin_range_percent: args.bin_range_percent,
        period_days: args.period_days,
        weights: WeightParams {
            concentration: args.concentration,
            bid_ask_epsilon: args.bid_ask_epsilon,
        },
        fees: FeeParams {
            base_fee_rate: Ratio(args.base_fee_rate),
        },
    };
    let report = run_backtest(&snapshots, &candles, params).context("backtest failed")?;

    if !report.missing_market_data_days.is_empty() {
        tracing::warn!(
            days = report.missing_market_data_days.len(),
            "days without OHLCV candle earned no fees"
        );
    }

    let report_path = format!("{}/report.json", args.out_dir);
    let alloc_path = format!("{}/allocations.csv", args.out_dir);
    let activity_path = format!("{}/daily_activity.csv", args.out_dir);
    let fees_path = format!("{}/daily_fees.csv", args.out_dir);
    write_json(&report_path, &ReportJson::from_report(&report)).context("write report failed")?;
    write_csv(&alloc_path, allocation_rows(&report)).context("write allocations failed")?;
    write_csv(&activity_path, daily_activity_rows(&report)).context("write daily activity failed")?;
    write_csv(&fees_path, daily_fee_rows(&report)).context("write daily fees failed")?;

    println!(
        "DLMM backtest done: snapshots={} bins={} days={} missing_days={}",
        report.snapshot_count,
        report.allocations.spot.bins.len(),
        report.fees.days.len(),
        report.missing_market_data_days.len()
    );
    for (strategy, p) in report.performance.iter() {
        println!(
            "strategy={} time_in_range={:.4} efficiency={:.4} avg_util={:.4} peak_util={:.4} stability={:.4} fees_usd={:.2}",
            strategy,
            p.time_in_range,
            p.liquidity_efficiency,
            p.avg_utilization_when_active,
            p.peak_utilization,
            p.utilization_stability,
            p.fees_usd
        );
    }
    println!(
        "artifacts: report={} allocations={} daily_activity={} daily_fees={}",
        report_path, alloc_path, activity_path, fees_path
    );

    Ok(())
}
