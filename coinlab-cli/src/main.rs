//! CoinLab CLI — download, run, compare, and cache commands.
//!
//! Commands:
//! - `download` — fetch monthly 1m klines from Binance Vision and cache as Parquet
//! - `run` — execute an SMA-crossover backtest from flags or a TOML config
//! - `compare` — run several window pairs on one symbol and rank them
//! - `cache status` — report cached symbols, date ranges, bar counts

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use coinlab_core::data::{
    download_pairs, BinanceProvider, DataProvider, ParquetCache, StdoutProgress,
};
use coinlab_runner::report::{
    write_comparison_markdown, write_comparison_svg, write_equity_svg, write_performance_csv,
    write_result_json,
};
use coinlab_runner::{
    run_single_backtest, run_universe, CostParams, RunConfig, RunResult, StrategyParams,
};

#[derive(Parser)]
#[command(
    name = "coinlab",
    about = "CoinLab CLI — SMA-crossover backtesting for crypto pairs"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download monthly 1m klines from Binance Vision and cache as Parquet.
    Download {
        /// Pairs to download (e.g., ETHBTC LTCBTC). Omit to use --top.
        symbols: Vec<String>,

        /// Discover the N most liquid pairs instead of naming them.
        #[arg(long)]
        top: Option<usize>,

        /// Quote asset for --top discovery.
        #[arg(long, default_value = "BTC")]
        quote: String,

        /// Archive year.
        #[arg(long)]
        year: i32,

        /// Archive month (1-12).
        #[arg(long)]
        month: u32,

        /// Force re-download even if cached.
        #[arg(long, default_value_t = false)]
        force: bool,

        /// Cache directory.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,
    },
    /// Execute an SMA-crossover backtest against cached data.
    Run {
        /// Path to a TOML config file (mutually exclusive with --symbol).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Trading pair (e.g., ETHBTC).
        #[arg(long)]
        symbol: Option<String>,

        /// Run across every cached pair instead of one symbol.
        #[arg(long, default_value_t = false)]
        all: bool,

        /// Short SMA window.
        #[arg(long, default_value_t = 20)]
        short: usize,

        /// Long SMA window.
        #[arg(long, default_value_t = 100)]
        long: usize,

        /// Proportional fee per position change (e.g., 0.001).
        #[arg(long)]
        fee: Option<f64>,

        /// Proportional slippage per position change (e.g., 0.0005).
        #[arg(long)]
        slippage: Option<f64>,

        /// Cache directory.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,

        /// Output directory for run artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Run several window pairs on one symbol and rank them by Sharpe.
    Compare {
        /// Trading pair (e.g., ETHBTC).
        #[arg(long)]
        symbol: String,

        /// Window pairs as short:long (e.g., 10:50 20:100 50:200).
        #[arg(long, required = true, num_args = 1..)]
        windows: Vec<String>,

        /// Proportional fee per position change.
        #[arg(long)]
        fee: Option<f64>,

        /// Proportional slippage per position change.
        #[arg(long)]
        slippage: Option<f64>,

        /// Cache directory.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,

        /// Output directory for comparison artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Cache management commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Report cached symbols, date ranges, and bar counts.
    Status {
        /// Cache directory.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Download {
            symbols,
            top,
            quote,
            year,
            month,
            force,
            cache_dir,
        } => run_download(symbols, top, &quote, year, month, force, cache_dir),
        Commands::Run {
            config,
            symbol,
            all,
            short,
            long,
            fee,
            slippage,
            cache_dir,
            output_dir,
        } => {
            if all {
                if config.is_some() || symbol.is_some() {
                    bail!("--all runs every cached pair; drop --config/--symbol");
                }
                run_universe_cmd(short, long, fee, slippage, cache_dir, output_dir)
            } else {
                run_backtest_cmd(config, symbol, short, long, fee, slippage, cache_dir, output_dir)
            }
        }
        Commands::Compare {
            symbol,
            windows,
            fee,
            slippage,
            cache_dir,
            output_dir,
        } => run_compare_cmd(&symbol, &windows, fee, slippage, cache_dir, output_dir),
        Commands::Cache { action } => match action {
            CacheAction::Status { cache_dir } => run_cache_status(&cache_dir),
        },
    }
}

fn run_download(
    symbols: Vec<String>,
    top: Option<usize>,
    quote: &str,
    year: i32,
    month: u32,
    force: bool,
    cache_dir: PathBuf,
) -> Result<()> {
    if !(1..=12).contains(&month) {
        bail!("month must be in 1..=12, got {month}");
    }

    let provider = BinanceProvider::new();
    let cache = ParquetCache::new(cache_dir);
    cache.ensure_layout()?;

    let symbols = match (symbols.is_empty(), top) {
        (false, Some(_)) => bail!("pass either explicit symbols or --top, not both"),
        (true, None) => bail!("no symbols given; name pairs or pass --top N"),
        (false, None) => symbols,
        (true, Some(n)) => {
            let pairs = provider.liquid_pairs(quote, n)?;
            println!("Discovered {} {quote}-quoted pairs by 24h volume", pairs.len());
            pairs
        }
    };

    let summary = download_pairs(&provider, &cache, &symbols, year, month, force, &StdoutProgress);

    if summary.failed > 0 {
        for (sym, err) in &summary.errors {
            eprintln!("Error for {sym}: {err}");
        }
    }
    println!(
        "Done: {} cached, {} failed of {}",
        summary.succeeded, summary.failed, summary.total
    );
    if summary.succeeded == 0 && summary.total > 0 {
        std::process::exit(1);
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_backtest_cmd(
    config_path: Option<PathBuf>,
    symbol: Option<String>,
    short: usize,
    long: usize,
    fee: Option<f64>,
    slippage: Option<f64>,
    cache_dir: PathBuf,
    output_dir: PathBuf,
) -> Result<()> {
    if config_path.is_some() && symbol.is_some() {
        bail!("--config and --symbol are mutually exclusive");
    }

    let config = if let Some(path) = config_path {
        RunConfig::from_toml_file(&path)?
    } else if let Some(symbol) = symbol {
        RunConfig {
            symbol,
            strategy: StrategyParams {
                short_window: short,
                long_window: long,
            },
            costs: build_costs(fee, slippage),
        }
    } else {
        bail!("one of --config or --symbol is required");
    };
    config.validate()?;

    let cache = ParquetCache::new(&cache_dir);
    let result = run_single_backtest(&config, &cache)?;

    print_summary(&result);
    let run_dir = save_run_artifacts(&result, &output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());

    Ok(())
}

fn run_universe_cmd(
    short: usize,
    long: usize,
    fee: Option<f64>,
    slippage: Option<f64>,
    cache_dir: PathBuf,
    output_dir: PathBuf,
) -> Result<()> {
    let cache = ParquetCache::new(&cache_dir);
    let symbols = cache.cached_symbols()?;
    if symbols.is_empty() {
        bail!("no cached pairs in {}; run `coinlab download` first", cache_dir.display());
    }

    let template = RunConfig {
        symbol: String::new(),
        strategy: StrategyParams {
            short_window: short,
            long_window: long,
        },
        costs: build_costs(fee, slippage),
    };
    template.validate()?;

    let results = run_universe(&template, &cache, &symbols);

    let mut succeeded = Vec::new();
    let mut failed = 0usize;
    for (symbol, result) in results {
        match result {
            Ok(run) => succeeded.push(run),
            Err(err) => {
                eprintln!("Error for {symbol}: {err}");
                failed += 1;
            }
        }
    }

    println!();
    println!(
        "{:<12} {:>14} {:>8} {:>14} {:>8}",
        "Symbol", "Total Return", "Sharpe", "Max Drawdown", "Trades"
    );
    println!("{}", "-".repeat(60));
    succeeded.sort_by(|a, b| {
        b.report
            .metrics
            .sharpe_ratio
            .partial_cmp(&a.report.metrics.sharpe_ratio)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    for run in &succeeded {
        let m = &run.report.metrics;
        println!(
            "{:<12} {:>13.2}% {:>8.3} {:>13.2}% {:>8}",
            run.config.symbol,
            m.total_return * 100.0,
            m.sharpe_ratio,
            m.max_drawdown * 100.0,
            run.trade_count
        );
    }
    println!();
    println!("{} pairs ran, {} failed", succeeded.len(), failed);

    for run in &succeeded {
        save_run_artifacts(run, &output_dir)?;
    }
    if !succeeded.is_empty() {
        println!("Artifacts saved under: {}", output_dir.display());
    }
    Ok(())
}

fn run_compare_cmd(
    symbol: &str,
    windows: &[String],
    fee: Option<f64>,
    slippage: Option<f64>,
    cache_dir: PathBuf,
    output_dir: PathBuf,
) -> Result<()> {
    let cache = ParquetCache::new(&cache_dir);
    let costs = build_costs(fee, slippage);

    let mut results = Vec::with_capacity(windows.len());
    for spec in windows {
        let (short, long) = parse_windows(spec)?;
        let config = RunConfig {
            symbol: symbol.to_string(),
            strategy: StrategyParams {
                short_window: short,
                long_window: long,
            },
            costs,
        };
        config.validate()?;
        results.push(run_single_backtest(&config, &cache)?);
    }

    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let md_path = output_dir.join(format!("{symbol}_comparison.md"));
    write_comparison_markdown(&md_path, &results)?;

    let entries: Vec<(String, coinlab_core::MetricsReport)> = results
        .iter()
        .map(|r| (r.label.clone(), r.report.metrics))
        .collect();
    let svg_path = output_dir.join(format!("{symbol}_comparison.svg"));
    write_comparison_svg(&svg_path, &entries)?;

    println!("Comparison written to: {}", md_path.display());
    println!("Chart written to:      {}", svg_path.display());
    Ok(())
}

/// Costs apply only when at least one component is given; a missing
/// component defaults to zero.
fn build_costs(fee: Option<f64>, slippage: Option<f64>) -> Option<CostParams> {
    if fee.is_none() && slippage.is_none() {
        return None;
    }
    Some(CostParams {
        fee: fee.unwrap_or(0.0),
        slippage: slippage.unwrap_or(0.0),
    })
}

fn parse_windows(spec: &str) -> Result<(usize, usize)> {
    let (short, long) = spec
        .split_once(':')
        .with_context(|| format!("window spec '{spec}' must be short:long, e.g. 20:100"))?;
    Ok((
        short
            .parse()
            .with_context(|| format!("bad short window in '{spec}'"))?,
        long.parse()
            .with_context(|| format!("bad long window in '{spec}'"))?,
    ))
}

fn save_run_artifacts(result: &RunResult, output_dir: &Path) -> Result<PathBuf> {
    let run_dir = output_dir.join(format!(
        "{}_{}_{}",
        result.config.symbol,
        result.label,
        &result.run_id[..12]
    ));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create {}", run_dir.display()))?;

    write_result_json(&run_dir.join("result.json"), result)?;
    write_performance_csv(&run_dir.join("performance.csv"), &result.report)?;

    let equity = &result.report.simulation.equity;
    if equity.len() >= 2 {
        let title = format!("{} {}", result.config.symbol, result.label);
        write_equity_svg(&run_dir.join("equity.svg"), &title, equity)?;
    }

    Ok(run_dir)
}

fn print_summary(result: &RunResult) {
    let m = &result.report.metrics;
    println!();
    println!("=== Backtest Result ===");
    println!("Symbol:         {}", result.config.symbol);
    println!("Strategy:       {}", result.label);
    println!("Bars:           {}", result.bar_count);
    println!("Signal bars:    {}", result.signal_count);
    println!("Trades:         {}", result.trade_count);
    println!();
    println!("--- Performance ---");
    println!("Total Return:   {:+.2}%", m.total_return * 100.0);
    println!("Sharpe:         {:.3}", m.sharpe_ratio);
    println!("Max Drawdown:   {:+.2}%", m.max_drawdown * 100.0);
    println!("Win Rate:       {:.1}%", m.win_rate * 100.0);
    println!("Expectancy:     {:+.4}%", m.expectancy * 100.0);
    println!("Exposure:       {:.1}%", m.exposure_time * 100.0);
    println!();
}

fn run_cache_status(cache_dir: &Path) -> Result<()> {
    let cache = ParquetCache::new(cache_dir);
    let symbols = match cache.cached_symbols() {
        Ok(s) => s,
        Err(_) => {
            println!("Cache directory does not exist: {}", cache_dir.display());
            return Ok(());
        }
    };
    if symbols.is_empty() {
        println!("Cache is empty: {}", cache_dir.display());
        return Ok(());
    }

    let refs: Vec<&str> = symbols.iter().map(|s| s.as_str()).collect();
    let statuses = cache.status(&refs);

    println!("Cache: {}", cache_dir.display());
    println!("Symbols: {}", statuses.len());
    println!();
    println!("{:<12} {:<42} {:>10}", "Symbol", "Range", "Bars");
    println!("{}", "-".repeat(66));
    for status in &statuses {
        let range = match (status.start, status.end) {
            (Some(start), Some(end)) => format!(
                "{} to {}",
                start.format("%Y-%m-%d %H:%M"),
                end.format("%Y-%m-%d %H:%M")
            ),
            _ => "(no meta)".to_string(),
        };
        let bars = status
            .bar_count
            .map(|n| n.to_string())
            .unwrap_or_else(|| "?".to_string());
        println!("{:<12} {:<42} {:>10}", status.symbol, range, bars);
    }
    Ok(())
}
