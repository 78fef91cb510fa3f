//! Backtest runner — wires the data layer, core, and reporting together.
//!
//! Two entry points:
//! - `run_single_backtest()`: one pair from the cache. Used by the CLI.
//! - `run_universe()`: the same strategy across many cached pairs, in
//!   parallel. Each run owns its series and result; there is no shared
//!   mutable state between pairs, so rayon needs no coordination.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use coinlab_core::data::{to_price_series, DataError, ParquetCache};
use coinlab_core::{BacktestReport, BacktestRunner, CoreError};

use crate::config::{ConfigError, RunConfig, RunId};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error("backtest error: {0}")]
    Core(#[from] CoreError),
}

/// Complete result of a single run, ready for persistence and reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub run_id: RunId,
    pub label: String,
    pub config: RunConfig,
    pub report: BacktestReport,
    pub bar_count: usize,
    pub signal_count: usize,
    pub trade_count: usize,
}

/// Run one configured backtest against cached data.
pub fn run_single_backtest(
    config: &RunConfig,
    cache: &ParquetCache,
) -> Result<RunResult, RunError> {
    let strategy = config.build_strategy().map_err(ConfigError::Invalid)?;
    let costs = config.build_costs().map_err(ConfigError::Invalid)?;

    let raw = cache.load(&config.symbol)?;
    let series = to_price_series(&config.symbol, raw)?;
    let bar_count = series.len();

    let mut runner = BacktestRunner::new(strategy, &series);
    if let Some(costs) = costs {
        runner = runner.with_costs(costs);
    }
    let report = runner.run()?;

    info!(
        symbol = %config.symbol,
        label = %config.label(),
        total_return = report.metrics.total_return,
        sharpe = report.metrics.sharpe_ratio,
        "backtest complete"
    );

    Ok(RunResult {
        run_id: config.run_id(),
        label: config.label(),
        signal_count: report.signals.len(),
        trade_count: report.simulation.trade_count(),
        config: config.clone(),
        report,
        bar_count,
    })
}

/// Run the same strategy parameters across many cached pairs in parallel.
///
/// Per-pair failures (missing cache, short series) are returned alongside
/// the successes; one bad pair never aborts the sweep.
pub fn run_universe(
    template: &RunConfig,
    cache: &ParquetCache,
    symbols: &[String],
) -> Vec<(String, Result<RunResult, RunError>)> {
    symbols
        .par_iter()
        .map(|symbol| {
            let config = RunConfig {
                symbol: symbol.clone(),
                ..template.clone()
            };
            (symbol.clone(), run_single_backtest(&config, cache))
        })
        .collect()
}
