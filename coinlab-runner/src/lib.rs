//! CoinLab runner — backtest orchestration and reporting.
//!
//! Builds on `coinlab-core` to provide:
//! - TOML run configuration with deterministic run IDs
//! - Single-pair and multi-pair (rayon) backtest execution
//! - Artifact writers: result JSON, performance CSV, equity/comparison SVG,
//!   cross-strategy markdown

pub mod config;
pub mod report;
pub mod runner;

pub use config::{ConfigError, CostParams, RunConfig, RunId, StrategyParams};
pub use runner::{run_single_backtest, run_universe, RunError, RunResult};
