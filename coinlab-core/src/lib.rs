//! Coinlab Core — crypto backtesting: domain types, SMA crossover signals,
//! equity simulation, metrics, and the data layer.
//!
//! The computation core (signal -> equity -> metrics) is single-threaded,
//! synchronous, and I/O-free. It borrows a caller-owned PriceSeries and
//! produces independently owned results, so independent backtests can run
//! in parallel with no coordination (the runner crate does exactly that
//! with rayon).

pub mod backtest;
pub mod data;
pub mod domain;
pub mod error;
pub mod indicators;
pub mod metrics;
pub mod signal;
pub mod sim;
pub mod strategy;

pub use backtest::{BacktestReport, BacktestRunner};
pub use error::CoreError;
pub use metrics::MetricsReport;
pub use sim::{CostModel, Simulation};
pub use strategy::Strategy;
