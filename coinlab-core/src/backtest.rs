//! Backtest orchestration: validate -> generate -> simulate -> metrics.
//!
//! One runner instance processes one borrowed price series to completion,
//! single-threaded and without I/O. A failure in any stage aborts the run
//! and surfaces the originating error unchanged; partial results are never
//! reported as success.

use serde::{Deserialize, Serialize};

use crate::domain::PriceSeries;
use crate::error::CoreError;
use crate::metrics::MetricsReport;
use crate::signal::SignalRow;
use crate::sim::{CostModel, Simulation};
use crate::strategy::Strategy;

/// Everything a single run produces, exposed to external reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    pub strategy: String,
    pub symbol: String,
    pub signals: Vec<SignalRow>,
    pub simulation: Simulation,
    pub metrics: MetricsReport,
}

/// Runs one strategy instance over one price series.
pub struct BacktestRunner<'a, S: Strategy> {
    strategy: S,
    series: &'a PriceSeries,
    costs: Option<CostModel>,
}

impl<'a, S: Strategy> BacktestRunner<'a, S> {
    pub fn new(strategy: S, series: &'a PriceSeries) -> Self {
        Self {
            strategy,
            series,
            costs: None,
        }
    }

    /// Enable the fee/slippage-aware simulation path.
    pub fn with_costs(mut self, costs: CostModel) -> Self {
        self.costs = Some(costs);
        self
    }

    pub fn run(&self) -> Result<BacktestReport, CoreError> {
        let signals = self.strategy.generate_signals(self.series)?;
        let simulation = self.strategy.simulate(&signals, self.costs.as_ref())?;
        let metrics = self.strategy.compute_metrics(&simulation);

        Ok(BacktestReport {
            strategy: self.strategy.name().to_string(),
            symbol: self.series.symbol().to_string(),
            signals,
            simulation,
            metrics,
        })
    }
}
