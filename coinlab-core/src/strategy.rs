//! Strategy capability interface.
//!
//! A strategy variant is an implementation of this trait, not a subclass
//! sharing mutable state: `generate_signals` is the only method a variant
//! must provide, while `simulate` and `compute_metrics` default to the
//! shared simulator and calculator so every variant is measured the same
//! way.

use crate::domain::PriceSeries;
use crate::error::CoreError;
use crate::metrics::MetricsReport;
use crate::signal::SignalRow;
use crate::sim::{self, CostModel, Simulation};

pub trait Strategy {
    /// Short machine-friendly name used in reports and run ids.
    fn name(&self) -> &str;

    /// Derive the aligned signal frame from a borrowed price series.
    fn generate_signals(&self, series: &PriceSeries) -> Result<Vec<SignalRow>, CoreError>;

    /// Turn the signal frame into realized returns and an equity curve.
    fn simulate(
        &self,
        signals: &[SignalRow],
        costs: Option<&CostModel>,
    ) -> Result<Simulation, CoreError> {
        sim::simulate(signals, costs)
    }

    /// Summarize a simulation into scalar metrics.
    fn compute_metrics(&self, simulation: &Simulation) -> MetricsReport {
        MetricsReport::compute(simulation)
    }
}
