//! Serializable backtest configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use coinlab_core::signal::SmaCrossover;
use coinlab_core::{CoreError, CostModel};

/// Unique identifier for a run configuration (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(#[from] CoreError),
}

/// Configuration for a single backtest run, loadable from TOML:
///
/// ```toml
/// symbol = "ETHBTC"
///
/// [strategy]
/// short_window = 20
/// long_window = 100
///
/// [costs]
/// fee = 0.001
/// slippage = 0.0005
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    pub symbol: String,
    pub strategy: StrategyParams,
    /// Absent means the cost-free simulation path.
    #[serde(default)]
    pub costs: Option<CostParams>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StrategyParams {
    pub short_window: usize,
    pub long_window: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CostParams {
    pub fee: f64,
    pub slippage: f64,
}

impl RunConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate by building the strategy and cost model the run will use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.build_strategy()?;
        self.build_costs()?;
        Ok(())
    }

    pub fn build_strategy(&self) -> Result<SmaCrossover, CoreError> {
        SmaCrossover::new(self.strategy.short_window, self.strategy.long_window)
    }

    pub fn build_costs(&self) -> Result<Option<CostModel>, CoreError> {
        self.costs
            .map(|c| CostModel::new(c.fee, c.slippage))
            .transpose()
    }

    /// Short human label, e.g. `sma_20_100`.
    pub fn label(&self) -> String {
        format!(
            "sma_{}_{}",
            self.strategy.short_window, self.strategy.long_window
        )
    }

    /// Deterministic hash id: identical configs share cached results.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_string(self).expect("RunConfig serialization failed");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}
