//! PriceSeries — an ordered, timestamp-indexed OHLCV sequence for one pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::bar::Bar;
use crate::error::CoreError;

/// Ordered sequence of bars for a single trading pair.
///
/// The constructor enforces the core invariants: strictly increasing
/// timestamps with no duplicates, and no non-positive closes (bars failing
/// the close check are dropped, matching the upstream loading policy).
/// The core only ever borrows a series read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<Bar>,
}

impl PriceSeries {
    /// Build a series from bars, dropping non-positive closes and
    /// validating timestamp order.
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, CoreError> {
        let bars: Vec<Bar> = bars
            .into_iter()
            .filter(|b| b.close.is_finite() && b.close > 0.0)
            .collect();

        for (i, pair) in bars.windows(2).enumerate() {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(CoreError::InvalidData {
                    index: i + 1,
                    reason: format!(
                        "timestamps must be strictly increasing ({} then {})",
                        pair[0].timestamp, pair[1].timestamp
                    ),
                });
            }
        }

        Ok(Self {
            symbol: symbol.into(),
            bars,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Closing prices in bar order.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Timestamps in bar order.
    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.bars.iter().map(|b| b.timestamp).collect()
    }
}
