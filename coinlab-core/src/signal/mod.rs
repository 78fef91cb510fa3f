//! Trading signals — per-bar discrete long/flat decisions.

pub mod sma_cross;

pub use sma_cross::SmaCrossover;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-bar discrete signal.
///
/// `Exit` means "go flat", never "go short". The simulator maps
/// Long -> position 1 and Exit -> position 0; position is never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    Long,
    Exit,
}

impl Signal {
    /// Position implied by this signal: 1 unit long or flat.
    pub fn position(self) -> u8 {
        match self {
            Signal::Long => 1,
            Signal::Exit => 0,
        }
    }
}

/// One row of the aligned signal frame: a surviving bar with both moving
/// averages defined and the signal observed at that bar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalRow {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub short_sma: f64,
    pub long_sma: f64,
    pub signal: Signal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_maps_to_position() {
        assert_eq!(Signal::Long.position(), 1);
        assert_eq!(Signal::Exit.position(), 0);
    }

    #[test]
    fn signal_serializes_as_name() {
        assert_eq!(serde_json::to_string(&Signal::Long).unwrap(), "\"Long\"");
        assert_eq!(serde_json::to_string(&Signal::Exit).unwrap(), "\"Exit\"");
    }
}
