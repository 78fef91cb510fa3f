//! Bar — the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single trading pair at a single candle interval.
///
/// Timestamps are UTC (Binance kline close times, millisecond precision on
/// the wire). Volume is fractional because crypto base quantities are.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Returns true if any OHLCV field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan()
            || self.high.is_nan()
            || self.low.is_nan()
            || self.close.is_nan()
            || self.volume.is_nan()
    }

    /// Basic OHLCV sanity check: positive close, high >= low, extremes
    /// bracket open and close.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_bar() -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2025, 2, 1, 0, 1, 0).unwrap(),
            open: 100.0,
            high: 105.0,
            low: 98.0,
            close: 103.0,
            volume: 12.5,
        }
    }

    #[test]
    fn bar_is_sane() {
        assert!(sample_bar().is_sane());
    }

    #[test]
    fn bar_detects_void() {
        let mut bar = sample_bar();
        bar.close = f64::NAN;
        assert!(bar.is_void());
        assert!(!bar.is_sane());
    }

    #[test]
    fn bar_detects_insane_high_low() {
        let mut bar = sample_bar();
        bar.high = 97.0; // below low
        assert!(!bar.is_sane());
    }

    #[test]
    fn bar_rejects_non_positive_close() {
        let mut bar = sample_bar();
        bar.close = 0.0;
        bar.low = 0.0;
        assert!(!bar.is_sane());
    }

    #[test]
    fn bar_serialization_roundtrip() {
        let bar = sample_bar();
        let json = serde_json::to_string(&bar).unwrap();
        let deser: Bar = serde_json::from_str(&json).unwrap();
        assert_eq!(bar.timestamp, deser.timestamp);
        assert_eq!(bar.close, deser.close);
    }
}
