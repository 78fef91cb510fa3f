//! SMA crossover signal generation.
//!
//! Long while the short moving average sits above the long moving average,
//! Exit otherwise. Bars where either average is undefined are excluded from
//! the output rather than zero-filled.

use serde::{Deserialize, Serialize};

use super::{Signal, SignalRow};
use crate::domain::PriceSeries;
use crate::error::CoreError;
use crate::indicators::rolling_sma;
use crate::strategy::Strategy;

/// SMA crossover strategy parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmaCrossover {
    pub short_window: usize,
    pub long_window: usize,
}

impl SmaCrossover {
    /// Validates window ordering up front; generation re-checks nothing.
    pub fn new(short_window: usize, long_window: usize) -> Result<Self, CoreError> {
        if short_window == 0 || long_window == 0 {
            return Err(CoreError::InvalidParameter(
                "window lengths must be positive".into(),
            ));
        }
        if short_window >= long_window {
            return Err(CoreError::InvalidParameter(format!(
                "short_window ({short_window}) must be < long_window ({long_window})"
            )));
        }
        Ok(Self {
            short_window,
            long_window,
        })
    }

    /// Original default parameterization: 20/100 on 1m candles.
    pub fn default_params() -> Self {
        Self {
            short_window: 20,
            long_window: 100,
        }
    }
}

impl Strategy for SmaCrossover {
    fn name(&self) -> &str {
        "sma_crossover"
    }

    fn generate_signals(&self, series: &PriceSeries) -> Result<Vec<SignalRow>, CoreError> {
        if series.len() < self.long_window {
            return Err(CoreError::InsufficientData {
                required: self.long_window,
                actual: series.len(),
            });
        }

        let closes = series.closes();
        let timestamps = series.timestamps();
        let short = rolling_sma(&closes, self.short_window);
        let long = rolling_sma(&closes, self.long_window);

        let rows = (0..closes.len())
            .filter(|&i| !short[i].is_nan() && !long[i].is_nan())
            .map(|i| SignalRow {
                timestamp: timestamps[i],
                close: closes[i],
                short_sma: short[i],
                long_sma: long[i],
                signal: if short[i] > long[i] {
                    Signal::Long
                } else {
                    Signal::Exit
                },
            })
            .collect();

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;
    use chrono::{TimeZone, Utc};

    fn make_series(closes: &[f64]) -> PriceSeries {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: Utc
                    .with_ymd_and_hms(2025, 2, 1, 0, 0, 0)
                    .unwrap()
                    + chrono::Duration::minutes(i as i64),
                open: close,
                high: close + 1.0,
                low: (close - 1.0).max(0.01),
                close,
                volume: 1.0,
            })
            .collect();
        PriceSeries::new("ETHBTC", bars).unwrap()
    }

    #[test]
    fn rejects_short_geq_long() {
        assert!(matches!(
            SmaCrossover::new(10, 10),
            Err(CoreError::InvalidParameter(_))
        ));
        assert!(matches!(
            SmaCrossover::new(50, 10),
            Err(CoreError::InvalidParameter(_))
        ));
    }

    #[test]
    fn rejects_zero_windows() {
        assert!(matches!(
            SmaCrossover::new(0, 10),
            Err(CoreError::InvalidParameter(_))
        ));
    }

    #[test]
    fn fails_on_series_shorter_than_long_window() {
        let strategy = SmaCrossover::new(2, 10).unwrap();
        let series = make_series(&[100.0, 101.0, 102.0]);
        let err = strategy.generate_signals(&series).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientData {
                required: 10,
                actual: 3
            }
        ));
    }

    #[test]
    fn excludes_warmup_bars() {
        let strategy = SmaCrossover::new(2, 3).unwrap();
        let series = make_series(&[100.0, 102.0, 101.0, 105.0, 107.0]);
        let rows = strategy.generate_signals(&series).unwrap();

        // First two bars lack a defined long SMA.
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].close, 101.0);
        assert_eq!(rows[2].close, 107.0);
    }

    #[test]
    fn worked_example_signal_values() {
        let strategy = SmaCrossover::new(2, 3).unwrap();
        let series = make_series(&[100.0, 102.0, 101.0, 105.0, 107.0]);
        let rows = strategy.generate_signals(&series).unwrap();

        // Bar 2: short=101.5 > long=101.0 -> Long
        assert!((rows[0].short_sma - 101.5).abs() < 1e-10);
        assert!((rows[0].long_sma - 101.0).abs() < 1e-10);
        assert_eq!(rows[0].signal, Signal::Long);

        // Bar 3: short=103.0 > long=102.667 -> Long
        assert_eq!(rows[1].signal, Signal::Long);

        // Bar 4: short=106.0 > long=104.333 -> Long
        assert_eq!(rows[2].signal, Signal::Long);
    }

    #[test]
    fn falling_series_yields_exits() {
        let strategy = SmaCrossover::new(2, 4).unwrap();
        let series = make_series(&[110.0, 108.0, 106.0, 104.0, 102.0, 100.0]);
        let rows = strategy.generate_signals(&series).unwrap();
        assert!(!rows.is_empty());
        assert!(rows.iter().all(|r| r.signal == Signal::Exit));
    }

    #[test]
    fn series_length_equal_to_long_window_yields_one_row() {
        let strategy = SmaCrossover::new(2, 5).unwrap();
        let series = make_series(&[100.0, 101.0, 102.0, 103.0, 104.0]);
        let rows = strategy.generate_signals(&series).unwrap();
        assert_eq!(rows.len(), 1);
    }
}
