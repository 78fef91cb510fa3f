//! Data layer: Binance fetch, Parquet cache, download orchestration.
//!
//! Everything here runs before the computation core and never inside it:
//! the core consumes an already-validated PriceSeries and does no I/O.

pub mod binance;
pub mod cache;
pub mod download;
pub mod provider;

pub use binance::BinanceProvider;
pub use cache::{CacheMeta, CacheStatus, ParquetCache};
pub use download::{download_pairs, DownloadSummary};
pub use provider::{
    DataError, DataProvider, DataSource, DownloadProgress, FetchResult, RawBar, StdoutProgress,
};

use crate::domain::{Bar, PriceSeries};
use crate::error::CoreError;

/// Promote raw cached bars to a validated PriceSeries.
///
/// Bars failing the OHLCV sanity check (NaN fields, inverted high/low,
/// non-positive prices) are dropped here; PriceSeries then enforces the
/// close and timestamp invariants on what survives.
pub fn to_price_series(symbol: &str, raw: Vec<RawBar>) -> Result<PriceSeries, CoreError> {
    let bars = raw
        .into_iter()
        .map(|b| Bar {
            timestamp: b.timestamp,
            open: b.open,
            high: b.high,
            low: b.low,
            close: b.close,
            volume: b.volume,
        })
        .filter(Bar::is_sane)
        .collect();
    PriceSeries::new(symbol, bars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn raw_bars_become_a_series() {
        let raw = vec![
            RawBar {
                timestamp: Utc.with_ymd_and_hms(2025, 2, 1, 0, 1, 0).unwrap(),
                open: 1.0,
                high: 1.2,
                low: 0.9,
                close: 1.1,
                volume: 2.0,
            },
            RawBar {
                timestamp: Utc.with_ymd_and_hms(2025, 2, 1, 0, 2, 0).unwrap(),
                open: 1.1,
                high: 1.3,
                low: 1.0,
                close: 0.0, // dropped
                volume: 2.0,
            },
        ];
        let series = to_price_series("ETHBTC", raw).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.symbol(), "ETHBTC");
    }

    #[test]
    fn insane_bars_are_dropped_before_series_construction() {
        let good = |minute: u32| RawBar {
            timestamp: Utc.with_ymd_and_hms(2025, 2, 1, 0, minute, 0).unwrap(),
            open: 1.0,
            high: 1.2,
            low: 0.9,
            close: 1.1,
            volume: 2.0,
        };
        let raw = vec![
            good(1),
            RawBar {
                high: 0.5, // inverted high/low
                ..good(2)
            },
            RawBar {
                volume: f64::NAN,
                ..good(3)
            },
            good(4),
        ];
        let series = to_price_series("ETHBTC", raw).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(
            series.timestamps(),
            vec![
                Utc.with_ymd_and_hms(2025, 2, 1, 0, 1, 0).unwrap(),
                Utc.with_ymd_and_hms(2025, 2, 1, 0, 4, 0).unwrap(),
            ]
        );
    }
}
