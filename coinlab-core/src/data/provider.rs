//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over market data sources (Binance
//! monthly archives, CSV import, test fakes) so the download orchestrator
//! and cache never know which backend supplied the bars.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw OHLCV bar from a data provider, before series validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("provider returned HTTP {status} for {symbol}")]
    HttpStatus { symbol: String, status: u16 },

    #[error("archive error: {0}")]
    ArchiveError(String),

    #[error("csv parse error: {0}")]
    CsvError(String),

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("cache error: {0}")]
    CacheError(String),

    #[error("parquet I/O error: {0}")]
    ParquetError(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("no cached data for pair '{symbol}' — run `download` first")]
    NoCachedData { symbol: String },
}

/// Where a batch of bars came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    BinanceVision,
    Cache,
}

/// Result of a successful fetch for a single pair.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: String,
    pub bars: Vec<RawBar>,
    pub source: DataSource,
}

/// Trait for market data providers.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch one month of candles for a trading pair.
    fn fetch_month(&self, symbol: &str, year: i32, month: u32)
        -> Result<FetchResult, DataError>;

    /// Most liquid pairs quoted in `quote`, sorted by 24h quote volume
    /// descending, at most `limit` entries.
    fn liquid_pairs(&self, quote: &str, limit: usize) -> Result<Vec<String>, DataError>;
}

/// Progress callback for multi-pair downloads.
pub trait DownloadProgress: Send {
    fn on_start(&self, symbol: &str, index: usize, total: usize);

    fn on_complete(&self, symbol: &str, index: usize, total: usize, result: &Result<usize, DataError>);

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize);
}

/// Progress reporter that prints to stdout.
pub struct StdoutProgress;

impl DownloadProgress for StdoutProgress {
    fn on_start(&self, symbol: &str, index: usize, total: usize) {
        println!("[{}/{}] Fetching {symbol}...", index + 1, total);
    }

    fn on_complete(
        &self,
        symbol: &str,
        _index: usize,
        _total: usize,
        result: &Result<usize, DataError>,
    ) {
        match result {
            Ok(rows) => println!("  OK: {symbol} ({rows} bars)"),
            Err(e) => println!("  FAIL: {symbol}: {e}"),
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        println!("\nDownload complete: {succeeded}/{total} succeeded, {failed} failed");
    }
}
