//! Download orchestrator — multi-pair fetches with progress reporting.
//!
//! A failed pair is recorded and skipped; the batch never aborts on a
//! single bad symbol (pairs without a published archive for the requested
//! month are common).

use tracing::{info, warn};

use super::cache::ParquetCache;
use super::provider::{DataError, DataProvider, DataSource, DownloadProgress, FetchResult};

/// Summary of a multi-pair download batch.
#[derive(Debug)]
pub struct DownloadSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub errors: Vec<(String, DataError)>,
}

/// Download one month of candles for each pair and cache them.
///
/// Pairs already in the cache are served from it rather than re-fetched;
/// `force` bypasses that and hits the network for every pair.
pub fn download_pairs(
    provider: &dyn DataProvider,
    cache: &ParquetCache,
    symbols: &[String],
    year: i32,
    month: u32,
    force: bool,
    progress: &dyn DownloadProgress,
) -> DownloadSummary {
    let total = symbols.len();
    let mut succeeded = 0;
    let mut failed = 0;
    let mut errors: Vec<(String, DataError)> = Vec::new();

    for (i, symbol) in symbols.iter().enumerate() {
        progress.on_start(symbol, i, total);

        let result = download_single(provider, cache, symbol, year, month, force);
        progress.on_complete(symbol, i, total, &result);

        match result {
            Ok(rows) => {
                info!(symbol, rows, "cached pair");
                succeeded += 1;
            }
            Err(e) => {
                warn!(symbol, error = %e, "skipping pair");
                errors.push((symbol.clone(), e));
                failed += 1;
            }
        }
    }

    progress.on_batch_complete(succeeded, failed, total);

    DownloadSummary {
        total,
        succeeded,
        failed,
        errors,
    }
}

/// Fetch -> validate -> cache for one pair. Returns the cached row count.
fn download_single(
    provider: &dyn DataProvider,
    cache: &ParquetCache,
    symbol: &str,
    year: i32,
    month: u32,
    force: bool,
) -> Result<usize, DataError> {
    let fetched = fetch_or_cached(provider, cache, symbol, year, month, force)?;
    if fetched.bars.is_empty() {
        return Err(DataError::ValidationError(format!(
            "archive for {symbol} {year}-{month:02} contained no rows"
        )));
    }
    if fetched.source != DataSource::Cache {
        cache.write(symbol, &fetched.bars, provider.name())?;
    }
    Ok(fetched.bars.len())
}

/// Serve an already-cached pair from the cache; otherwise go to the
/// provider. `force` always goes to the provider.
fn fetch_or_cached(
    provider: &dyn DataProvider,
    cache: &ParquetCache,
    symbol: &str,
    year: i32,
    month: u32,
    force: bool,
) -> Result<FetchResult, DataError> {
    if !force && cache.get_meta(symbol).is_some() {
        let bars = cache.load(symbol)?;
        info!(symbol, rows = bars.len(), "serving from cache");
        return Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::Cache,
        });
    }
    provider.fetch_month(symbol, year, month)
}
