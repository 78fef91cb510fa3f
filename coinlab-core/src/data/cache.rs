//! Parquet price cache — one flat table per trading pair.
//!
//! Layout: `{cache_dir}/{SYMBOL}.parquet` plus a `{SYMBOL}.meta.json`
//! sidecar (date range, bar count, blake3 content hash, source).
//!
//! Writes are atomic: write to `.tmp`, rename into place. Directory
//! creation is an explicit `ensure_layout()` call from process startup,
//! never a side effect of loading this module.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::provider::{DataError, RawBar};

/// Metadata sidecar for a cached pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMeta {
    pub symbol: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub bar_count: usize,
    pub data_hash: String,
    pub source: String,
    pub cached_at: DateTime<Utc>,
}

/// Cache status for a single pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStatus {
    pub symbol: String,
    pub cached: bool,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub bar_count: Option<usize>,
}

/// The Parquet cache.
pub struct ParquetCache {
    cache_dir: PathBuf,
}

impl ParquetCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Create the cache directory. Called once at process start.
    pub fn ensure_layout(&self) -> Result<(), DataError> {
        fs::create_dir_all(&self.cache_dir)
            .map_err(|e| DataError::CacheError(format!("failed to create cache dir: {e}")))
    }

    fn table_path(&self, symbol: &str) -> PathBuf {
        self.cache_dir.join(format!("{symbol}.parquet"))
    }

    fn meta_path(&self, symbol: &str) -> PathBuf {
        self.cache_dir.join(format!("{symbol}.meta.json"))
    }

    /// Write all bars for a pair, replacing any previous table.
    pub fn write(&self, symbol: &str, bars: &[RawBar], source: &str) -> Result<(), DataError> {
        if bars.is_empty() {
            return Err(DataError::CacheError("no bars to cache".into()));
        }
        self.ensure_layout()?;

        let df = bars_to_dataframe(bars)?;
        let path = self.table_path(symbol);
        let tmp_path = path.with_extension("parquet.tmp");

        write_parquet(&df, &tmp_path)?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::CacheError(format!("atomic rename failed: {e}"))
        })?;

        let meta = CacheMeta {
            symbol: symbol.to_string(),
            start: bars.first().map(|b| b.timestamp).unwrap_or_default(),
            end: bars.last().map(|b| b.timestamp).unwrap_or_default(),
            bar_count: bars.len(),
            data_hash: blake3::hash(
                &serde_json::to_vec(bars)
                    .map_err(|e| DataError::CacheError(format!("hash serialization: {e}")))?,
            )
            .to_hex()
            .to_string(),
            source: source.to_string(),
            cached_at: Utc::now(),
        };
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| DataError::CacheError(format!("meta serialization: {e}")))?;
        fs::write(self.meta_path(symbol), meta_json)
            .map_err(|e| DataError::CacheError(format!("meta write: {e}")))?;

        Ok(())
    }

    /// Load all cached bars for a pair, sorted by timestamp ascending.
    pub fn load(&self, symbol: &str) -> Result<Vec<RawBar>, DataError> {
        let path = self.table_path(symbol);
        if !path.exists() {
            return Err(DataError::NoCachedData {
                symbol: symbol.to_string(),
            });
        }

        let mut bars = load_and_validate_parquet(&path)?;
        bars.sort_by_key(|b| b.timestamp);
        Ok(bars)
    }

    /// Metadata for a cached pair, if present and readable.
    pub fn get_meta(&self, symbol: &str) -> Option<CacheMeta> {
        let content = fs::read_to_string(self.meta_path(symbol)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Which pairs have cached data, and their ranges.
    pub fn status(&self, symbols: &[&str]) -> Vec<CacheStatus> {
        symbols
            .iter()
            .map(|sym| {
                let meta = self.get_meta(sym);
                CacheStatus {
                    symbol: sym.to_string(),
                    cached: self.table_path(sym).exists(),
                    start: meta.as_ref().map(|m| m.start),
                    end: meta.as_ref().map(|m| m.end),
                    bar_count: meta.as_ref().map(|m| m.bar_count),
                }
            })
            .collect()
    }

    /// All pairs with a cached table, sorted by symbol.
    pub fn cached_symbols(&self) -> Result<Vec<String>, DataError> {
        if !self.cache_dir.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.cache_dir)
            .map_err(|e| DataError::CacheError(format!("read dir: {e}")))?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| DataError::CacheError(format!("dir entry: {e}")))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("parquet") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    symbols.push(stem.to_string());
                }
            }
        }
        symbols.sort();
        Ok(symbols)
    }
}

// ── Parquet I/O helpers ─────────────────────────────────────────────

/// Convert raw bars to a Polars DataFrame. Timestamps are stored as
/// epoch-millisecond Int64 (flat table, no datetime dtype dependence).
fn bars_to_dataframe(bars: &[RawBar]) -> Result<DataFrame, DataError> {
    let timestamps: Vec<i64> = bars.iter().map(|b| b.timestamp.timestamp_millis()).collect();
    let opens: Vec<f64> = bars.iter().map(|b| b.open).collect();
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();

    DataFrame::new(vec![
        Column::new("timestamp".into(), timestamps),
        Column::new("open".into(), opens),
        Column::new("high".into(), highs),
        Column::new("low".into(), lows),
        Column::new("close".into(), closes),
        Column::new("volume".into(), volumes),
    ])
    .map_err(|e| DataError::ParquetError(format!("dataframe creation: {e}")))
}

fn write_parquet(df: &DataFrame, path: &Path) -> Result<(), DataError> {
    let file =
        fs::File::create(path).map_err(|e| DataError::ParquetError(format!("create file: {e}")))?;
    ParquetWriter::new(file)
        .finish(&mut df.clone())
        .map_err(|e| DataError::ParquetError(format!("write parquet: {e}")))?;
    Ok(())
}

fn load_and_validate_parquet(path: &Path) -> Result<Vec<RawBar>, DataError> {
    let file = fs::File::open(path).map_err(|e| DataError::ParquetError(format!("open: {e}")))?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| DataError::ParquetError(format!("read: {e}")))?;

    if df.height() == 0 {
        return Err(DataError::ValidationError("empty parquet file".into()));
    }
    for col_name in ["timestamp", "open", "high", "low", "close", "volume"] {
        if df.column(col_name).is_err() {
            return Err(DataError::ValidationError(format!(
                "missing column '{col_name}'"
            )));
        }
    }

    dataframe_to_bars(&df)
}

fn dataframe_to_bars(df: &DataFrame) -> Result<Vec<RawBar>, DataError> {
    let map_err = |e: PolarsError| DataError::ParquetError(format!("column read: {e}"));

    let ts_ca = df.column("timestamp").map_err(map_err)?.i64().map_err(map_err)?;
    let open_ca = df.column("open").map_err(map_err)?.f64().map_err(map_err)?;
    let high_ca = df.column("high").map_err(map_err)?.f64().map_err(map_err)?;
    let low_ca = df.column("low").map_err(map_err)?.f64().map_err(map_err)?;
    let close_ca = df.column("close").map_err(map_err)?.f64().map_err(map_err)?;
    let vol_ca = df.column("volume").map_err(map_err)?.f64().map_err(map_err)?;

    let n = df.height();
    let mut bars = Vec::with_capacity(n);

    for i in 0..n {
        let millis = ts_ca
            .get(i)
            .ok_or_else(|| DataError::ParquetError(format!("null timestamp at row {i}")))?;
        let timestamp = DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| DataError::ParquetError(format!("invalid timestamp: {millis}")))?;

        bars.push(RawBar {
            timestamp,
            open: open_ca.get(i).unwrap_or(f64::NAN),
            high: high_ca.get(i).unwrap_or(f64::NAN),
            low: low_ca.get(i).unwrap_or(f64::NAN),
            close: close_ca.get(i).unwrap_or(f64::NAN),
            volume: vol_ca.get(i).unwrap_or(f64::NAN),
        });
    }

    Ok(bars)
}
