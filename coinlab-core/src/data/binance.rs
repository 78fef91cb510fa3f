//! Binance data provider.
//!
//! Two endpoints:
//! - `api.binance.com/api/v3/ticker/24hr` for liquid-pair discovery
//! - `data.binance.vision/data/spot/monthly/klines/{SYMBOL}/1m/...zip`
//!   for historical 1m candles (a ZIP wrapping a single headerless CSV)
//!
//! Binance publishes monthly archives with no authentication; a 404 means
//! the pair has no data for that month, which batch downloads treat as a
//! skip, not an abort.

use std::io::{Cursor, Read};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::provider::{DataError, DataProvider, DataSource, FetchResult, RawBar};

const API_BASE_URL: &str = "https://api.binance.com";
const VISION_BASE_URL: &str = "https://data.binance.vision";

/// One entry of the 24h ticker response. Binance serializes volumes as
/// strings.
#[derive(Debug, Deserialize)]
struct Ticker24h {
    symbol: String,
    #[serde(rename = "quoteVolume")]
    quote_volume: String,
}

/// Binance market data provider.
pub struct BinanceProvider {
    client: reqwest::blocking::Client,
}

impl BinanceProvider {
    pub fn new() -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent("coinlab/0.1")
            .build()
            .expect("failed to build HTTP client");

        Self { client }
    }

    fn archive_url(&self, symbol: &str, year: i32, month: u32) -> String {
        format!(
            "{VISION_BASE_URL}/data/spot/monthly/klines/{symbol}/1m/{symbol}-1m-{year}-{month:02}.zip"
        )
    }
}

impl Default for BinanceProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DataProvider for BinanceProvider {
    fn name(&self) -> &str {
        "binance"
    }

    fn fetch_month(
        &self,
        symbol: &str,
        year: i32,
        month: u32,
    ) -> Result<FetchResult, DataError> {
        let url = self.archive_url(symbol, year, month);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DataError::HttpStatus {
                symbol: symbol.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response
            .bytes()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;

        let bars = parse_kline_archive(&body)?;
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::BinanceVision,
        })
    }

    fn liquid_pairs(&self, quote: &str, limit: usize) -> Result<Vec<String>, DataError> {
        let url = format!("{API_BASE_URL}/api/v3/ticker/24hr");
        let tickers: Vec<Ticker24h> = self
            .client
            .get(&url)
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?
            .json()
            .map_err(|e| DataError::ResponseFormatChanged(e.to_string()))?;

        Ok(rank_by_quote_volume(tickers, quote, limit))
    }
}

/// Filter tickers to one quote asset and rank by 24h quote volume.
fn rank_by_quote_volume(tickers: Vec<Ticker24h>, quote: &str, limit: usize) -> Vec<String> {
    let mut pairs: Vec<(String, f64)> = tickers
        .into_iter()
        .filter(|t| t.symbol.ends_with(quote))
        .filter_map(|t| {
            let volume: f64 = t.quote_volume.parse().ok()?;
            Some((t.symbol, volume))
        })
        .collect();

    pairs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    pairs.truncate(limit);
    pairs.into_iter().map(|(symbol, _)| symbol).collect()
}

/// Unpack a monthly kline ZIP and parse its single CSV member.
pub fn parse_kline_archive(body: &[u8]) -> Result<Vec<RawBar>, DataError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(body))
        .map_err(|e| DataError::ArchiveError(e.to_string()))?;

    if archive.is_empty() {
        return Err(DataError::ArchiveError("empty archive".into()));
    }

    let mut member = archive
        .by_index(0)
        .map_err(|e| DataError::ArchiveError(e.to_string()))?;
    let mut csv_bytes = Vec::new();
    member
        .read_to_end(&mut csv_bytes)
        .map_err(|e| DataError::ArchiveError(e.to_string()))?;

    parse_kline_csv(&csv_bytes)
}

/// Parse headerless Binance kline CSV rows.
///
/// Columns: open_time, open, high, low, close, volume, close_time,
/// quote_volume, trade_count, taker_buy_base, taker_buy_quote, ignore.
/// Rows with unparseable timestamps are dropped (matching the original
/// loading policy); unparseable prices are a format error.
pub fn parse_kline_csv(bytes: &[u8]) -> Result<Vec<RawBar>, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut bars = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| DataError::CsvError(e.to_string()))?;
        if record.len() < 7 {
            return Err(DataError::CsvError(format!(
                "expected >= 7 kline columns, got {}",
                record.len()
            )));
        }

        let close_time: i64 = match record[6].trim().parse() {
            Ok(t) => t,
            Err(_) => continue, // drop rows with bad timestamps
        };
        let Some(timestamp) = kline_timestamp(close_time) else {
            continue;
        };

        let field = |i: usize| -> Result<f64, DataError> {
            record[i]
                .trim()
                .parse()
                .map_err(|_| DataError::CsvError(format!("bad numeric field: {:?}", &record[i])))
        };

        bars.push(RawBar {
            timestamp,
            open: field(1)?,
            high: field(2)?,
            low: field(3)?,
            close: field(4)?,
            volume: field(5)?,
        });
    }

    Ok(bars)
}

/// Binance switched monthly archives from millisecond to microsecond
/// epochs in 2025; disambiguate by magnitude.
fn kline_timestamp(raw: i64) -> Option<DateTime<Utc>> {
    if raw <= 0 {
        return None;
    }
    let millis = if raw > 100_000_000_000_000 {
        raw / 1_000
    } else {
        raw
    };
    DateTime::from_timestamp_millis(millis)
}
