//! Simple Moving Average (SMA).
//!
//! Rolling mean of the trailing `period` closes. The first `period - 1`
//! slots are NaN (undefined, not zero-filled); the signal layer excludes
//! those bars rather than trading on them.

/// Compute a rolling SMA over `closes`, returning one value per input slot.
///
/// Runs the window sum incrementally. Callers guarantee finite inputs
/// (PriceSeries drops non-positive/NaN closes), so no NaN rescan is needed
/// past the warmup region.
pub fn rolling_sma(closes: &[f64], period: usize) -> Vec<f64> {
    let n = closes.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period {
        return result;
    }

    let mut sum: f64 = closes.iter().take(period).sum();
    result[period - 1] = sum / period as f64;

    for i in period..n {
        sum = sum - closes[i - period] + closes[i];
        result[i] = sum / period as f64;
    }

    result
}
