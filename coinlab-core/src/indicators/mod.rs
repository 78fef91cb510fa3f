//! Indicators used by the signal layer.

pub mod sma;

pub use sma::rolling_sma;

#[cfg(test)]
pub(crate) const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
pub(crate) fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "expected {expected}, got {actual}"
    );
}
