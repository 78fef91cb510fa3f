//! Structured error types for the computation core.
//!
//! The core never substitutes numbers for invalid input (the one documented
//! exception is the zero-variance Sharpe fallback, which is a contract, not
//! an error). Everything else aborts the run with the stage that failed.

use thiserror::Error;

/// Errors raised by the signal/simulation/metrics core.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Bad strategy parameters (e.g., short window >= long window).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The price series is shorter than the required lookback.
    #[error("insufficient data: need at least {required} bars, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// A non-positive or NaN close reached the simulator. Upstream loading
    /// should have filtered these; the core still refuses to divide by them.
    #[error("invalid data at bar {index}: {reason}")]
    InvalidData { index: usize, reason: String },
}
