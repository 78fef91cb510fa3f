//! Performance metrics — pure functions over the simulated return and
//! equity series.
//!
//! All definitions are bar-level, one consistent convention: win rate,
//! expectancy, and exposure are computed over realized per-bar returns and
//! positions, never over extracted trades.

use serde::{Deserialize, Serialize};

use crate::sim::Simulation;

/// Trading-day annualization convention, fixed for this instrument class.
pub const ANNUALIZATION_FACTOR: f64 = 252.0;

/// Scalar performance summary for a single backtest run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    /// Final equity minus 1.
    pub total_return: f64,
    /// Annualized mean/stddev of realized returns; exactly 0.0 on a
    /// zero-variance series (documented fail-safe, never NaN).
    pub sharpe_ratio: f64,
    /// Peak-to-trough equity decline, in (-1, 0].
    pub max_drawdown: f64,
    /// Fraction of nonzero-return bars with positive return.
    pub win_rate: f64,
    /// Mean realized return over bars held with a position.
    pub expectancy: f64,
    /// Fraction of bars with a nonzero position.
    pub exposure_time: f64,
}

impl MetricsReport {
    /// Compute all metrics from a simulation. An empty simulation yields
    /// all zeros (valid empty-result case, not an error).
    pub fn compute(sim: &Simulation) -> Self {
        let returns = sim.returns();
        Self {
            total_return: sim.final_equity() - 1.0,
            sharpe_ratio: sharpe_ratio(returns),
            max_drawdown: max_drawdown(&sim.equity),
            win_rate: win_rate(returns),
            expectancy: expectancy(sim),
            exposure_time: exposure_time(&sim.positions),
        }
    }

    /// All fields finite (no NaN/inf ever escapes the calculator).
    pub fn is_finite(&self) -> bool {
        self.total_return.is_finite()
            && self.sharpe_ratio.is_finite()
            && self.max_drawdown.is_finite()
            && self.win_rate.is_finite()
            && self.expectancy.is_finite()
            && self.exposure_time.is_finite()
    }
}

/// Annualized Sharpe ratio: mean(r) / stddev(r) * sqrt(252).
///
/// Fails safe to exactly 0.0 when the return series has zero variance or
/// fewer than 2 observations. This is a deliberate contract, not an
/// omission: a degenerate series is not an error.
pub fn sharpe_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let std = std_dev(returns);
    if std < 1e-15 {
        return 0.0;
    }
    mean(returns) / std * ANNUALIZATION_FACTOR.sqrt()
}

/// Maximum drawdown: min over bars of equity / running peak - 1.
///
/// Non-positive; 0.0 means the curve never fell below a prior peak.
pub fn max_drawdown(equity: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;

    for &e in equity {
        if e > peak {
            peak = e;
        }
        let dd = e / peak - 1.0;
        if dd < max_dd {
            max_dd = dd;
        }
    }
    max_dd
}

/// Win rate: count(r > 0) / count(r != 0).
///
/// Bars with exactly-zero realized return (flat position or unchanged
/// price) are excluded from the denominator; 0.0 when no bar qualifies.
pub fn win_rate(returns: &[f64]) -> f64 {
    let nonzero = returns.iter().filter(|&&r| r != 0.0).count();
    if nonzero == 0 {
        return 0.0;
    }
    let winners = returns.iter().filter(|&&r| r > 0.0).count();
    winners as f64 / nonzero as f64
}

/// Expectancy: mean realized return over bars where a position was held.
///
/// Bar-level by decision (see DESIGN.md): the return earned arriving at
/// bar i counts when the position decided at bar i-1 was long.
pub fn expectancy(sim: &Simulation) -> f64 {
    if sim.realized.len() < 2 {
        return 0.0;
    }
    let exposed: Vec<f64> = sim.realized[1..]
        .iter()
        .zip(sim.positions.iter())
        .filter(|(_, p)| **p != 0)
        .map(|(r, _)| *r)
        .collect();
    if exposed.is_empty() {
        return 0.0;
    }
    mean(&exposed)
}

/// Exposure time: fraction of bars with a nonzero position.
pub fn exposure_time(positions: &[u8]) -> f64 {
    if positions.is_empty() {
        return 0.0;
    }
    let held = positions.iter().filter(|&&p| p != 0).count();
    held as f64 / positions.len() as f64
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-12, "expected {b}, got {a}");
    }

    fn sim_from(positions: Vec<u8>, realized: Vec<f64>, equity: Vec<f64>) -> Simulation {
        Simulation {
            positions,
            realized,
            equity,
        }
    }

    // ── Sharpe ──

    #[test]
    fn sharpe_zero_variance_is_exactly_zero() {
        // All returns identical -> stddev 0 -> fail-safe to 0, never NaN/inf.
        let returns = vec![0.01; 50];
        assert_eq!(sharpe_ratio(&returns), 0.0);
    }

    #[test]
    fn sharpe_all_zero_returns_is_zero() {
        assert_eq!(sharpe_ratio(&[0.0; 20]), 0.0);
    }

    #[test]
    fn sharpe_single_observation_is_zero() {
        assert_eq!(sharpe_ratio(&[0.05]), 0.0);
        assert_eq!(sharpe_ratio(&[]), 0.0);
    }

    #[test]
    fn sharpe_known_value() {
        // returns [0.01, 0.03]: mean 0.02, sample std = sqrt(2e-4) ≈ 0.014142
        let returns = [0.01, 0.03];
        let expected = 0.02 / (0.0002_f64).sqrt() * 252.0_f64.sqrt();
        approx(sharpe_ratio(&returns), expected);
    }

    #[test]
    fn sharpe_sign_follows_mean() {
        assert!(sharpe_ratio(&[0.01, 0.02, 0.015, 0.03]) > 0.0);
        assert!(sharpe_ratio(&[-0.01, -0.02, -0.015, -0.03]) < 0.0);
    }

    // ── Max drawdown ──

    #[test]
    fn max_drawdown_known() {
        let equity = vec![1.0, 1.1, 0.9, 0.95];
        approx(max_drawdown(&equity), 0.9 / 1.1 - 1.0);
    }

    #[test]
    fn max_drawdown_monotonic_rise_is_zero() {
        let equity: Vec<f64> = (0..50).map(|i| 1.0 + i as f64 * 0.01).collect();
        assert_eq!(max_drawdown(&equity), 0.0);
    }

    #[test]
    fn max_drawdown_empty_is_zero() {
        assert_eq!(max_drawdown(&[]), 0.0);
    }

    #[test]
    fn max_drawdown_in_valid_range() {
        let equity = vec![1.0, 0.5, 0.25, 0.1, 0.9];
        let dd = max_drawdown(&equity);
        assert!(dd > -1.0 && dd <= 0.0);
    }

    // ── Win rate ──

    #[test]
    fn win_rate_excludes_zero_return_bars() {
        // Two winners, one loser, three zeros -> 2/3.
        let returns = [0.01, 0.0, -0.02, 0.0, 0.03, 0.0];
        approx(win_rate(&returns), 2.0 / 3.0);
    }

    #[test]
    fn win_rate_all_zero_is_zero() {
        assert_eq!(win_rate(&[0.0, 0.0, 0.0]), 0.0);
        assert_eq!(win_rate(&[]), 0.0);
    }

    // ── Expectancy / exposure ──

    #[test]
    fn expectancy_over_exposed_bars_only() {
        // positions decided at bars 0..3; realized[1..] pairs with
        // positions[0..]: bar 1 return earned by position[0], etc.
        let sim = sim_from(
            vec![1, 1, 0, 0],
            vec![0.0, 0.02, 0.04, -1.0],
            vec![1.0, 1.02, 1.0608, 1.0608],
        );
        // Exposed returns: realized[1] (pos[0]=1), realized[2] (pos[1]=1).
        approx(expectancy(&sim), (0.02 + 0.04) / 2.0);
    }

    #[test]
    fn expectancy_never_exposed_is_zero() {
        let sim = sim_from(vec![0, 0, 0], vec![0.0, 0.0, 0.0], vec![1.0, 1.0, 1.0]);
        assert_eq!(expectancy(&sim), 0.0);
    }

    #[test]
    fn exposure_time_fraction() {
        approx(exposure_time(&[1, 1, 0, 0]), 0.5);
        assert_eq!(exposure_time(&[]), 0.0);
        approx(exposure_time(&[1, 1, 1]), 1.0);
    }

    // ── Aggregate ──

    #[test]
    fn empty_simulation_yields_zeroed_report() {
        let report = MetricsReport::compute(&Simulation::default());
        assert_eq!(report.total_return, 0.0);
        assert_eq!(report.sharpe_ratio, 0.0);
        assert_eq!(report.max_drawdown, 0.0);
        assert_eq!(report.win_rate, 0.0);
        assert_eq!(report.expectancy, 0.0);
        assert_eq!(report.exposure_time, 0.0);
        assert!(report.is_finite());
    }

    #[test]
    fn total_return_recoverable_from_equity() {
        let sim = sim_from(
            vec![1, 1, 1],
            vec![0.0, 0.05, 0.02],
            vec![1.0, 1.05, 1.071],
        );
        let report = MetricsReport::compute(&sim);
        approx(report.total_return, 1.071 - 1.0);
        assert!(report.is_finite());
    }
}
