//! Equity simulation — the signal-to-equity core.
//!
//! Converts an aligned signal frame into a realized-return and equity-curve
//! sequence for a single fully-invested-or-flat position with one-bar
//! execution lag: the signal observed at bar i only affects the return
//! realized over (i, i+1].

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::signal::SignalRow;

/// Proportional transaction costs charged on each position change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    /// Proportional fee per trade (e.g., 0.001 = 10 bps).
    pub fee: f64,
    /// Proportional slippage per trade (e.g., 0.0005 = 5 bps).
    pub slippage: f64,
}

impl CostModel {
    pub fn new(fee: f64, slippage: f64) -> Result<Self, CoreError> {
        if !fee.is_finite() || !slippage.is_finite() || fee < 0.0 || slippage < 0.0 {
            return Err(CoreError::InvalidParameter(format!(
                "fee ({fee}) and slippage ({slippage}) must be finite and non-negative"
            )));
        }
        if fee + slippage >= 1.0 {
            return Err(CoreError::InvalidParameter(format!(
                "fee + slippage ({}) must be < 1",
                fee + slippage
            )));
        }
        Ok(Self { fee, slippage })
    }

    /// Combined equity haircut per position change.
    pub fn per_trade(&self) -> f64 {
        self.fee + self.slippage
    }
}

/// Output of one simulation run, aligned row-for-row with the input
/// signal frame.
///
/// `realized[0]` is 0.0 and `equity[0]` starts at 1.0: the first signal bar
/// has no prior position, so no return is earned arriving at it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Simulation {
    /// Position held over the interval starting at each bar (0 or 1).
    pub positions: Vec<u8>,
    /// Realized per-bar return, lagged one bar behind the signal.
    pub realized: Vec<f64>,
    /// Cumulative equity multiplier, starting at 1.0.
    pub equity: Vec<f64>,
}

impl Simulation {
    pub fn len(&self) -> usize {
        self.equity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.equity.is_empty()
    }

    /// The return series metrics are computed over (first bar excluded).
    pub fn returns(&self) -> &[f64] {
        if self.realized.is_empty() {
            &[]
        } else {
            &self.realized[1..]
        }
    }

    pub fn final_equity(&self) -> f64 {
        self.equity.last().copied().unwrap_or(1.0)
    }

    /// Number of position changes (entries + exits).
    pub fn trade_count(&self) -> usize {
        let mut prev = 0u8;
        let mut count = 0;
        for &p in &self.positions {
            if p != prev {
                count += 1;
            }
            prev = p;
        }
        count
    }
}

/// Run the simulation over an aligned signal frame.
///
/// With `costs` set, every position change multiplies equity by
/// `1 - fee - slippage` after that bar's return compounds, so the haircut
/// takes effect before the next bar's return. The run starts flat, so a
/// leading Long row is charged as an entry. A position still open at the
/// end of the frame is NOT charged an implicit exit.
///
/// An empty frame is a valid input and yields an empty simulation.
pub fn simulate(rows: &[SignalRow], costs: Option<&CostModel>) -> Result<Simulation, CoreError> {
    let haircut = costs.map(|c| 1.0 - c.per_trade());

    let n = rows.len();
    let mut positions = Vec::with_capacity(n);
    let mut realized = Vec::with_capacity(n);
    let mut equity = Vec::with_capacity(n);

    let mut prev_position = 0u8;
    let mut prev_close = f64::NAN;
    let mut running = 1.0_f64;

    for (i, row) in rows.iter().enumerate() {
        if !row.close.is_finite() || row.close <= 0.0 {
            return Err(CoreError::InvalidData {
                index: i,
                reason: format!("non-positive or missing close ({})", row.close),
            });
        }

        let position = row.signal.position();

        if i == 0 {
            realized.push(0.0);
        } else {
            let raw = row.close / prev_close - 1.0;
            let r = raw * f64::from(prev_position);
            realized.push(r);
            running *= 1.0 + r;
        }

        if position != prev_position {
            if let Some(h) = haircut {
                running *= h;
            }
        }

        positions.push(position);
        equity.push(running);
        prev_position = position;
        prev_close = row.close;
    }

    Ok(Simulation {
        positions,
        realized,
        equity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::Signal;
    use chrono::{TimeZone, Utc};

    fn make_rows(closes: &[f64], signals: &[Signal]) -> Vec<SignalRow> {
        assert_eq!(closes.len(), signals.len());
        closes
            .iter()
            .zip(signals)
            .enumerate()
            .map(|(i, (&close, &signal))| SignalRow {
                timestamp: Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap()
                    + chrono::Duration::minutes(i as i64),
                close,
                short_sma: close,
                long_sma: close,
                signal,
            })
            .collect()
    }

    fn approx(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-12, "expected {b}, got {a}");
    }

    #[test]
    fn empty_frame_is_empty_simulation() {
        let sim = simulate(&[], None).unwrap();
        assert!(sim.is_empty());
        assert_eq!(sim.trade_count(), 0);
        assert_eq!(sim.final_equity(), 1.0);
    }

    #[test]
    fn single_row_has_no_returns() {
        let rows = make_rows(&[100.0], &[Signal::Long]);
        let sim = simulate(&rows, None).unwrap();
        assert_eq!(sim.equity, vec![1.0]);
        assert_eq!(sim.realized, vec![0.0]);
        assert!(sim.returns().is_empty());
    }

    #[test]
    fn lag_applies_prior_bar_position() {
        // Bar 0 is Exit (flat), so the 10% move into bar 1 is not captured.
        // Bar 1 is Long, so the move into bar 2 is.
        let rows = make_rows(
            &[100.0, 110.0, 121.0],
            &[Signal::Exit, Signal::Long, Signal::Long],
        );
        let sim = simulate(&rows, None).unwrap();
        approx(sim.realized[1], 0.0);
        approx(sim.realized[2], 0.1);
        approx(sim.final_equity(), 1.1);
    }

    #[test]
    fn always_long_equity_is_compounded_price_ratio() {
        let closes = [100.0, 102.0, 104.0, 108.0];
        let rows = make_rows(&closes, &[Signal::Long; 4]);
        let sim = simulate(&rows, None).unwrap();
        approx(sim.final_equity(), 108.0 / 100.0);
    }

    #[test]
    fn all_exit_equity_stays_at_one() {
        let rows = make_rows(&[100.0, 90.0, 120.0], &[Signal::Exit; 3]);
        let sim = simulate(&rows, None).unwrap();
        assert!(sim.equity.iter().all(|&e| e == 1.0));
        assert!(sim.realized.iter().all(|&r| r == 0.0));
        assert_eq!(sim.trade_count(), 0);
    }

    #[test]
    fn constant_prices_yield_unit_equity_regardless_of_signal() {
        let rows = make_rows(
            &[100.0, 100.0, 100.0, 100.0],
            &[Signal::Long, Signal::Exit, Signal::Long, Signal::Long],
        );
        let sim = simulate(&rows, None).unwrap();
        assert!(sim.realized.iter().all(|&r| r == 0.0));
        assert!(sim.equity.iter().all(|&e| e == 1.0));
    }

    #[test]
    fn entry_cost_applies_before_next_return() {
        let cost = CostModel::new(0.001, 0.0005).unwrap();
        let rows = make_rows(&[100.0, 110.0], &[Signal::Long, Signal::Long]);
        let sim = simulate(&rows, Some(&cost)).unwrap();
        approx(sim.equity[0], 0.9985);
        approx(sim.equity[1], 0.9985 * 1.1);
    }

    #[test]
    fn buy_and_hold_paths_differ_only_by_entry_cost() {
        let cost = CostModel::new(0.001, 0.0005).unwrap();
        let closes = [100.0, 103.0, 101.0, 106.0];
        let rows = make_rows(&closes, &[Signal::Long; 4]);

        let free = simulate(&rows, None).unwrap();
        let costed = simulate(&rows, Some(&cost)).unwrap();

        assert_eq!(costed.trade_count(), 1);
        for (e_free, e_cost) in free.equity.iter().zip(&costed.equity) {
            approx(e_cost / e_free, 0.9985);
        }
    }

    #[test]
    fn no_terminal_exit_cost_for_open_position() {
        let cost = CostModel::new(0.01, 0.0).unwrap();
        let rows = make_rows(&[100.0, 100.0], &[Signal::Long, Signal::Long]);
        let sim = simulate(&rows, Some(&cost)).unwrap();
        // One entry hit only; the position left open at series end is free.
        approx(sim.final_equity(), 0.99);
    }

    #[test]
    fn round_trip_charges_entry_and_exit() {
        let cost = CostModel::new(0.001, 0.0005).unwrap();
        let rows = make_rows(
            &[100.0, 100.0, 100.0],
            &[Signal::Long, Signal::Exit, Signal::Exit],
        );
        let sim = simulate(&rows, Some(&cost)).unwrap();
        assert_eq!(sim.trade_count(), 2);
        approx(sim.final_equity(), 0.9985 * 0.9985);
    }

    #[test]
    fn cost_path_never_above_cost_free_path() {
        let cost = CostModel::new(0.001, 0.0005).unwrap();
        let rows = make_rows(
            &[100.0, 105.0, 103.0, 108.0, 104.0, 110.0],
            &[
                Signal::Exit,
                Signal::Long,
                Signal::Long,
                Signal::Exit,
                Signal::Long,
                Signal::Long,
            ],
        );
        let free = simulate(&rows, None).unwrap();
        let costed = simulate(&rows, Some(&cost)).unwrap();
        // Bar 0 precedes the first trade (the entry fires at bar 1).
        assert_eq!(costed.equity[0], free.equity[0]);
        for i in 1..rows.len() {
            assert!(
                costed.equity[i] < free.equity[i],
                "cost path must be strictly lower after a trade (bar {i})"
            );
        }
    }

    #[test]
    fn rejects_non_positive_close() {
        let rows = make_rows(&[100.0, 0.0], &[Signal::Long, Signal::Long]);
        let err = simulate(&rows, None).unwrap_err();
        assert!(matches!(err, CoreError::InvalidData { index: 1, .. }));
    }

    #[test]
    fn rejects_nan_close() {
        let mut rows = make_rows(&[100.0, 101.0], &[Signal::Long, Signal::Long]);
        rows[0].close = f64::NAN;
        let err = simulate(&rows, None).unwrap_err();
        assert!(matches!(err, CoreError::InvalidData { index: 0, .. }));
    }

    #[test]
    fn cost_model_rejects_negative_or_unit_costs() {
        assert!(CostModel::new(-0.001, 0.0).is_err());
        assert!(CostModel::new(0.6, 0.5).is_err());
        assert!(CostModel::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn worked_example_equity_paths() {
        // Aligned rows from closes [100,102,101,105,107] with windows 2/3:
        // surviving closes [101,105,107], all Long.
        let rows = make_rows(&[101.0, 105.0, 107.0], &[Signal::Long; 3]);

        let free = simulate(&rows, None).unwrap();
        approx(free.equity[0], 1.0);
        approx(free.equity[1], 105.0 / 101.0);
        approx(free.equity[2], 107.0 / 101.0);

        let cost = CostModel::new(0.001, 0.0005).unwrap();
        let costed = simulate(&rows, Some(&cost)).unwrap();
        approx(costed.equity[0], 0.9985);
        approx(costed.equity[1], 0.9985 * (105.0 / 101.0));
        approx(costed.equity[2], 0.9985 * (107.0 / 101.0));
    }
}
