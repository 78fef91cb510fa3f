//! Cross-strategy comparison report.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

use crate::runner::RunResult;

/// Build a markdown report comparing metrics across runs.
pub fn comparison_markdown(results: &[RunResult]) -> String {
    let mut report = String::from("# CoinLab Strategy Comparison\n\n");

    if let Some(first) = results.first() {
        report.push_str(&format!("Symbol: `{}`\n\n", first.config.symbol));
    }

    report.push_str(
        "| Strategy | Total Return | Sharpe | Max Drawdown | Win Rate | Expectancy | Exposure | Trades |\n",
    );
    report.push_str(
        "|----------|--------------|--------|--------------|----------|------------|----------|--------|\n",
    );

    let mut sorted: Vec<_> = results.iter().collect();
    sorted.sort_by(|a, b| {
        b.report
            .metrics
            .sharpe_ratio
            .partial_cmp(&a.report.metrics.sharpe_ratio)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    for result in &sorted {
        let m = &result.report.metrics;
        report.push_str(&format!(
            "| {} | {:+.2}% | {:.2} | {:+.2}% | {:.1}% | {:+.4}% | {:.1}% | {} |\n",
            result.label,
            m.total_return * 100.0,
            m.sharpe_ratio,
            m.max_drawdown * 100.0,
            m.win_rate * 100.0,
            m.expectancy * 100.0,
            m.exposure_time * 100.0,
            result.trade_count
        ));
    }

    if let Some(best) = sorted.first() {
        report.push_str(&format!(
            "\nBest by Sharpe: `{}` ({:.2})\n",
            best.label, best.report.metrics.sharpe_ratio
        ));
    }

    report
}

pub fn write_comparison_markdown(path: &Path, results: &[RunResult]) -> Result<()> {
    if results.is_empty() {
        bail!("comparison report needs at least one run");
    }
    fs::write(path, comparison_markdown(results))
        .with_context(|| format!("failed to write comparison report {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RunConfig, StrategyParams};
    use coinlab_core::{BacktestReport, MetricsReport, Simulation};

    fn fake_result(label: &str, sharpe: f64, total_return: f64) -> RunResult {
        let config = RunConfig {
            symbol: "ETHBTC".to_string(),
            strategy: StrategyParams {
                short_window: 20,
                long_window: 100,
            },
            costs: None,
        };
        RunResult {
            run_id: "deadbeef".to_string(),
            label: label.to_string(),
            report: BacktestReport {
                strategy: "sma_crossover".to_string(),
                symbol: "ETHBTC".to_string(),
                signals: vec![],
                simulation: Simulation {
                    positions: vec![],
                    realized: vec![],
                    equity: vec![],
                },
                metrics: MetricsReport {
                    total_return,
                    sharpe_ratio: sharpe,
                    max_drawdown: -0.1,
                    win_rate: 0.5,
                    expectancy: 0.001,
                    exposure_time: 0.4,
                },
            },
            config,
            bar_count: 500,
            signal_count: 401,
            trade_count: 7,
        }
    }

    #[test]
    fn rows_sorted_by_sharpe_descending() {
        let results = vec![
            fake_result("sma_10_50", 0.8, 0.05),
            fake_result("sma_20_100", 1.5, 0.12),
        ];
        let md = comparison_markdown(&results);

        let first_row = md.lines().position(|l| l.contains("sma_20_100")).unwrap();
        let second_row = md.lines().position(|l| l.contains("sma_10_50")).unwrap();
        assert!(first_row < second_row);
        assert!(md.contains("Best by Sharpe: `sma_20_100` (1.50)"));
    }

    #[test]
    fn writes_file_and_rejects_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("comparison.md");
        assert!(write_comparison_markdown(&path, &[]).is_err());

        write_comparison_markdown(&path, &[fake_result("sma_20_100", 1.0, 0.1)]).unwrap();
        let md = std::fs::read_to_string(&path).unwrap();
        assert!(md.starts_with("# CoinLab Strategy Comparison"));
        assert!(md.contains("| sma_20_100 |"));
    }
}
