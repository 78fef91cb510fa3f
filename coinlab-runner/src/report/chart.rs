//! SVG chart artifacts.
//!
//! Hand-rendered SVG: the equity curve as a polyline and the strategy
//! comparison as grouped bars. Deterministic output, no chart dependency.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

use coinlab_core::MetricsReport;

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 400.0;
const MARGIN: f64 = 50.0;

const BAR_COLORS: [&str; 6] = [
    "#4c78a8", "#f58518", "#54a24b", "#e45756", "#72b7b2", "#b279a2",
];

/// Render an equity curve as an SVG line chart.
pub fn write_equity_svg(path: &Path, title: &str, equity: &[f64]) -> Result<()> {
    if equity.len() < 2 {
        bail!("equity curve needs at least 2 points, got {}", equity.len());
    }

    let min = equity.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = equity.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let span = if (max - min).abs() < 1e-12 {
        1.0
    } else {
        max - min
    };

    let plot_w = WIDTH - 2.0 * MARGIN;
    let plot_h = HEIGHT - 2.0 * MARGIN;
    let step = plot_w / (equity.len() - 1) as f64;

    let points: Vec<String> = equity
        .iter()
        .enumerate()
        .map(|(i, &e)| {
            let x = MARGIN + i as f64 * step;
            let y = MARGIN + plot_h * (1.0 - (e - min) / span);
            format!("{x:.2},{y:.2}")
        })
        .collect();

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{WIDTH}\" height=\"{HEIGHT}\" \
         viewBox=\"0 0 {WIDTH} {HEIGHT}\">\n"
    ));
    svg.push_str("<rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
    svg.push_str(&format!(
        "<text x=\"{}\" y=\"30\" text-anchor=\"middle\" font-family=\"monospace\" \
         font-size=\"16\">{}</text>\n",
        WIDTH / 2.0,
        xml_escape(title)
    ));

    // Axes
    svg.push_str(&format!(
        "<line x1=\"{MARGIN}\" y1=\"{MARGIN}\" x2=\"{MARGIN}\" y2=\"{}\" stroke=\"black\"/>\n",
        HEIGHT - MARGIN
    ));
    svg.push_str(&format!(
        "<line x1=\"{MARGIN}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"black\"/>\n",
        HEIGHT - MARGIN,
        WIDTH - MARGIN,
        HEIGHT - MARGIN
    ));

    // Axis labels: min, max, final value
    svg.push_str(&format!(
        "<text x=\"5\" y=\"{}\" font-family=\"monospace\" font-size=\"11\">{max:.4}</text>\n",
        MARGIN + 4.0
    ));
    svg.push_str(&format!(
        "<text x=\"5\" y=\"{}\" font-family=\"monospace\" font-size=\"11\">{min:.4}</text>\n",
        HEIGHT - MARGIN
    ));
    svg.push_str(&format!(
        "<text x=\"{}\" y=\"{}\" text-anchor=\"end\" font-family=\"monospace\" \
         font-size=\"11\">final {:.4}</text>\n",
        WIDTH - MARGIN,
        MARGIN - 8.0,
        equity.last().copied().unwrap_or(1.0)
    ));

    svg.push_str(&format!(
        "<polyline fill=\"none\" stroke=\"{}\" stroke-width=\"1.5\" points=\"{}\"/>\n",
        BAR_COLORS[0],
        points.join(" ")
    ));
    svg.push_str("</svg>\n");

    fs::write(path, svg)
        .with_context(|| format!("failed to write equity chart {}", path.display()))
}

/// Render a cross-strategy metrics comparison as a grouped bar chart:
/// one group per metric, one bar per strategy.
pub fn write_comparison_svg(path: &Path, entries: &[(String, MetricsReport)]) -> Result<()> {
    if entries.is_empty() {
        bail!("comparison chart needs at least one strategy");
    }

    let metric_names = [
        "total_return",
        "sharpe",
        "max_drawdown",
        "win_rate",
        "expectancy",
        "exposure",
    ];
    let values: Vec<Vec<f64>> = entries
        .iter()
        .map(|(_, m)| {
            vec![
                m.total_return,
                m.sharpe_ratio,
                m.max_drawdown,
                m.win_rate,
                m.expectancy,
                m.exposure_time,
            ]
        })
        .collect();

    let max_abs = values
        .iter()
        .flatten()
        .fold(0.0_f64, |acc, v| acc.max(v.abs()))
        .max(1e-9);

    let plot_w = WIDTH - 2.0 * MARGIN;
    let plot_h = HEIGHT - 2.0 * MARGIN;
    let zero_y = MARGIN + plot_h / 2.0;
    let group_w = plot_w / metric_names.len() as f64;
    let bar_w = (group_w * 0.8) / entries.len() as f64;

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{WIDTH}\" height=\"{HEIGHT}\" \
         viewBox=\"0 0 {WIDTH} {HEIGHT}\">\n"
    ));
    svg.push_str("<rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
    svg.push_str(&format!(
        "<text x=\"{}\" y=\"25\" text-anchor=\"middle\" font-family=\"monospace\" \
         font-size=\"16\">Strategy metrics comparison</text>\n",
        WIDTH / 2.0
    ));
    svg.push_str(&format!(
        "<line x1=\"{MARGIN}\" y1=\"{zero_y}\" x2=\"{}\" y2=\"{zero_y}\" stroke=\"black\"/>\n",
        WIDTH - MARGIN
    ));

    for (mi, name) in metric_names.iter().enumerate() {
        let group_x = MARGIN + mi as f64 * group_w;
        svg.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-family=\"monospace\" \
             font-size=\"11\">{name}</text>\n",
            group_x + group_w / 2.0,
            HEIGHT - MARGIN / 2.0
        ));

        for (si, strategy_values) in values.iter().enumerate() {
            let v = strategy_values[mi];
            let x = group_x + group_w * 0.1 + si as f64 * bar_w;
            let h = (v.abs() / max_abs) * (plot_h / 2.0);
            let y = if v >= 0.0 { zero_y - h } else { zero_y };
            let color = BAR_COLORS[si % BAR_COLORS.len()];
            svg.push_str(&format!(
                "<rect x=\"{x:.2}\" y=\"{y:.2}\" width=\"{:.2}\" height=\"{h:.2}\" \
                 fill=\"{color}\"><title>{}: {v:.6}</title></rect>\n",
                bar_w * 0.9,
                xml_escape(&entries[si].0),
            ));
        }
    }

    // Legend
    for (si, (label, _)) in entries.iter().enumerate() {
        let y = MARGIN / 2.0 + si as f64 * 16.0;
        let color = BAR_COLORS[si % BAR_COLORS.len()];
        svg.push_str(&format!(
            "<rect x=\"{}\" y=\"{:.2}\" width=\"12\" height=\"12\" fill=\"{color}\"/>\n",
            WIDTH - MARGIN - 150.0,
            y
        ));
        svg.push_str(&format!(
            "<text x=\"{}\" y=\"{:.2}\" font-family=\"monospace\" font-size=\"11\">{}</text>\n",
            WIDTH - MARGIN - 132.0,
            y + 10.0,
            xml_escape(label)
        ));
    }
    svg.push_str("</svg>\n");

    fs::write(path, svg)
        .with_context(|| format!("failed to write comparison chart {}", path.display()))
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
