//! Performance table export (CSV).

use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use coinlab_core::signal::Signal;
use coinlab_core::BacktestReport;

/// Write the timestamp-indexed performance table: one row per aligned
/// signal bar with its realized return and equity.
pub fn write_performance_csv(path: &Path, report: &BacktestReport) -> Result<()> {
    if report.signals.len() != report.simulation.len() {
        bail!(
            "signal frame ({} rows) and simulation ({} rows) are misaligned",
            report.signals.len(),
            report.simulation.len()
        );
    }

    let mut file = File::create(path)
        .with_context(|| format!("failed to create performance CSV {}", path.display()))?;

    writeln!(
        file,
        "timestamp,close,short_sma,long_sma,signal,realized_return,equity"
    )?;
    for (i, row) in report.signals.iter().enumerate() {
        let signal = match row.signal {
            Signal::Long => 1,
            Signal::Exit => -1,
        };
        writeln!(
            file,
            "{},{},{:.8},{:.8},{},{:.8},{:.8}",
            row.timestamp.format("%Y-%m-%dT%H:%M:%SZ"),
            row.close,
            row.short_sma,
            row.long_sma,
            signal,
            report.simulation.realized[i],
            report.simulation.equity[i],
        )?;
    }
    Ok(())
}
