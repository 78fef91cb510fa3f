//! Report and artifact writers.

pub mod chart;
pub mod comparison;
pub mod performance;

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::runner::RunResult;

pub use chart::{write_comparison_svg, write_equity_svg};
pub use comparison::{comparison_markdown, write_comparison_markdown};
pub use performance::write_performance_csv;

/// Serialize the full run result to pretty-printed JSON.
pub fn write_result_json(path: &Path, result: &RunResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result)
        .context("failed to serialize run result")?;
    fs::write(path, json)
        .with_context(|| format!("failed to write result {}", path.display()))
}
