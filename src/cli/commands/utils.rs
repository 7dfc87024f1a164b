//! Shared utilities for CLI commands

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::Path;

use crate::analysis::thresholds::{CapabilityLevel, CpkThresholds};
use crate::cli::filters::{to_filter_stack, FilterArg};
use crate::cli::GlobalOpts;
use crate::core::{apply_filters, Config, DataRow, Dataset};

/// Configuration and data loaded for a single command
pub struct Context {
    pub config: Config,
    pub dataset: Dataset,
}

/// Load the effective configuration and the CSV file named on the command line
pub fn load_context(file: &Path, global: &GlobalOpts) -> Result<Context> {
    let config = Config::load(global.config.as_deref())?;
    let dataset = Dataset::load_csv(file)
        .into_diagnostic()
        .map_err(|e| e.wrap_err(format!("loading {}", file.display())))?;
    tracing::info!(
        file = %file.display(),
        rows = dataset.len(),
        columns = dataset.columns.len(),
        "dataset loaded"
    );
    Ok(Context { config, dataset })
}

/// Fail with a readable message unless every column exists
pub fn require_columns(dataset: &Dataset, columns: &[&str]) -> Result<()> {
    for column in columns {
        dataset.require_column(column).into_diagnostic()?;
    }
    Ok(())
}

/// Print a section heading the way every report starts
pub fn print_heading(title: &str, subtitle: &str) {
    println!("{}", style("─".repeat(60)).dim());
    println!("{}: {}", style(title).bold(), style(subtitle).cyan());
    println!("{}", style("─".repeat(60)).dim());
}

/// Error for an analysis that had too little usable data
pub fn insufficient(analysis: &str, detail: &str) -> miette::Report {
    miette::miette!(
        code = "variscout::insufficient_data",
        help = "check that the columns hold enough numeric rows and at least two groups",
        "not enough data for {} ({})",
        analysis,
        detail
    )
}

/// Color a Cpk value by its capability band
pub fn styled_cpk(cpk: Option<f64>, thresholds: &CpkThresholds) -> String {
    match cpk {
        Some(v) if v.is_finite() => {
            let text = format!("{:.2} ({})", v, thresholds.classify(v));
            match thresholds.classify(v) {
                CapabilityLevel::Critical => style(text).red().to_string(),
                CapabilityLevel::Warning => style(text).yellow().to_string(),
                CapabilityLevel::Capable => style(text).green().to_string(),
                CapabilityLevel::Excellent => style(text).green().bold().to_string(),
            }
        }
        _ => style("-").dim().to_string(),
    }
}

/// Rows left after applying command-line filters, as an owned set
pub fn filtered_rows(dataset: &Dataset, filters: &[FilterArg]) -> Vec<DataRow> {
    if filters.is_empty() {
        return dataset.rows.clone();
    }
    let stack = to_filter_stack(filters);
    let rows: Vec<DataRow> = apply_filters(&dataset.rows, &stack)
        .into_iter()
        .cloned()
        .collect();
    tracing::info!(kept = rows.len(), total = dataset.len(), "filters applied");
    rows
}
