//! Output formatting utilities

use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::cli::OutputFormat;

/// Determine the effective output format based on context
pub fn effective_format(format: OutputFormat) -> OutputFormat {
    match format {
        OutputFormat::Auto => OutputFormat::Table,
        other => other,
    }
}

/// True when the command should print tables rather than a document
pub fn is_table(format: OutputFormat) -> bool {
    effective_format(format) == OutputFormat::Table
}

/// Print a serializable result as JSON or YAML
///
/// Returns `false` for table formats so the caller prints its own view.
pub fn print_document<T: Serialize>(value: &T, format: OutputFormat) -> Result<bool> {
    match effective_format(format) {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
            Ok(true)
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(value).into_diagnostic()?);
            Ok(true)
        }
        OutputFormat::Auto | OutputFormat::Table => Ok(false),
    }
}

/// Render rows as a rounded text table
pub fn render_table<T: Tabled>(rows: &[T]) -> String {
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}
