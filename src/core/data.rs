//! Tabular data model - cells, rows and loaded datasets
//!
//! Rows are plain `BTreeMap<String, CellValue>` maps so every analysis can work
//! on `&[DataRow]` without knowing where the data came from.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// A single cell: either a number or free text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Numeric coercion
    ///
    /// Finite numbers pass through, text is trimmed and parsed. Anything
    /// that does not yield a finite `f64` is `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) if v.is_finite() => Some(*v),
            CellValue::Number(_) => None,
            CellValue::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        }
    }

    /// Key used to group rows into categories
    ///
    /// Integral numbers drop their fractional part so `1.0` and `"1"` land
    /// in the same category.
    pub fn category_key(&self) -> String {
        match self {
            CellValue::Number(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 => {
                format!("{}", *v as i64)
            }
            CellValue::Number(v) => format!("{}", v),
            CellValue::Text(s) => s.trim().to_string(),
        }
    }

    /// Parse a raw CSV field, preferring a number when it looks like one
    pub fn parse(raw: &str) -> Option<CellValue> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => Some(CellValue::Number(v)),
            _ => Some(CellValue::Text(trimmed.to_string())),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.category_key())
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Number(v)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

/// One observation: column name → value. Missing cells are absent keys.
pub type DataRow = BTreeMap<String, CellValue>;

/// Numeric outcome value of a row, if present and coercible
pub fn numeric_value(row: &DataRow, column: &str) -> Option<f64> {
    row.get(column).and_then(CellValue::as_f64)
}

/// Category key of a row's factor value, if present
pub fn category_of(row: &DataRow, column: &str) -> Option<String> {
    row.get(column)
        .map(CellValue::category_key)
        .filter(|k| !k.is_empty())
}

/// Collect the numeric values of a column, skipping rows that do not coerce
pub fn numeric_column<'a, I>(rows: I, column: &str) -> Vec<f64>
where
    I: IntoIterator<Item = &'a DataRow>,
{
    rows.into_iter()
        .filter_map(|row| numeric_value(row, column))
        .collect()
}

/// How a column is treated by the analyses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Categorical => write!(f, "categorical"),
        }
    }
}

/// Classify a column over a set of rows
///
/// Numeric when every present cell coerces to a number and at least one
/// cell is present; categorical otherwise.
pub fn classify_column(rows: &[DataRow], column: &str) -> ColumnKind {
    let mut seen = false;
    for row in rows {
        if let Some(cell) = row.get(column) {
            seen = true;
            if cell.as_f64().is_none() {
                return ColumnKind::Categorical;
            }
        }
    }
    if seen {
        ColumnKind::Numeric
    } else {
        ColumnKind::Categorical
    }
}

/// Errors raised while loading tabular data
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read data: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("data file has no header row")]
    MissingHeader,

    #[error("data file has no rows")]
    Empty,

    #[error("unknown column '{column}' (available: {available})")]
    UnknownColumn { column: String, available: String },
}

/// A loaded table with column metadata
#[derive(Debug, Clone, Default, Serialize)]
pub struct Dataset {
    /// Column names in header order
    pub columns: Vec<String>,
    /// Rows in file order
    pub rows: Vec<DataRow>,
    /// Classification per column
    pub kinds: BTreeMap<String, ColumnKind>,
}

impl Dataset {
    /// Build a dataset from already-parsed rows
    pub fn from_rows(columns: Vec<String>, rows: Vec<DataRow>) -> Self {
        let kinds = columns
            .iter()
            .map(|c| (c.clone(), classify_column(&rows, c)))
            .collect();
        Self {
            columns,
            rows,
            kinds,
        }
    }

    /// Parse CSV from any reader (header row required)
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DataError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.to_string())
            .collect();
        if columns.is_empty() || columns.iter().all(|c| c.is_empty()) {
            return Err(DataError::MissingHeader);
        }

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let row: DataRow = columns
                .iter()
                .zip(record.iter())
                .filter_map(|(col, raw)| CellValue::parse(raw).map(|v| (col.clone(), v)))
                .collect();
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(DataError::Empty);
        }

        tracing::debug!(columns = columns.len(), rows = rows.len(), "loaded dataset");
        Ok(Self::from_rows(columns, rows))
    }

    /// Load a CSV file from disk
    pub fn load_csv(path: &Path) -> Result<Self, DataError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the dataset has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Classification of a column (categorical for unknown columns)
    pub fn kind(&self, column: &str) -> ColumnKind {
        self.kinds
            .get(column)
            .copied()
            .unwrap_or(ColumnKind::Categorical)
    }

    /// Columns classified as categorical
    pub fn categorical_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| self.kind(c) == ColumnKind::Categorical)
            .cloned()
            .collect()
    }

    /// Columns classified as numeric
    pub fn numeric_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| self.kind(c) == ColumnKind::Numeric)
            .cloned()
            .collect()
    }

    /// Fail with a helpful message if `column` is not in the header
    pub fn require_column(&self, column: &str) -> Result<(), DataError> {
        if self.columns.iter().any(|c| c == column) {
            Ok(())
        } else {
            Err(DataError::UnknownColumn {
                column: column.to_string(),
                available: self.columns.join(", "),
            })
        }
    }

    /// Distinct category keys of a column, in sorted order
    pub fn distinct_values(&self, column: &str) -> BTreeSet<String> {
        self.rows
            .iter()
            .filter_map(|row| category_of(row, column))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "Machine,Shift,Weight\nA,Morning,10\nB,Afternoon,14.5\nA,Morning,\nB,Night,n/a\n";

    #[test]
    fn test_cell_value_coercion() {
        assert_eq!(CellValue::Number(2.5).as_f64(), Some(2.5));
        assert_eq!(CellValue::Text(" 3.25 ".into()).as_f64(), Some(3.25));
        assert_eq!(CellValue::Text("abc".into()).as_f64(), None);
        assert_eq!(CellValue::Number(f64::NAN).as_f64(), None);
        assert_eq!(CellValue::Text("inf".into()).as_f64(), None);
    }

    #[test]
    fn test_category_key_normalizes_integers() {
        assert_eq!(CellValue::Number(1.0).category_key(), "1");
        assert_eq!(CellValue::Number(1.5).category_key(), "1.5");
        assert_eq!(CellValue::Text(" A ".into()).category_key(), "A");
        assert_eq!(
            CellValue::Number(3.0).category_key(),
            CellValue::Text("3".into()).category_key()
        );
    }

    #[test]
    fn test_load_csv_from_reader() {
        let ds = Dataset::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(ds.columns, vec!["Machine", "Shift", "Weight"]);
        assert_eq!(ds.len(), 4);
        // empty cell is absent from the row map
        assert!(!ds.rows[2].contains_key("Weight"));
        assert_eq!(ds.rows[1].get("Weight"), Some(&CellValue::Number(14.5)));
    }

    #[test]
    fn test_column_classification() {
        let ds = Dataset::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(ds.kind("Machine"), ColumnKind::Categorical);
        // "n/a" is not numeric, so the whole column is categorical
        assert_eq!(ds.kind("Weight"), ColumnKind::Categorical);

        let ds = Dataset::from_reader("X,Y\n1,2\n3,\n".as_bytes()).unwrap();
        assert_eq!(ds.numeric_columns(), vec!["X", "Y"]);
    }

    #[test]
    fn test_numeric_column_skips_bad_values() {
        let ds = Dataset::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(numeric_column(&ds.rows, "Weight"), vec![10.0, 14.5]);
    }

    #[test]
    fn test_empty_file_is_error() {
        let err = Dataset::from_reader("A,B\n".as_bytes()).unwrap_err();
        assert!(matches!(err, DataError::Empty));
    }

    #[test]
    fn test_require_column() {
        let ds = Dataset::from_reader(CSV.as_bytes()).unwrap();
        assert!(ds.require_column("Shift").is_ok());
        let err = ds.require_column("Operator").unwrap_err();
        assert!(err.to_string().contains("Operator"));
        assert!(err.to_string().contains("Machine, Shift, Weight"));
    }

    #[test]
    fn test_distinct_values_sorted() {
        let ds = Dataset::from_reader(CSV.as_bytes()).unwrap();
        let values: Vec<_> = ds.distinct_values("Shift").into_iter().collect();
        assert_eq!(values, vec!["Afternoon", "Morning", "Night"]);
    }
}
