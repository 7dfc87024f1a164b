//! Filter stack actions and their application to rows
//!
//! A filter stack is an ordered list of [`FilterAction`]s. `Filter` actions
//! narrow the rows to the selected categories of a factor; `Highlight`
//! actions only mark a point and never change the row set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use ulid::Ulid;

use crate::core::data::{category_of, CellValue, DataRow};

/// One entry of a filter stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FilterAction {
    /// Keep only rows whose `factor` value is one of `values`
    Filter {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        factor: Option<String>,
        values: Vec<CellValue>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source: Option<String>,
        timestamp: DateTime<Utc>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },

    /// Mark a single observation; ignored by every row computation
    Highlight {
        id: String,
        #[serde(rename = "rowIndex", alias = "row_index")]
        row_index: usize,
        #[serde(default)]
        values: BTreeMap<String, CellValue>,
        timestamp: DateTime<Utc>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
}

impl FilterAction {
    /// Create a filter action with a fresh id and the current time
    pub fn filter<I, V>(factor: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        let values: Vec<CellValue> = values.into_iter().map(Into::into).collect();
        let label = format!(
            "{} = {}",
            factor,
            values
                .iter()
                .map(CellValue::category_key)
                .collect::<Vec<_>>()
                .join(", ")
        );
        FilterAction::Filter {
            id: Ulid::new().to_string(),
            factor: Some(factor.to_string()),
            values,
            source: None,
            timestamp: Utc::now(),
            label: Some(label),
        }
    }

    /// Create a highlight action for a row index
    pub fn highlight(row_index: usize, values: BTreeMap<String, CellValue>) -> Self {
        FilterAction::Highlight {
            id: Ulid::new().to_string(),
            row_index,
            values,
            timestamp: Utc::now(),
            label: None,
        }
    }

    /// Attach the chart/panel that produced this action
    pub fn with_source(mut self, new_source: &str) -> Self {
        if let FilterAction::Filter { source, .. } = &mut self {
            *source = Some(new_source.to_string());
        }
        self
    }

    /// Action id
    pub fn id(&self) -> &str {
        match self {
            FilterAction::Filter { id, .. } | FilterAction::Highlight { id, .. } => id,
        }
    }

    /// Action timestamp
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            FilterAction::Filter { timestamp, .. } | FilterAction::Highlight { timestamp, .. } => {
                *timestamp
            }
        }
    }

    /// The factor and selected values, for `Filter` actions that name a factor
    pub fn as_factor_filter(&self) -> Option<(&str, &[CellValue])> {
        match self {
            FilterAction::Filter {
                factor: Some(factor),
                values,
                ..
            } => Some((factor.as_str(), values.as_slice())),
            _ => None,
        }
    }

    /// Human-readable label
    pub fn label(&self) -> String {
        match self {
            FilterAction::Filter {
                label: Some(label), ..
            }
            | FilterAction::Highlight {
                label: Some(label), ..
            } => label.clone(),
            FilterAction::Filter { factor, values, .. } => format!(
                "{} = {}",
                factor.as_deref().unwrap_or("?"),
                values
                    .iter()
                    .map(CellValue::category_key)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            FilterAction::Highlight { row_index, .. } => format!("row {}", row_index),
        }
    }
}

/// Selected category keys of a filter
pub fn selected_keys(values: &[CellValue]) -> BTreeSet<String> {
    values.iter().map(CellValue::category_key).collect()
}

/// Apply one factor filter: rows whose factor value is in `values`
pub fn filter_rows<'a>(rows: &[&'a DataRow], factor: &str, values: &[CellValue]) -> Vec<&'a DataRow> {
    let keys = selected_keys(values);
    rows.iter()
        .copied()
        .filter(|row| category_of(row, factor).is_some_and(|k| keys.contains(&k)))
        .collect()
}

/// Apply a whole filter stack sequentially
///
/// Highlights and filters without a factor are skipped. The result keeps
/// the original row order.
pub fn apply_filters<'a>(rows: &'a [DataRow], stack: &[FilterAction]) -> Vec<&'a DataRow> {
    let mut current: Vec<&DataRow> = rows.iter().collect();
    for (factor, values) in stack.iter().filter_map(FilterAction::as_factor_filter) {
        current = filter_rows(&current, factor, values);
    }
    current
}
