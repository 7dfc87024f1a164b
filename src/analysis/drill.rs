//! Drill-path accumulator
//!
//! Walks a filter stack in order and attributes variation to each factor
//! the user drilled into. Each step's η² is measured on the rows that
//! remain *before* that filter, so the running product reads as "share of
//! the original variation still explained after this many drill-downs".

use serde::{Deserialize, Serialize};

use crate::analysis::descriptive::{calculate_stats, SpecLimits, StatsResult};
use crate::analysis::variation::eta_squared;
use crate::core::data::{numeric_column, CellValue, DataRow};
use crate::core::filter::{filter_rows, FilterAction};

/// One factor filter of a drill path with its before/after statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrillStep {
    pub factor: String,
    pub values: Vec<CellValue>,
    /// η² of the factor over the rows before this step
    pub eta_squared: f64,
    /// Product of η² over this and every earlier step
    pub cumulative_eta_squared: f64,
    pub mean_before: Option<f64>,
    pub mean_after: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpk_before: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpk_after: Option<f64>,
    pub count_before: usize,
    pub count_after: usize,
}

/// Ordered drill steps plus the overall explained variation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrillPath {
    pub steps: Vec<DrillStep>,
    /// Last step's cumulative η² as a percentage; `None` without steps
    pub cumulative_variation_pct: Option<f64>,
}

impl DrillPath {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

fn outcome_stats(rows: &[&DataRow], outcome: &str, specs: Option<&SpecLimits>) -> Option<StatsResult> {
    let values = numeric_column(rows.iter().copied(), outcome);
    calculate_stats(&values, specs)
}

/// Build the drill path for a filter stack
///
/// Degenerate inputs (fewer than two rows, no outcome, empty stack) give an
/// empty path. Highlight actions and filters without a factor are skipped.
/// The walk stops after any step that leaves fewer than two rows.
pub fn compute_drill_path(
    rows: &[DataRow],
    filter_stack: &[FilterAction],
    outcome: &str,
    specs: Option<&SpecLimits>,
) -> DrillPath {
    if rows.len() < 2 || outcome.is_empty() || filter_stack.is_empty() {
        return DrillPath::default();
    }

    // Cpk is only reported when at least one limit exists
    let specs = specs.filter(|s| s.has_limits());

    let mut current: Vec<&DataRow> = rows.iter().collect();
    let mut cumulative = 1.0_f64;
    let mut steps = Vec::new();

    for (factor, values) in filter_stack.iter().filter_map(FilterAction::as_factor_filter) {
        let eta = eta_squared(current.iter().copied(), factor, outcome);
        let before = outcome_stats(&current, outcome, specs);

        let next = filter_rows(&current, factor, values);
        let after = outcome_stats(&next, outcome, specs);

        cumulative = (cumulative * eta).clamp(0.0, 1.0);

        tracing::debug!(
            factor,
            eta_squared = eta,
            cumulative_eta_squared = cumulative,
            before = current.len(),
            after = next.len(),
            "drill step"
        );

        steps.push(DrillStep {
            factor: factor.to_string(),
            values: values.to_vec(),
            eta_squared: eta,
            cumulative_eta_squared: cumulative,
            mean_before: before.as_ref().map(|s| s.mean),
            mean_after: after.as_ref().map(|s| s.mean),
            cpk_before: before.as_ref().and_then(|s| s.cpk),
            cpk_after: after.as_ref().and_then(|s| s.cpk),
            count_before: current.len(),
            count_after: next.len(),
        });

        current = next;
        if current.len() < 2 {
            break;
        }
    }

    let cumulative_variation_pct = steps.last().map(|s| s.cumulative_eta_squared * 100.0);
    DrillPath {
        steps,
        cumulative_variation_pct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn row(machine: &str, shift: &str, weight: f64) -> DataRow {
        let mut r = DataRow::new();
        r.insert("Machine".into(), machine.into());
        r.insert("Shift".into(), shift.into());
        r.insert("Weight".into(), weight.into());
        r
    }

    fn fixture() -> Vec<DataRow> {
        vec![
            row("A", "Morning", 10.0),
            row("A", "Afternoon", 11.0),
            row("A", "Morning", 10.0),
            row("A", "Afternoon", 11.0),
            row("B", "Morning", 14.0),
            row("B", "Afternoon", 15.0),
            row("B", "Morning", 14.0),
            row("B", "Afternoon", 15.0),
        ]
    }

    #[test]
    fn test_empty_stack_is_empty_path() {
        let path = compute_drill_path(&fixture(), &[], "Weight", None);
        assert!(path.steps.is_empty());
        assert!(path.cumulative_variation_pct.is_none());
    }

    #[test]
    fn test_too_few_rows_is_empty_path() {
        let rows = vec![row("A", "Morning", 10.0)];
        let stack = vec![FilterAction::filter("Machine", ["A"])];
        assert_eq!(compute_drill_path(&rows, &stack, "Weight", None), DrillPath::default());
    }

    #[test]
    fn test_missing_outcome_is_empty_path() {
        let stack = vec![FilterAction::filter("Machine", ["A"])];
        assert!(compute_drill_path(&fixture(), &stack, "", None).is_empty());
    }

    #[test]
    fn test_machine_a_step() {
        let stack = vec![FilterAction::filter("Machine", ["A"])];
        let path = compute_drill_path(&fixture(), &stack, "Weight", None);
        assert_eq!(path.steps.len(), 1);
        let step = &path.steps[0];
        assert!(step.eta_squared > 0.7);
        assert_eq!(step.count_before, 8);
        assert_eq!(step.count_after, 4);
        assert!((step.mean_before.unwrap() - 12.5).abs() < 1e-9);
        assert!((step.mean_after.unwrap() - 10.5).abs() < 1e-9);
        assert!(step.cpk_before.is_none());
        let pct = path.cumulative_variation_pct.unwrap();
        assert!((pct - step.eta_squared * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_two_steps_multiply() {
        let stack = vec![
            FilterAction::filter("Machine", ["A"]),
            FilterAction::filter("Shift", ["Morning"]),
        ];
        let path = compute_drill_path(&fixture(), &stack, "Weight", None);
        assert_eq!(path.steps.len(), 2);
        // Within machine A, shift explains all variation (10 vs 11)
        assert!((path.steps[1].eta_squared - 1.0).abs() < 1e-12);
        assert!(
            (path.steps[1].cumulative_eta_squared
                - path.steps[0].eta_squared * path.steps[1].eta_squared)
                .abs()
                < 1e-12
        );
        assert_eq!(path.steps[1].count_after, 2);
        assert!((path.steps[1].mean_after.unwrap() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_highlights_are_skipped() {
        let stack = vec![
            FilterAction::highlight(0, BTreeMap::new()),
            FilterAction::filter("Machine", ["B"]),
            FilterAction::highlight(5, BTreeMap::new()),
        ];
        let path = compute_drill_path(&fixture(), &stack, "Weight", None);
        assert_eq!(path.steps.len(), 1);
        assert_eq!(path.steps[0].factor, "Machine");
    }

    #[test]
    fn test_only_highlights_gives_null_pct() {
        let stack = vec![FilterAction::highlight(0, BTreeMap::new())];
        let path = compute_drill_path(&fixture(), &stack, "Weight", None);
        assert!(path.steps.is_empty());
        assert!(path.cumulative_variation_pct.is_none());
    }

    #[test]
    fn test_stops_when_fewer_than_two_rows_remain() {
        let mut rows = fixture();
        rows.push(row("C", "Night", 12.0));
        let stack = vec![
            FilterAction::filter("Machine", ["C"]),
            FilterAction::filter("Shift", ["Night"]),
        ];
        let path = compute_drill_path(&rows, &stack, "Weight", None);
        assert_eq!(path.steps.len(), 1);
        assert_eq!(path.steps[0].count_after, 1);
    }

    #[test]
    fn test_cpk_only_with_specs() {
        let stack = vec![FilterAction::filter("Machine", ["A"])];
        let specs = SpecLimits::new(Some(16.0), Some(9.0));
        let path = compute_drill_path(&fixture(), &stack, "Weight", Some(&specs));
        let step = &path.steps[0];
        assert!(step.cpk_before.is_some());
        assert!(step.cpk_after.is_some());
        // Narrower spread after filtering improves capability
        assert!(step.cpk_after.unwrap() > step.cpk_before.unwrap());

        let no_limits = SpecLimits::default();
        let path = compute_drill_path(&fixture(), &stack, "Weight", Some(&no_limits));
        assert!(path.steps[0].cpk_before.is_none());
    }

    #[test]
    fn test_cumulative_is_non_increasing() {
        let stack = vec![
            FilterAction::filter("Shift", ["Morning", "Afternoon"]),
            FilterAction::filter("Machine", ["A"]),
            FilterAction::filter("Shift", ["Afternoon"]),
        ];
        let path = compute_drill_path(&fixture(), &stack, "Weight", None);
        let mut prev = 1.0;
        for step in &path.steps {
            assert!(step.cumulative_eta_squared <= prev);
            assert!((0.0..=1.0).contains(&step.cumulative_eta_squared));
            prev = step.cumulative_eta_squared;
        }
    }
}
