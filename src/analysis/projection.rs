//! Projected statistics - what the process would look like if only the
//! filtered rows remained

use serde::{Deserialize, Serialize};

use crate::analysis::descriptive::{calculate_stats, SpecLimits, StatsResult};
use crate::core::data::{numeric_column, DataRow};
use crate::core::filter::{apply_filters, FilterAction};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedStats {
    pub current: StatsResult,
    pub projected: StatsResult,
    /// projected mean - current mean
    pub mean_shift: f64,
    /// Relative σ reduction in percent (negative when spread grows)
    pub std_dev_reduction_pct: f64,
    /// projected Cpk - current Cpk, when both exist
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpk_delta: Option<f64>,
}

/// Compare statistics over all rows with those over the filtered rows
///
/// `None` when either side has no numeric outcome values.
pub fn calculate_projected_stats(
    rows: &[DataRow],
    outcome: &str,
    filter_stack: &[FilterAction],
    specs: Option<&SpecLimits>,
) -> Option<ProjectedStats> {
    let current = calculate_stats(&numeric_column(rows, outcome), specs)?;
    let kept = apply_filters(rows, filter_stack);
    let projected = calculate_stats(&numeric_column(kept, outcome), specs)?;

    let std_dev_reduction_pct = if current.std_dev > 0.0 {
        (current.std_dev - projected.std_dev) / current.std_dev * 100.0
    } else {
        0.0
    };
    let cpk_delta = match (current.cpk, projected.cpk) {
        (Some(before), Some(after)) => Some(after - before),
        _ => None,
    };

    Some(ProjectedStats {
        mean_shift: projected.mean - current.mean,
        std_dev_reduction_pct,
        cpk_delta,
        current,
        projected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<DataRow> {
        [("A", 10.0), ("A", 11.0), ("B", 14.0), ("B", 15.0)]
            .into_iter()
            .map(|(m, w)| {
                let mut r = DataRow::new();
                r.insert("Machine".into(), m.into());
                r.insert("Weight".into(), w.into());
                r
            })
            .collect()
    }

    #[test]
    fn test_projection_narrows_spread() {
        let stack = vec![FilterAction::filter("Machine", ["A"])];
        let specs = SpecLimits::new(Some(16.0), Some(9.0));
        let p = calculate_projected_stats(&rows(), "Weight", &stack, Some(&specs)).unwrap();
        assert_eq!(p.current.n, 4);
        assert_eq!(p.projected.n, 2);
        assert!((p.mean_shift - (10.5 - 12.5)).abs() < 1e-12);
        assert!(p.std_dev_reduction_pct > 0.0);
        assert!(p.cpk_delta.unwrap() > 0.0);
    }

    #[test]
    fn test_projection_without_matches_is_none() {
        let stack = vec![FilterAction::filter("Machine", ["Z"])];
        assert!(calculate_projected_stats(&rows(), "Weight", &stack, None).is_none());
    }

    #[test]
    fn test_empty_stack_projects_to_current() {
        let p = calculate_projected_stats(&rows(), "Weight", &[], None).unwrap();
        assert_eq!(p.current, p.projected);
        assert_eq!(p.mean_shift, 0.0);
        assert!(p.cpk_delta.is_none());
    }
}
