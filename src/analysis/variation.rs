//! Variation attribution - η², factor ranking and per-category breakdowns

use serde::{Deserialize, Serialize};

use crate::analysis::descriptive::{mean, sample_std_dev, sum_of_squares};
use crate::analysis::thresholds::{EffectSize, EtaThresholds};
use crate::core::data::{category_of, numeric_value, DataRow};

/// Outcome values grouped by factor category, in order of first appearance
///
/// Rows without a factor value or with a non-numeric outcome are skipped.
pub fn group_outcomes<'a, I>(rows: I, factor: &str, outcome: &str) -> Vec<(String, Vec<f64>)>
where
    I: IntoIterator<Item = &'a DataRow>,
{
    let mut groups: Vec<(String, Vec<f64>)> = Vec::new();
    for row in rows {
        let (Some(key), Some(y)) = (category_of(row, factor), numeric_value(row, outcome)) else {
            continue;
        };
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(y),
            None => groups.push((key, vec![y])),
        }
    }
    groups
}

/// Between-group and total sum of squares for grouped values
pub(crate) fn partition_sums(groups: &[(String, Vec<f64>)]) -> (f64, f64, f64) {
    let all: Vec<f64> = groups.iter().flat_map(|(_, v)| v.iter().copied()).collect();
    let Some(grand) = mean(&all) else {
        return (0.0, 0.0, 0.0);
    };
    let ss_total = sum_of_squares(&all, grand);
    let ss_between: f64 = groups
        .iter()
        .filter_map(|(_, v)| mean(v).map(|m| v.len() as f64 * (m - grand).powi(2)))
        .sum();
    (grand, ss_between, ss_total)
}

/// η² from grouped values
pub(crate) fn eta_squared_of_groups(groups: &[(String, Vec<f64>)]) -> f64 {
    let n: usize = groups.iter().map(|(_, v)| v.len()).sum();
    if n < 2 || groups.len() < 2 {
        return 0.0;
    }
    let (_, ss_between, ss_total) = partition_sums(groups);
    if ss_total <= 0.0 {
        return 0.0;
    }
    (ss_between / ss_total).clamp(0.0, 1.0)
}

/// Share of outcome variance explained by a categorical factor
///
/// One-way ANOVA effect size: SS_between / SS_total. Zero when fewer than
/// two usable rows, a single category, or no variance at all.
pub fn eta_squared<'a, I>(rows: I, factor: &str, outcome: &str) -> f64
where
    I: IntoIterator<Item = &'a DataRow>,
{
    eta_squared_of_groups(&group_outcomes(rows, factor, outcome))
}

/// One entry of a factor ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorRanking {
    pub factor: String,
    pub eta_squared: f64,
    pub effect_size: EffectSize,
    pub group_count: usize,
}

/// Rank candidate factors by the variation they explain
///
/// Sorted by η² descending; equal values keep the input order. The outcome
/// column is never ranked against itself.
pub fn find_optimal_factors(
    rows: &[DataRow],
    factors: &[String],
    outcome: &str,
    thresholds: &EtaThresholds,
) -> Vec<FactorRanking> {
    let mut ranking: Vec<FactorRanking> = factors
        .iter()
        .filter(|f| f.as_str() != outcome)
        .map(|factor| {
            let groups = group_outcomes(rows, factor, outcome);
            let eta = eta_squared_of_groups(&groups);
            tracing::debug!(factor = %factor, eta_squared = eta, groups = groups.len(), "ranked factor");
            FactorRanking {
                factor: factor.clone(),
                eta_squared: eta,
                effect_size: thresholds.classify(eta),
                group_count: groups.len(),
            }
        })
        .collect();

    // stable sort keeps input order on ties
    ranking.sort_by(|a, b| b.eta_squared.total_cmp(&a.eta_squared));
    ranking
}

/// Per-category breakdown of an outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub value: String,
    pub n: usize,
    pub mean: f64,
    pub std_dev: f64,
    /// This category's share of total variation, in percent
    pub contribution_pct: f64,
}

/// Mean, σ and contribution to variation for every category of a factor
///
/// Contributions are n·(mean - grand)² / SS_total and sum to η² × 100.
/// Sorted by contribution descending.
pub fn category_stats(rows: &[DataRow], factor: &str, outcome: &str) -> Vec<CategoryStats> {
    let groups = group_outcomes(rows, factor, outcome);
    let (grand, _, ss_total) = partition_sums(&groups);

    let mut stats: Vec<CategoryStats> = groups
        .iter()
        .filter_map(|(key, values)| {
            let m = mean(values)?;
            let contribution_pct = if ss_total > 0.0 {
                values.len() as f64 * (m - grand).powi(2) / ss_total * 100.0
            } else {
                0.0
            };
            Some(CategoryStats {
                value: key.clone(),
                n: values.len(),
                mean: m,
                std_dev: sample_std_dev(values, m),
                contribution_pct,
            })
        })
        .collect();

    stats.sort_by(|a, b| b.contribution_pct.total_cmp(&a.contribution_pct));
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::data::CellValue;

    fn row(machine: &str, shift: &str, weight: CellValue) -> DataRow {
        let mut r = DataRow::new();
        r.insert("Machine".into(), machine.into());
        r.insert("Shift".into(), shift.into());
        r.insert("Plant".into(), "P1".into());
        r.insert("Weight".into(), weight);
        r
    }

    fn fixture() -> Vec<DataRow> {
        vec![
            row("A", "Morning", 10.0.into()),
            row("A", "Afternoon", 11.0.into()),
            row("A", "Morning", 10.0.into()),
            row("A", "Afternoon", 11.0.into()),
            row("B", "Morning", 14.0.into()),
            row("B", "Afternoon", 15.0.into()),
            row("B", "Morning", 14.0.into()),
            row("B", "Afternoon", 15.0.into()),
        ]
    }

    #[test]
    fn test_eta_squared_machine() {
        // SS_between = 32, SS_total = 34
        let eta = eta_squared(&fixture(), "Machine", "Weight");
        assert!((eta - 32.0 / 34.0).abs() < 1e-12);
    }

    #[test]
    fn test_eta_squared_shift() {
        // Shift means 12 and 13 around 12.5: SS_between = 2
        let eta = eta_squared(&fixture(), "Shift", "Weight");
        assert!((eta - 2.0 / 34.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_value_column_is_zero() {
        assert_eq!(eta_squared(&fixture(), "Plant", "Weight"), 0.0);
    }

    #[test]
    fn test_non_numeric_outcomes_are_skipped() {
        let mut rows = fixture();
        rows.push(row("B", "Morning", CellValue::Text("broken".into())));
        let eta = eta_squared(&rows, "Machine", "Weight");
        assert!((eta - 32.0 / 34.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(eta_squared(&[], "Machine", "Weight"), 0.0);
        let rows = vec![row("A", "Morning", 1.0.into())];
        assert_eq!(eta_squared(&rows, "Machine", "Weight"), 0.0);
        let flat = vec![row("A", "M", 5.0.into()), row("B", "M", 5.0.into())];
        assert_eq!(eta_squared(&flat, "Machine", "Weight"), 0.0);
    }

    #[test]
    fn test_find_optimal_factors_order() {
        let factors = vec![
            "Plant".to_string(),
            "Shift".to_string(),
            "Machine".to_string(),
            "Weight".to_string(),
        ];
        let ranking =
            find_optimal_factors(&fixture(), &factors, "Weight", &EtaThresholds::default());
        let names: Vec<_> = ranking.iter().map(|r| r.factor.as_str()).collect();
        assert_eq!(names, vec!["Machine", "Shift", "Plant"]);
        assert_eq!(ranking[0].effect_size, EffectSize::Large);
        assert_eq!(ranking[1].effect_size, EffectSize::Small);
        assert_eq!(ranking[2].group_count, 1);
    }

    #[test]
    fn test_category_stats_contributions_sum_to_eta() {
        let rows = fixture();
        let stats = category_stats(&rows, "Machine", "Weight");
        assert_eq!(stats.len(), 2);
        let total: f64 = stats.iter().map(|s| s.contribution_pct).sum();
        let eta = eta_squared(&rows, "Machine", "Weight");
        assert!((total - eta * 100.0).abs() < 1e-9);

        let a = stats.iter().find(|s| s.value == "A").unwrap();
        assert_eq!(a.n, 4);
        assert!((a.mean - 10.5).abs() < 1e-12);
        assert!((a.std_dev - (1.0_f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_group_order_is_first_appearance() {
        let groups = group_outcomes(&fixture(), "Shift", "Weight");
        let keys: Vec<_> = groups.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["Morning", "Afternoon"]);
    }
}
