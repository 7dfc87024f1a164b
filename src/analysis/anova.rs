//! One-way ANOVA across the categories of a factor

use serde::{Deserialize, Serialize};

use crate::analysis::descriptive::{mean, sample_std_dev, sum_of_squares};
use crate::analysis::distributions::f_test_p_value;
use crate::analysis::variation::{group_outcomes, partition_sums};
use crate::core::data::DataRow;

/// Summary of one factor level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnovaGroup {
    pub name: String,
    pub n: usize,
    pub mean: f64,
    pub std_dev: f64,
}

/// One-way ANOVA table plus effect size and a readable summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnovaResult {
    pub factor: String,
    pub groups: Vec<AnovaGroup>,
    pub ss_between: f64,
    pub ss_within: f64,
    pub df_between: usize,
    pub df_within: usize,
    pub ms_between: f64,
    pub ms_within: f64,
    pub f_statistic: f64,
    pub p_value: f64,
    pub eta_squared: f64,
    pub is_significant: bool,
    pub insight: String,
}

fn format_p(p: f64) -> String {
    if p < 0.001 {
        "p < 0.001".to_string()
    } else {
        format!("p = {:.3}", p)
    }
}

fn build_insight(factor: &str, groups: &[AnovaGroup], eta: f64, p: f64, significant: bool) -> String {
    let pct = eta * 100.0;
    if !significant {
        return format!(
            "No significant difference between {} groups ({}). {} explains {:.0}% of variation.",
            factor,
            format_p(p),
            factor,
            pct
        );
    }

    let highest = groups.iter().max_by(|a, b| a.mean.total_cmp(&b.mean));
    let lowest = groups.iter().min_by(|a, b| a.mean.total_cmp(&b.mean));
    match (highest, lowest) {
        (Some(hi), Some(lo)) => format!(
            "{} groups differ significantly ({}) and explain {:.0}% of variation. Highest mean: {} ({:.2}), lowest mean: {} ({:.2}).",
            factor,
            format_p(p),
            pct,
            hi.name,
            hi.mean,
            lo.name,
            lo.mean
        ),
        _ => format!("{} groups differ significantly ({}).", factor, format_p(p)),
    }
}

/// One-way ANOVA of `outcome` across the levels of `factor`
///
/// Rows with a missing factor or non-numeric outcome are skipped. Returns
/// `None` with fewer than two groups or no within-group degrees of freedom.
pub fn calculate_anova(
    rows: &[DataRow],
    factor: &str,
    outcome: &str,
    alpha: f64,
) -> Option<AnovaResult> {
    let grouped = group_outcomes(rows, factor, outcome);
    let k = grouped.len();
    let n: usize = grouped.iter().map(|(_, v)| v.len()).sum();
    if k < 2 || n <= k {
        tracing::debug!(factor, groups = k, n, "anova skipped: insufficient data");
        return None;
    }

    let (_, ss_between, ss_total) = partition_sums(&grouped);
    let ss_within: f64 = grouped
        .iter()
        .filter_map(|(_, v)| mean(v).map(|m| sum_of_squares(v, m)))
        .sum();

    let df_between = k - 1;
    let df_within = n - k;
    let ms_between = ss_between / df_between as f64;
    let ms_within = ss_within / df_within as f64;

    let f_statistic = if ms_within > 0.0 {
        ms_between / ms_within
    } else if ms_between > 0.0 {
        f64::INFINITY
    } else {
        0.0
    };
    let p_value = f_test_p_value(f_statistic, df_between as f64, df_within as f64);
    let eta_squared = if ss_total > 0.0 {
        (ss_between / ss_total).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let is_significant = p_value < alpha;

    let groups: Vec<AnovaGroup> = grouped
        .iter()
        .filter_map(|(name, values)| {
            let m = mean(values)?;
            Some(AnovaGroup {
                name: name.clone(),
                n: values.len(),
                mean: m,
                std_dev: sample_std_dev(values, m),
            })
        })
        .collect();

    let insight = build_insight(factor, &groups, eta_squared, p_value, is_significant);

    Some(AnovaResult {
        factor: factor.to_string(),
        groups,
        ss_between,
        ss_within,
        df_between,
        df_within,
        ms_between,
        ms_within,
        f_statistic,
        p_value,
        eta_squared,
        is_significant,
        insight,
    })
}
