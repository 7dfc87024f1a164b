//! Gage R&R - crossed measurement system analysis (ANOVA method)
//!
//! Every part is measured by every operator the same number of times. The
//! total variation is split into part-to-part, repeatability (equipment)
//! and reproducibility (operator plus part×operator interaction).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analysis::distributions::f_test_p_value;
use crate::analysis::thresholds::{GrrThresholds, GrrVerdict};
use crate::core::data::{category_of, numeric_value, DataRow};

/// Interaction p-value above which the interaction is pooled into error
pub const INTERACTION_POOLING_P: f64 = 0.25;

/// One line of the two-way ANOVA table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnovaRow {
    pub source: String,
    pub df: usize,
    pub ss: f64,
    pub ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub f: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p: Option<f64>,
}

/// Variance components and their share of total study variation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarianceComponents {
    pub repeatability: f64,
    pub reproducibility: f64,
    pub operator: f64,
    pub interaction: f64,
    pub grr: f64,
    pub part: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GageRrResult {
    pub parts: usize,
    pub operators: usize,
    pub replicates: usize,
    pub anova: Vec<AnovaRow>,
    /// True when the interaction was kept in the model
    pub interaction_significant: bool,
    pub variance: VarianceComponents,
    /// 100·σ_component / σ_total
    pub pct_repeatability: f64,
    pub pct_reproducibility: f64,
    pub pct_grr: f64,
    pub pct_part: f64,
    /// Number of distinct categories, ⌊1.41·σ_part/σ_GRR⌋
    pub ndc: u32,
    pub verdict: GrrVerdict,
}

fn study_pct(component: f64, total: f64) -> f64 {
    if total > 0.0 {
        100.0 * (component / total).sqrt()
    } else {
        0.0
    }
}

/// Run a crossed Gage R&R study
///
/// Needs at least two parts, two operators, and a balanced design with at
/// least two replicates per part/operator cell. Anything else is `None`.
pub fn calculate_gage_rr(
    rows: &[DataRow],
    part_column: &str,
    operator_column: &str,
    measurement_column: &str,
    thresholds: &GrrThresholds,
) -> Option<GageRrResult> {
    let mut cells: BTreeMap<(String, String), Vec<f64>> = BTreeMap::new();
    for row in rows {
        let (Some(part), Some(op), Some(y)) = (
            category_of(row, part_column),
            category_of(row, operator_column),
            numeric_value(row, measurement_column),
        ) else {
            continue;
        };
        cells.entry((part, op)).or_default().push(y);
    }

    let parts: Vec<String> = {
        let mut v: Vec<String> = cells.keys().map(|(p, _)| p.clone()).collect();
        v.dedup();
        v
    };
    let operators: Vec<String> = {
        let mut v: Vec<String> = cells.keys().map(|(_, o)| o.clone()).collect();
        v.sort();
        v.dedup();
        v
    };
    let (p, o) = (parts.len(), operators.len());
    if p < 2 || o < 2 || cells.len() != p * o {
        tracing::debug!(parts = p, operators = o, cells = cells.len(), "gage r&r: design not crossed");
        return None;
    }

    let r = cells.values().next()?.len();
    if r < 2 || cells.values().any(|v| v.len() != r) {
        tracing::debug!("gage r&r: unbalanced or unreplicated design");
        return None;
    }

    let (pf, of, rf) = (p as f64, o as f64, r as f64);
    let n = pf * of * rf;
    let grand = cells.values().flatten().sum::<f64>() / n;

    let part_means: Vec<f64> = parts
        .iter()
        .map(|part| {
            operators
                .iter()
                .filter_map(|op| cells.get(&(part.clone(), op.clone())))
                .flatten()
                .sum::<f64>()
                / (of * rf)
        })
        .collect();
    let operator_means: Vec<f64> = operators
        .iter()
        .map(|op| {
            parts
                .iter()
                .filter_map(|part| cells.get(&(part.clone(), op.clone())))
                .flatten()
                .sum::<f64>()
                / (pf * rf)
        })
        .collect();

    let ss_total: f64 = cells.values().flatten().map(|y| (y - grand).powi(2)).sum();
    let ss_part = of * rf * part_means.iter().map(|m| (m - grand).powi(2)).sum::<f64>();
    let ss_operator = pf * rf * operator_means.iter().map(|m| (m - grand).powi(2)).sum::<f64>();
    let ss_equipment: f64 = cells
        .values()
        .map(|v| {
            let m = v.iter().sum::<f64>() / rf;
            v.iter().map(|y| (y - m).powi(2)).sum::<f64>()
        })
        .sum();
    let ss_interaction = (ss_total - ss_part - ss_operator - ss_equipment).max(0.0);

    let df_part = p - 1;
    let df_operator = o - 1;
    let df_interaction = df_part * df_operator;
    let df_equipment = p * o * (r - 1);

    let ms_part = ss_part / df_part as f64;
    let ms_operator = ss_operator / df_operator as f64;
    let ms_interaction = ss_interaction / df_interaction as f64;
    let ms_equipment = ss_equipment / df_equipment as f64;

    let ratio = |num: f64, den: f64| {
        if den > 0.0 {
            num / den
        } else if num > 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    };

    let f_interaction = ratio(ms_interaction, ms_equipment);
    let p_interaction = f_test_p_value(f_interaction, df_interaction as f64, df_equipment as f64);
    let interaction_significant = p_interaction <= INTERACTION_POOLING_P;

    let (anova, variance) = if interaction_significant {
        let f_part = ratio(ms_part, ms_interaction);
        let f_operator = ratio(ms_operator, ms_interaction);
        let anova = vec![
            AnovaRow {
                source: "Part".into(),
                df: df_part,
                ss: ss_part,
                ms: ms_part,
                f: Some(f_part),
                p: Some(f_test_p_value(f_part, df_part as f64, df_interaction as f64)),
            },
            AnovaRow {
                source: "Operator".into(),
                df: df_operator,
                ss: ss_operator,
                ms: ms_operator,
                f: Some(f_operator),
                p: Some(f_test_p_value(f_operator, df_operator as f64, df_interaction as f64)),
            },
            AnovaRow {
                source: "Part x Operator".into(),
                df: df_interaction,
                ss: ss_interaction,
                ms: ms_interaction,
                f: Some(f_interaction),
                p: Some(p_interaction),
            },
            AnovaRow {
                source: "Repeatability".into(),
                df: df_equipment,
                ss: ss_equipment,
                ms: ms_equipment,
                f: None,
                p: None,
            },
        ];

        let repeatability = ms_equipment;
        let interaction = ((ms_interaction - ms_equipment) / rf).max(0.0);
        let operator = ((ms_operator - ms_interaction) / (pf * rf)).max(0.0);
        let part = ((ms_part - ms_interaction) / (of * rf)).max(0.0);
        (anova, (repeatability, operator, interaction, part))
    } else {
        let df_pooled = df_interaction + df_equipment;
        let ms_pooled = (ss_interaction + ss_equipment) / df_pooled as f64;
        let f_part = ratio(ms_part, ms_pooled);
        let f_operator = ratio(ms_operator, ms_pooled);
        let anova = vec![
            AnovaRow {
                source: "Part".into(),
                df: df_part,
                ss: ss_part,
                ms: ms_part,
                f: Some(f_part),
                p: Some(f_test_p_value(f_part, df_part as f64, df_pooled as f64)),
            },
            AnovaRow {
                source: "Operator".into(),
                df: df_operator,
                ss: ss_operator,
                ms: ms_operator,
                f: Some(f_operator),
                p: Some(f_test_p_value(f_operator, df_operator as f64, df_pooled as f64)),
            },
            AnovaRow {
                source: "Repeatability".into(),
                df: df_pooled,
                ss: ss_interaction + ss_equipment,
                ms: ms_pooled,
                f: None,
                p: None,
            },
        ];

        let repeatability = ms_pooled;
        let operator = ((ms_operator - ms_pooled) / (pf * rf)).max(0.0);
        let part = ((ms_part - ms_pooled) / (of * rf)).max(0.0);
        (anova, (repeatability, operator, 0.0, part))
    };

    let (repeatability, operator, interaction, part) = variance;
    let reproducibility = operator + interaction;
    let grr = repeatability + reproducibility;
    let total = grr + part;

    let pct_grr = study_pct(grr, total);
    let ndc = if grr > 0.0 {
        (1.41 * (part / grr).sqrt()).floor() as u32
    } else {
        0
    };

    tracing::debug!(parts = p, operators = o, replicates = r, pct_grr, ndc, "gage r&r computed");

    Some(GageRrResult {
        parts: p,
        operators: o,
        replicates: r,
        anova,
        interaction_significant,
        pct_repeatability: study_pct(repeatability, total),
        pct_reproducibility: study_pct(reproducibility, total),
        pct_grr,
        pct_part: study_pct(part, total),
        ndc,
        verdict: thresholds.classify(pct_grr),
        variance: VarianceComponents {
            repeatability,
            reproducibility,
            operator,
            interaction,
            grr,
            part,
            total,
        },
    })
}
