//! Multiple regression (general linear model) with mixed predictors
//!
//! Numeric predictors enter as-is. Categorical predictors are dummy coded
//! against their first level in sorted order. Optional pairwise interaction
//! terms are the products of the encoded columns of both predictors.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

use crate::analysis::descriptive::{mean, sample_std_dev};
use crate::analysis::distributions::{f_test_p_value, t_test_p_value};
use crate::analysis::ols;
use crate::core::data::{category_of, classify_column, numeric_value, ColumnKind, DataRow};

/// VIF above which multicollinearity is worth a warning
pub const VIF_MODERATE: f64 = 5.0;
/// VIF above which coefficients are unreliable
pub const VIF_SEVERE: f64 = 10.0;

/// Options for [`calculate_multi_regression`]
#[derive(Debug, Clone)]
pub struct GlmOptions {
    /// Predictors to treat as categorical even if their values are numeric
    pub force_categorical: Vec<String>,
    /// Pairwise interaction terms
    pub interactions: Vec<(String, String)>,
    /// Significance level for term flags, in (0, 1)
    pub alpha: f64,
}

impl Default for GlmOptions {
    fn default() -> Self {
        Self {
            force_categorical: Vec::new(),
            interactions: Vec::new(),
            alpha: 0.05,
        }
    }
}

/// Multicollinearity level of a term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collinearity {
    None,
    Moderate,
    Severe,
}

impl Collinearity {
    pub fn from_vif(vif: f64) -> Self {
        if vif > VIF_SEVERE {
            Collinearity::Severe
        } else if vif > VIF_MODERATE {
            Collinearity::Moderate
        } else {
            Collinearity::None
        }
    }
}

impl fmt::Display for Collinearity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collinearity::None => write!(f, "none"),
            Collinearity::Moderate => write!(f, "moderate"),
            Collinearity::Severe => write!(f, "severe"),
        }
    }
}

/// One estimated term of the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTerm {
    pub name: String,
    /// Predictor this term comes from (`a:b` for interactions)
    pub predictor: String,
    pub estimate: f64,
    pub std_error: f64,
    pub t_statistic: f64,
    pub p_value: f64,
    pub is_significant: bool,
    /// β·sd(x)/sd(y), numeric main effects only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standardized: Option<f64>,
    pub vif: f64,
    pub collinearity: Collinearity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiRegressionResult {
    pub outcome: String,
    pub n: usize,
    pub intercept: f64,
    pub terms: Vec<RegressionTerm>,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    pub f_statistic: f64,
    pub p_value: f64,
    pub rmse: f64,
    pub df_model: usize,
    pub df_residual: usize,
    /// Categorical predictors and their reference levels
    pub reference_levels: Vec<(String, String)>,
    pub warnings: Vec<String>,
}

/// An encoded predictor: its design columns and how to compute them per row
struct Encoded {
    predictor: String,
    kind: ColumnKind,
    /// (column name, level) - level is `None` for numeric predictors
    columns: Vec<(String, Option<String>)>,
}

impl Encoded {
    fn values(&self, row: &DataRow) -> Vec<f64> {
        match self.kind {
            ColumnKind::Numeric => vec![numeric_value(row, &self.predictor).unwrap_or(0.0)],
            ColumnKind::Categorical => {
                let key = category_of(row, &self.predictor);
                self.columns
                    .iter()
                    .map(|(_, level)| {
                        if key.is_some() && key.as_ref() == level.as_ref() {
                            1.0
                        } else {
                            0.0
                        }
                    })
                    .collect()
            }
        }
    }
}

struct DesignColumn {
    name: String,
    predictor: String,
    numeric_main: bool,
}

fn r_squared_of(column: usize, design: &[Vec<f64>]) -> f64 {
    // Regress one term column on every other column, intercept included
    let y: Vec<f64> = design.iter().map(|r| r[column]).collect();
    let others: Vec<Vec<f64>> = design
        .iter()
        .map(|r| {
            r.iter()
                .enumerate()
                .filter(|(j, _)| *j != column)
                .map(|(_, v)| *v)
                .collect()
        })
        .collect();
    ols::fit(&others, &y).map(|f| f.r_squared).unwrap_or(1.0)
}

fn variance_inflation(column: usize, design: &[Vec<f64>]) -> f64 {
    let r2 = r_squared_of(column, design);
    if r2 >= 1.0 {
        f64::INFINITY
    } else {
        1.0 / (1.0 - r2)
    }
}

/// Fit a multiple regression of `outcome` on `predictors`
///
/// Rows missing the outcome or any predictor value are dropped. Returns
/// `None` when no usable design remains, n ≤ parameter count, or the design
/// is singular.
pub fn calculate_multi_regression(
    rows: &[DataRow],
    outcome: &str,
    predictors: &[String],
    options: &GlmOptions,
) -> Option<MultiRegressionResult> {
    let alpha = options.alpha;
    if predictors.is_empty() {
        return None;
    }

    let forced: HashSet<&str> = options.force_categorical.iter().map(String::as_str).collect();
    let kinds: Vec<(String, ColumnKind)> = predictors
        .iter()
        .filter(|p| p.as_str() != outcome)
        .map(|p| {
            let kind = if forced.contains(p.as_str()) {
                ColumnKind::Categorical
            } else {
                classify_column(rows, p)
            };
            (p.clone(), kind)
        })
        .collect();

    let usable: Vec<&DataRow> = rows
        .iter()
        .filter(|row| numeric_value(row, outcome).is_some())
        .filter(|row| {
            kinds.iter().all(|(p, kind)| match kind {
                ColumnKind::Numeric => numeric_value(row, p).is_some(),
                ColumnKind::Categorical => category_of(row, p).is_some(),
            })
        })
        .collect();

    let mut warnings = Vec::new();
    let dropped = rows.len() - usable.len();
    if dropped > 0 {
        warnings.push(format!("{} row(s) dropped for missing values", dropped));
        tracing::warn!(dropped, "rows dropped from regression");
    }

    // Encode predictors
    let mut reference_levels = Vec::new();
    let mut encoded: Vec<Encoded> = Vec::new();
    for (predictor, kind) in &kinds {
        match kind {
            ColumnKind::Numeric => encoded.push(Encoded {
                predictor: predictor.clone(),
                kind: *kind,
                columns: vec![(predictor.clone(), None)],
            }),
            ColumnKind::Categorical => {
                let levels: BTreeSet<String> = usable
                    .iter()
                    .filter_map(|row| category_of(row, predictor))
                    .collect();
                let mut levels = levels.into_iter();
                let Some(reference) = levels.next() else {
                    continue;
                };
                let columns: Vec<(String, Option<String>)> = levels
                    .map(|level| (format!("{}[{}]", predictor, level), Some(level)))
                    .collect();
                if columns.is_empty() {
                    warnings.push(format!("{} has a single level and was dropped", predictor));
                    continue;
                }
                reference_levels.push((predictor.clone(), reference));
                encoded.push(Encoded {
                    predictor: predictor.clone(),
                    kind: *kind,
                    columns,
                });
            }
        }
    }

    let mut columns: Vec<DesignColumn> = encoded
        .iter()
        .flat_map(|e| {
            e.columns.iter().map(move |(name, _)| DesignColumn {
                name: name.clone(),
                predictor: e.predictor.clone(),
                numeric_main: e.kind == ColumnKind::Numeric,
            })
        })
        .collect();

    let mut interaction_pairs: Vec<(usize, usize)> = Vec::new();
    for (a, b) in &options.interactions {
        let ia = encoded.iter().position(|e| &e.predictor == a);
        let ib = encoded.iter().position(|e| &e.predictor == b);
        match (ia, ib) {
            (Some(ia), Some(ib)) if ia != ib => {
                for (na, _) in &encoded[ia].columns {
                    for (nb, _) in &encoded[ib].columns {
                        columns.push(DesignColumn {
                            name: format!("{}:{}", na, nb),
                            predictor: format!("{}:{}", a, b),
                            numeric_main: false,
                        });
                    }
                }
                interaction_pairs.push((ia, ib));
            }
            _ => warnings.push(format!("interaction {}:{} ignored (unknown predictor)", a, b)),
        }
    }

    if columns.is_empty() {
        return None;
    }

    let mut design: Vec<Vec<f64>> = Vec::with_capacity(usable.len());
    let mut y: Vec<f64> = Vec::with_capacity(usable.len());
    for row in &usable {
        let per_predictor: Vec<Vec<f64>> = encoded.iter().map(|e| e.values(row)).collect();
        let mut line = vec![1.0];
        for values in &per_predictor {
            line.extend(values);
        }
        for &(ia, ib) in &interaction_pairs {
            for va in &per_predictor[ia] {
                for vb in &per_predictor[ib] {
                    line.push(va * vb);
                }
            }
        }
        design.push(line);
        y.push(numeric_value(row, outcome)?);
    }

    let fit = ols::fit(&design, &y)?;
    let n = fit.n;
    let p = fit.p;
    let df_model = p - 1;
    let df_residual = fit.df_residual();

    let sd_y = mean(&y).map(|m| sample_std_dev(&y, m)).unwrap_or(0.0);

    let terms: Vec<RegressionTerm> = columns
        .iter()
        .enumerate()
        .map(|(i, col)| {
            let j = i + 1;
            let estimate = fit.coefficients[j];
            let std_error = fit.std_errors[j];
            let t_statistic = if std_error > 0.0 { estimate / std_error } else { 0.0 };
            let p_value = t_test_p_value(t_statistic, df_residual as f64);
            let standardized = if col.numeric_main && sd_y > 0.0 {
                let xs: Vec<f64> = design.iter().map(|r| r[j]).collect();
                mean(&xs).map(|m| estimate * sample_std_dev(&xs, m) / sd_y)
            } else {
                None
            };
            let vif = if columns.len() > 1 {
                variance_inflation(j, &design)
            } else {
                1.0
            };
            let collinearity = Collinearity::from_vif(vif);
            if collinearity != Collinearity::None {
                warnings.push(format!(
                    "{} has {} multicollinearity (VIF = {:.1})",
                    col.name, collinearity, vif
                ));
            }
            RegressionTerm {
                name: col.name.clone(),
                predictor: col.predictor.clone(),
                estimate,
                std_error,
                t_statistic,
                p_value,
                is_significant: p_value < alpha,
                standardized,
                vif,
                collinearity,
            }
        })
        .collect();

    let r_squared = fit.r_squared;
    let adj_r_squared = 1.0 - (1.0 - r_squared) * (n - 1) as f64 / df_residual as f64;
    let f_statistic = if r_squared < 1.0 {
        (r_squared / df_model as f64) / ((1.0 - r_squared) / df_residual as f64)
    } else {
        f64::INFINITY
    };
    let p_value = f_test_p_value(f_statistic, df_model as f64, df_residual as f64);

    tracing::debug!(outcome, n, terms = terms.len(), r_squared, "multiple regression fitted");

    Some(MultiRegressionResult {
        outcome: outcome.to_string(),
        n,
        intercept: fit.coefficients[0],
        terms,
        r_squared,
        adj_r_squared,
        f_statistic,
        p_value,
        rmse: fit.mse().sqrt(),
        df_model,
        df_residual,
        reference_levels,
        warnings,
    })
}
