//! Simple regression of an outcome on one numeric predictor
//!
//! Fits a straight line and, with enough points, a quadratic. The quadratic
//! is recommended only when it adds a meaningful amount of explained
//! variance over the line.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::analysis::distributions::t_test_p_value;
use crate::analysis::ols;
use crate::core::data::{numeric_value, DataRow};

/// Minimum r² gain for the quadratic fit to be recommended
pub const QUADRATIC_R2_GAIN: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub slope_std_error: f64,
    pub t_statistic: f64,
    pub p_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuadraticFit {
    /// y = a + b·x + c·x²
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub r_squared: f64,
    /// p-value of the x² term
    pub p_value_quadratic: f64,
    /// x at the vertex (maximum when c < 0, minimum when c > 0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimum_x: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitType {
    Linear,
    Quadratic,
}

impl fmt::Display for FitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitType::Linear => write!(f, "linear"),
            FitType::Quadratic => write!(f, "quadratic"),
        }
    }
}

/// Strength of the relationship by r²
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegressionStrength {
    Weak,
    Moderate,
    Strong,
}

impl RegressionStrength {
    pub fn from_r_squared(r2: f64) -> Self {
        if r2 < 0.3 {
            RegressionStrength::Weak
        } else if r2 < 0.7 {
            RegressionStrength::Moderate
        } else {
            RegressionStrength::Strong
        }
    }
}

impl fmt::Display for RegressionStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegressionStrength::Weak => write!(f, "weak"),
            RegressionStrength::Moderate => write!(f, "moderate"),
            RegressionStrength::Strong => write!(f, "strong"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    pub x_column: String,
    pub y_column: String,
    pub n: usize,
    pub linear: LinearFit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quadratic: Option<QuadraticFit>,
    pub recommended_fit: FitType,
    pub strength: RegressionStrength,
    pub is_significant: bool,
}

fn linear_fit(xs: &[f64], ys: &[f64]) -> Option<LinearFit> {
    let n = xs.len() as f64;
    let mx = xs.iter().sum::<f64>() / n;
    let my = ys.iter().sum::<f64>() / n;
    let sxx: f64 = xs.iter().map(|x| (x - mx).powi(2)).sum();
    if sxx <= 0.0 {
        return None;
    }
    let sxy: f64 = xs.iter().zip(ys).map(|(x, y)| (x - mx) * (y - my)).sum();
    let syy: f64 = ys.iter().map(|y| (y - my).powi(2)).sum();

    let slope = sxy / sxx;
    let intercept = my - slope * mx;
    let sse: f64 = xs
        .iter()
        .zip(ys)
        .map(|(x, y)| (y - (intercept + slope * x)).powi(2))
        .sum();
    let r_squared = if syy > 0.0 {
        (1.0 - sse / syy).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let df = n - 2.0;
    let slope_std_error = (sse / df / sxx).sqrt();
    let t_statistic = if slope_std_error > 0.0 {
        slope / slope_std_error
    } else if slope != 0.0 {
        f64::INFINITY.copysign(slope)
    } else {
        0.0
    };

    Some(LinearFit {
        slope,
        intercept,
        r_squared,
        slope_std_error,
        t_statistic,
        p_value: t_test_p_value(t_statistic, df),
    })
}

fn quadratic_fit(xs: &[f64], ys: &[f64]) -> Option<QuadraticFit> {
    // Center x to keep x² well conditioned, then map coefficients back
    let mx = xs.iter().sum::<f64>() / xs.len() as f64;
    let design: Vec<Vec<f64>> = xs
        .iter()
        .map(|x| {
            let d = x - mx;
            vec![1.0, d, d * d]
        })
        .collect();
    let fit = ols::fit(&design, ys)?;
    let (a0, b0, c) = (fit.coefficients[0], fit.coefficients[1], fit.coefficients[2]);

    let a = a0 - b0 * mx + c * mx * mx;
    let b = b0 - 2.0 * c * mx;

    let se_c = fit.std_errors[2];
    let t_c = if se_c > 0.0 { c / se_c } else { 0.0 };
    let optimum_x = (c.abs() > f64::EPSILON).then(|| -b / (2.0 * c));

    Some(QuadraticFit {
        a,
        b,
        c,
        r_squared: fit.r_squared,
        p_value_quadratic: t_test_p_value(t_c, fit.df_residual() as f64),
        optimum_x,
    })
}

/// Regress `y_column` on `x_column`
///
/// Rows where either value is non-numeric are skipped. `None` with fewer
/// than three points or a constant predictor.
pub fn calculate_regression(
    rows: &[DataRow],
    x_column: &str,
    y_column: &str,
    alpha: f64,
) -> Option<RegressionResult> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = rows
        .iter()
        .filter_map(|row| Some((numeric_value(row, x_column)?, numeric_value(row, y_column)?)))
        .unzip();

    if xs.len() < 3 {
        return None;
    }

    let linear = linear_fit(&xs, &ys)?;
    let quadratic = if xs.len() >= 4 {
        quadratic_fit(&xs, &ys)
    } else {
        None
    };

    let recommended_fit = match &quadratic {
        Some(q) if q.r_squared - linear.r_squared >= QUADRATIC_R2_GAIN => FitType::Quadratic,
        _ => FitType::Linear,
    };
    let best_r2 = match (&quadratic, recommended_fit) {
        (Some(q), FitType::Quadratic) => q.r_squared,
        _ => linear.r_squared,
    };

    tracing::debug!(x = x_column, y = y_column, n = xs.len(), r2 = best_r2, "regression fitted");

    Some(RegressionResult {
        x_column: x_column.to_string(),
        y_column: y_column.to_string(),
        n: xs.len(),
        is_significant: linear.p_value < alpha
            || quadratic
                .as_ref()
                .is_some_and(|q| recommended_fit == FitType::Quadratic && q.p_value_quadratic < alpha),
        linear,
        quadratic,
        recommended_fit,
        strength: RegressionStrength::from_r_squared(best_r2),
    })
}
