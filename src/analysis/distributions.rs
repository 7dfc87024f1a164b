//! Tail probabilities for the test statistics used by the analyses

use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};

/// Upper-tail probability P(F > f) for F(df1, df2)
///
/// Degenerate inputs map to the conservative answer: an infinite statistic
/// is maximally significant, a non-positive or NaN one is not significant.
pub fn f_test_p_value(f: f64, df1: f64, df2: f64) -> f64 {
    if f.is_nan() || f <= 0.0 {
        return 1.0;
    }
    if f.is_infinite() {
        return 0.0;
    }
    match FisherSnedecor::new(df1, df2) {
        Ok(dist) => dist.sf(f).clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}

/// Two-tailed p-value for a t statistic with `df` degrees of freedom
pub fn t_test_p_value(t: f64, df: f64) -> f64 {
    if t.is_nan() {
        return 1.0;
    }
    if t.is_infinite() {
        return 0.0;
    }
    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => (2.0 * dist.sf(t.abs())).clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}
