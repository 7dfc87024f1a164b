//! Analysis tests over CSV fixtures

mod common;

use common::{dataset, weight_rows, GAGE_CSV, REGRESSION_CSV};
use variscout::analysis::thresholds::{EtaThresholds, GrrThresholds};
use variscout::analysis::{
    calculate_anova, calculate_gage_rr, calculate_multi_regression, calculate_regression,
    calculate_stats, category_stats, find_optimal_factors, EffectSize, FitType, GlmOptions,
    GrrVerdict, SpecLimits,
};
use variscout::core::data::numeric_column;
use variscout::core::ColumnKind;

#[test]
fn test_dataset_classifies_columns() {
    let ds = dataset(REGRESSION_CSV);
    assert_eq!(ds.kind("Temperature"), ColumnKind::Numeric);
    assert_eq!(ds.kind("Line"), ColumnKind::Categorical);
    assert_eq!(ds.categorical_columns(), vec!["Line".to_string()]);
    assert!(ds.require_column("Pressure").is_err());
}

#[test]
fn test_ranking_puts_machine_first() {
    let rows = weight_rows();
    let factors = vec!["Shift".to_string(), "Machine".to_string(), "Weight".to_string()];
    let ranking = find_optimal_factors(&rows, &factors, "Weight", &EtaThresholds::default());

    assert_eq!(ranking.len(), 2);
    assert_eq!(ranking[0].factor, "Machine");
    assert_eq!(ranking[0].effect_size, EffectSize::Large);
    assert!((ranking[0].eta_squared - 32.0 / 34.0).abs() < 1e-9);
    assert!((ranking[1].eta_squared - 2.0 / 34.0).abs() < 1e-9);
    assert_eq!(ranking[1].effect_size, EffectSize::Small);
}

#[test]
fn test_category_contributions_sum_to_eta() {
    let rows = weight_rows();
    let stats = category_stats(&rows, "Machine", "Weight");
    let total: f64 = stats.iter().map(|c| c.contribution_pct).sum();
    assert!((total - 32.0 / 34.0 * 100.0).abs() < 1e-9);
}

#[test]
fn test_capability_on_fixture() {
    let rows = weight_rows();
    let values = numeric_column(&rows, "Weight");
    let no_specs = calculate_stats(&values, None).unwrap();
    assert!(no_specs.cpk.is_none());
    assert!((no_specs.mean - 12.5).abs() < 1e-9);

    let specs = SpecLimits::new(Some(14.5), Some(9.5));
    let stats = calculate_stats(&values, Some(&specs)).unwrap();
    assert!(stats.cp.is_some());
    assert!(stats.cpk.is_some());
    // the two 15s are above the USL
    assert!((stats.out_of_spec_percentage - 25.0).abs() < 1e-9);
}

#[test]
fn test_anova_machine_is_significant() {
    let rows = weight_rows();
    let result = calculate_anova(&rows, "Machine", "Weight", 0.05).unwrap();
    assert_eq!(result.df_between, 1);
    assert_eq!(result.df_within, 6);
    assert!(result.is_significant);
    assert!(result.p_value < 0.001);
    assert!(result.insight.contains("Machine"));

    let shift = calculate_anova(&rows, "Shift", "Weight", 0.05).unwrap();
    assert!(!shift.is_significant);
}

#[test]
fn test_regression_on_temperature() {
    let ds = dataset(REGRESSION_CSV);
    let result = calculate_regression(&ds.rows, "Temperature", "Yield", 0.05).unwrap();
    assert_eq!(result.n, 6);
    assert!(result.linear.r_squared > 0.99);
    assert!(result.linear.slope > 0.19 && result.linear.slope < 0.21);
    assert!(result.is_significant);
    assert_eq!(result.recommended_fit, FitType::Linear);
}

#[test]
fn test_glm_with_categorical_line() {
    let ds = dataset(REGRESSION_CSV);
    let predictors = vec!["Temperature".to_string(), "Line".to_string()];
    let result =
        calculate_multi_regression(&ds.rows, "Yield", &predictors, &GlmOptions::default()).unwrap();

    assert_eq!(result.n, 6);
    let names: Vec<&str> = result.terms.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Temperature", "Line[L2]"]);
    assert_eq!(
        result.reference_levels,
        vec![("Line".to_string(), "L1".to_string())]
    );
    assert!(result.r_squared > 0.99);
}

#[test]
fn test_gage_study_on_fixture() {
    let ds = dataset(GAGE_CSV);
    let result = calculate_gage_rr(
        &ds.rows,
        "Part",
        "Operator",
        "Measurement",
        &GrrThresholds::default(),
    )
    .unwrap();

    assert_eq!((result.parts, result.operators, result.replicates), (3, 2, 2));
    assert!(result.pct_grr < 10.0);
    assert_eq!(result.verdict, GrrVerdict::Excellent);
    assert!(result.ndc >= 5);
    assert!(result.variance.part > result.variance.grr);
}

#[test]
fn test_gage_missing_cell_is_none() {
    let ds = dataset(&GAGE_CSV.replace("P3,Bob,14.1\nP3,Bob,14.0\n", ""));
    assert!(calculate_gage_rr(
        &ds.rows,
        "Part",
        "Operator",
        "Measurement",
        &GrrThresholds::default()
    )
    .is_none());
}
