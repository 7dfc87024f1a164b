//! Statistical analyses
//!
//! Every analysis is a pure function over `&[DataRow]`. Insufficient data is
//! reported as `None` (or an empty collection), never as an error.
//!
//! - [`descriptive`] - mean, σ, control limits, Cp/Cpk, out-of-spec share
//! - [`variation`] - η², factor ranking, per-category contributions
//! - [`drill`] - drill-path accumulation over a filter stack
//! - [`projection`] - before/after statistics for a filter stack
//! - [`anova`] - one-way ANOVA
//! - [`regression`] - simple linear and quadratic regression
//! - [`multi_regression`] - GLM with dummy coding, interactions and VIF
//! - [`gage_rr`] - crossed Gage R&R (ANOVA method)

pub mod anova;
pub mod descriptive;
pub mod distributions;
pub mod drill;
pub mod gage_rr;
pub mod multi_regression;
pub mod ols;
pub mod projection;
pub mod regression;
pub mod thresholds;
pub mod variation;

pub use anova::{calculate_anova, AnovaGroup, AnovaResult};
pub use descriptive::{calculate_stats, Grade, GradeCount, SpecLimits, StatsResult};
pub use drill::{compute_drill_path, DrillPath, DrillStep};
pub use gage_rr::{calculate_gage_rr, GageRrResult, VarianceComponents};
pub use multi_regression::{
    calculate_multi_regression, Collinearity, GlmOptions, MultiRegressionResult, RegressionTerm,
};
pub use projection::{calculate_projected_stats, ProjectedStats};
pub use regression::{calculate_regression, FitType, RegressionResult, RegressionStrength};
pub use thresholds::{
    CapabilityLevel, CpkThresholds, EffectSize, EtaThresholds, GrrThresholds, GrrVerdict,
    Thresholds,
};
pub use variation::{category_stats, eta_squared, find_optimal_factors, CategoryStats, FactorRanking};
