//! Capability statistics - mean, σ, control limits, Cp/Cpk, out-of-spec share

use serde::{Deserialize, Serialize};

/// A named grade band: values up to and including `max`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub max: f64,
    pub label: String,
}

/// Specification limits for an outcome
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecLimits {
    /// Upper specification limit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usl: Option<f64>,

    /// Lower specification limit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lsl: Option<f64>,

    /// Target (nominal) value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<f64>,

    /// Optional grading tiers
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub grades: Vec<Grade>,
}

impl SpecLimits {
    pub fn new(usl: Option<f64>, lsl: Option<f64>) -> Self {
        Self {
            usl,
            lsl,
            ..Default::default()
        }
    }

    /// True when at least one limit is set
    pub fn has_limits(&self) -> bool {
        self.usl.is_some() || self.lsl.is_some()
    }

    /// Overlay non-empty values from `other`
    pub fn merged_with(&self, other: &SpecLimits) -> SpecLimits {
        SpecLimits {
            usl: other.usl.or(self.usl),
            lsl: other.lsl.or(self.lsl),
            target: other.target.or(self.target),
            grades: if other.grades.is_empty() {
                self.grades.clone()
            } else {
                other.grades.clone()
            },
        }
    }

    fn is_out_of_spec(&self, x: f64) -> bool {
        self.usl.is_some_and(|usl| x > usl) || self.lsl.is_some_and(|lsl| x < lsl)
    }
}

/// Number of values per grade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeCount {
    pub label: String,
    pub max: f64,
    pub count: usize,
}

/// Descriptive and capability statistics for one set of values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsResult {
    pub n: usize,
    pub mean: f64,
    /// Sample standard deviation (n-1 denominator)
    pub std_dev: f64,
    /// Upper control limit (mean + 3σ)
    pub ucl: f64,
    /// Lower control limit (mean - 3σ)
    pub lcl: f64,
    pub min: f64,
    pub max: f64,
    /// Cp = (USL - LSL) / 6σ, both limits required
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cp: Option<f64>,
    /// Cpk = min(CPU, CPL) over the limits that are present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpk: Option<f64>,
    pub out_of_spec_percentage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade_counts: Option<Vec<GradeCount>>,
}

/// Arithmetic mean; `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sample standard deviation around a known mean (0 for fewer than 2 values)
pub fn sample_std_dev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let ss: f64 = values.iter().map(|x| (x - mean).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// Sum of squared deviations from the mean
pub fn sum_of_squares(values: &[f64], mean: f64) -> f64 {
    values.iter().map(|x| (x - mean).powi(2)).sum()
}

/// Cp and Cpk for a given mean and σ
pub fn capability(mean: f64, std_dev: f64, specs: &SpecLimits) -> (Option<f64>, Option<f64>) {
    if std_dev <= 0.0 || !std_dev.is_finite() {
        return (None, None);
    }
    let cp = match (specs.usl, specs.lsl) {
        (Some(usl), Some(lsl)) => Some((usl - lsl) / (6.0 * std_dev)),
        _ => None,
    };
    let cpu = specs.usl.map(|usl| (usl - mean) / (3.0 * std_dev));
    let cpl = specs.lsl.map(|lsl| (mean - lsl) / (3.0 * std_dev));
    let cpk = match (cpu, cpl) {
        (Some(u), Some(l)) => Some(u.min(l)),
        (Some(u), None) => Some(u),
        (None, Some(l)) => Some(l),
        (None, None) => None,
    };
    (cp, cpk)
}

fn grade_counts(values: &[f64], grades: &[Grade]) -> Vec<GradeCount> {
    let mut sorted: Vec<&Grade> = grades.iter().collect();
    sorted.sort_by(|a, b| a.max.total_cmp(&b.max));

    let mut counts: Vec<GradeCount> = sorted
        .iter()
        .map(|g| GradeCount {
            label: g.label.clone(),
            max: g.max,
            count: 0,
        })
        .collect();

    let last = counts.len() - 1;
    for &x in values {
        let idx = sorted.iter().position(|g| x <= g.max).unwrap_or(last);
        counts[idx].count += 1;
    }
    counts
}

/// Compute descriptive and capability statistics
///
/// Returns `None` when there are no values.
pub fn calculate_stats(values: &[f64], specs: Option<&SpecLimits>) -> Option<StatsResult> {
    let mean = mean(values)?;
    let std_dev = sample_std_dev(values, mean);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let (cp, cpk, out_of_spec_percentage, grades) = match specs {
        Some(specs) => {
            let (cp, cpk) = capability(mean, std_dev, specs);
            let out = values.iter().filter(|&&x| specs.is_out_of_spec(x)).count();
            let grades = (!specs.grades.is_empty()).then(|| grade_counts(values, &specs.grades));
            (
                cp,
                cpk,
                out as f64 / values.len() as f64 * 100.0,
                grades,
            )
        }
        None => (None, None, 0.0, None),
    };

    Some(StatsResult {
        n: values.len(),
        mean,
        std_dev,
        ucl: mean + 3.0 * std_dev,
        lcl: mean - 3.0 * std_dev,
        min,
        max,
        cp,
        cpk,
        out_of_spec_percentage,
        grade_counts: grades,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALUES: [f64; 8] = [10.0, 11.0, 10.0, 11.0, 14.0, 15.0, 14.0, 15.0];

    #[test]
    fn test_basic_stats() {
        let s = calculate_stats(&VALUES, None).unwrap();
        assert_eq!(s.n, 8);
        assert!((s.mean - 12.5).abs() < 1e-12);
        // SS = 34, sample variance = 34 / 7
        assert!((s.std_dev - (34.0_f64 / 7.0).sqrt()).abs() < 1e-12);
        assert!((s.ucl - (s.mean + 3.0 * s.std_dev)).abs() < 1e-12);
        assert!((s.lcl - (s.mean - 3.0 * s.std_dev)).abs() < 1e-12);
        assert_eq!(s.min, 10.0);
        assert_eq!(s.max, 15.0);
        assert_eq!(s.out_of_spec_percentage, 0.0);
    }

    #[test]
    fn test_empty_values() {
        assert!(calculate_stats(&[], None).is_none());
    }

    #[test]
    fn test_single_value_has_zero_sigma() {
        let s = calculate_stats(&[4.2], Some(&SpecLimits::new(Some(5.0), Some(4.0)))).unwrap();
        assert_eq!(s.std_dev, 0.0);
        assert!(s.cp.is_none());
        assert!(s.cpk.is_none());
    }

    #[test]
    fn test_cpk_requires_spec_limits() {
        let s = calculate_stats(&VALUES, None).unwrap();
        assert!(s.cpk.is_none());
        assert!(s.cp.is_none());

        let s = calculate_stats(&VALUES, Some(&SpecLimits::default())).unwrap();
        assert!(s.cpk.is_none());

        let s = calculate_stats(&VALUES, Some(&SpecLimits::new(Some(20.0), None))).unwrap();
        assert!(s.cpk.is_some());
        assert!(s.cp.is_none());
    }

    #[test]
    fn test_cp_cpk_two_sided() {
        let specs = SpecLimits::new(Some(20.0), Some(8.0));
        let s = calculate_stats(&VALUES, Some(&specs)).unwrap();
        let sigma = s.std_dev;
        assert!((s.cp.unwrap() - 12.0 / (6.0 * sigma)).abs() < 1e-12);
        let cpu = (20.0 - 12.5) / (3.0 * sigma);
        let cpl = (12.5 - 8.0) / (3.0 * sigma);
        assert!((s.cpk.unwrap() - cpu.min(cpl)).abs() < 1e-12);
    }

    #[test]
    fn test_one_sided_lower_limit() {
        let s = calculate_stats(&VALUES, Some(&SpecLimits::new(None, Some(9.0)))).unwrap();
        let cpl = (12.5 - 9.0) / (3.0 * s.std_dev);
        assert!((s.cpk.unwrap() - cpl).abs() < 1e-12);
    }

    #[test]
    fn test_out_of_spec_percentage() {
        let specs = SpecLimits::new(Some(14.5), Some(10.5));
        let s = calculate_stats(&VALUES, Some(&specs)).unwrap();
        // 10, 10 below; 15, 15 above
        assert!((s.out_of_spec_percentage - 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_grade_counts() {
        let specs = SpecLimits {
            grades: vec![
                Grade {
                    max: 12.0,
                    label: "B".into(),
                },
                Grade {
                    max: 10.0,
                    label: "A".into(),
                },
                Grade {
                    max: 14.0,
                    label: "C".into(),
                },
            ],
            ..Default::default()
        };
        let s = calculate_stats(&VALUES, Some(&specs)).unwrap();
        let counts = s.grade_counts.unwrap();
        let labels: Vec<_> = counts.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["A", "B", "C"]);
        // 10,10 -> A; 11,11 -> B; 14,14 -> C; 15,15 overflow into C
        let n: Vec<_> = counts.iter().map(|g| g.count).collect();
        assert_eq!(n, vec![2, 2, 4]);
    }

    #[test]
    fn test_spec_merge_prefers_override() {
        let base = SpecLimits {
            usl: Some(10.0),
            lsl: Some(1.0),
            target: Some(5.0),
            grades: vec![],
        };
        let merged = base.merged_with(&SpecLimits::new(Some(12.0), None));
        assert_eq!(merged.usl, Some(12.0));
        assert_eq!(merged.lsl, Some(1.0));
        assert_eq!(merged.target, Some(5.0));
    }
}
