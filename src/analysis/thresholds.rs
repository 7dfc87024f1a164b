//! Classification bands for η², Cpk and %GRR
//!
//! Every classification is a plain step function of its input. The band
//! edges are configurable through [`crate::core::Config`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Cpk band edges
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CpkThresholds {
    pub critical: f64,
    pub warning: f64,
    pub capable: f64,
}

impl Default for CpkThresholds {
    fn default() -> Self {
        Self {
            critical: 1.0,
            warning: 1.33,
            capable: 1.67,
        }
    }
}

impl CpkThresholds {
    /// Edges must be positive and strictly increasing
    pub fn is_valid(&self) -> bool {
        self.critical > 0.0 && self.critical < self.warning && self.warning < self.capable
    }

    pub fn classify(&self, cpk: f64) -> CapabilityLevel {
        if cpk < self.critical {
            CapabilityLevel::Critical
        } else if cpk < self.warning {
            CapabilityLevel::Warning
        } else if cpk < self.capable {
            CapabilityLevel::Capable
        } else {
            CapabilityLevel::Excellent
        }
    }
}

/// η² effect-size band edges
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EtaThresholds {
    pub medium: f64,
    pub large: f64,
}

impl Default for EtaThresholds {
    fn default() -> Self {
        Self {
            medium: 0.06,
            large: 0.14,
        }
    }
}

impl EtaThresholds {
    pub fn is_valid(&self) -> bool {
        self.medium > 0.0 && self.medium < self.large && self.large <= 1.0
    }

    pub fn classify(&self, eta_squared: f64) -> EffectSize {
        if eta_squared < self.medium {
            EffectSize::Small
        } else if eta_squared < self.large {
            EffectSize::Medium
        } else {
            EffectSize::Large
        }
    }
}

/// %GRR band edges (AIAG: 10 / 30)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrrThresholds {
    pub excellent: f64,
    pub marginal: f64,
}

impl Default for GrrThresholds {
    fn default() -> Self {
        Self {
            excellent: 10.0,
            marginal: 30.0,
        }
    }
}

impl GrrThresholds {
    pub fn is_valid(&self) -> bool {
        self.excellent > 0.0 && self.excellent < self.marginal
    }

    /// Below `excellent` is excellent, up to and including `marginal` is
    /// marginal, anything above is unacceptable.
    pub fn classify(&self, pct_grr: f64) -> GrrVerdict {
        if pct_grr < self.excellent {
            GrrVerdict::Excellent
        } else if pct_grr <= self.marginal {
            GrrVerdict::Marginal
        } else {
            GrrVerdict::Unacceptable
        }
    }
}

/// All classification thresholds together
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub cpk: CpkThresholds,
    pub eta: EtaThresholds,
    pub grr: GrrThresholds,
}

/// Cpk classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityLevel {
    Critical,
    Warning,
    Capable,
    Excellent,
}

impl fmt::Display for CapabilityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityLevel::Critical => write!(f, "critical"),
            CapabilityLevel::Warning => write!(f, "warning"),
            CapabilityLevel::Capable => write!(f, "capable"),
            CapabilityLevel::Excellent => write!(f, "excellent"),
        }
    }
}

/// η² effect size
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectSize {
    Small,
    Medium,
    Large,
}

impl fmt::Display for EffectSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectSize::Small => write!(f, "small"),
            EffectSize::Medium => write!(f, "medium"),
            EffectSize::Large => write!(f, "large"),
        }
    }
}

/// Measurement system verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrrVerdict {
    Excellent,
    Marginal,
    Unacceptable,
}

impl fmt::Display for GrrVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrrVerdict::Excellent => write!(f, "excellent"),
            GrrVerdict::Marginal => write!(f, "marginal"),
            GrrVerdict::Unacceptable => write!(f, "unacceptable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grr_bands_boundaries() {
        let t = GrrThresholds::default();
        assert_eq!(t.classify(9.9), GrrVerdict::Excellent);
        assert_eq!(t.classify(10.0), GrrVerdict::Marginal);
        assert_eq!(t.classify(10.1), GrrVerdict::Marginal);
        assert_eq!(t.classify(30.0), GrrVerdict::Marginal);
        assert_eq!(t.classify(30.1), GrrVerdict::Unacceptable);
    }

    #[test]
    fn test_eta_bands_boundaries() {
        let t = EtaThresholds::default();
        assert_eq!(t.classify(0.0), EffectSize::Small);
        assert_eq!(t.classify(0.059), EffectSize::Small);
        assert_eq!(t.classify(0.06), EffectSize::Medium);
        assert_eq!(t.classify(0.139), EffectSize::Medium);
        assert_eq!(t.classify(0.14), EffectSize::Large);
    }

    #[test]
    fn test_cpk_bands_boundaries() {
        let t = CpkThresholds::default();
        assert_eq!(t.classify(0.5), CapabilityLevel::Critical);
        assert_eq!(t.classify(1.0), CapabilityLevel::Warning);
        assert_eq!(t.classify(1.329), CapabilityLevel::Warning);
        assert_eq!(t.classify(1.33), CapabilityLevel::Capable);
        assert_eq!(t.classify(1.67), CapabilityLevel::Excellent);
    }

    #[test]
    fn test_custom_cpk_thresholds() {
        let t = CpkThresholds {
            critical: 1.33,
            warning: 1.67,
            capable: 2.0,
        };
        assert!(t.is_valid());
        assert_eq!(t.classify(1.5), CapabilityLevel::Warning);
    }

    #[test]
    fn test_threshold_validation() {
        let bad = CpkThresholds {
            critical: 1.5,
            warning: 1.33,
            capable: 1.67,
        };
        assert!(!bad.is_valid());
        assert!(CpkThresholds::default().is_valid());
        assert!(!EtaThresholds {
            medium: 0.2,
            large: 0.1
        }
        .is_valid());
        assert!(!GrrThresholds {
            excellent: 30.0,
            marginal: 30.0
        }
        .is_valid());
    }
}
