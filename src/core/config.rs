//! Configuration - classification thresholds, significance level and
//! per-outcome specification limits
//!
//! Lookup order: explicit path, `./variscout.yaml`, the platform config
//! directory (`config.yaml`), then built-in defaults.

use directories::ProjectDirs;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::analysis::descriptive::SpecLimits;
use crate::analysis::thresholds::Thresholds;
use crate::yaml::{parse_yaml_file, YamlError};

/// Name of the project-local config file
pub const LOCAL_CONFIG_FILE: &str = "variscout.yaml";

/// Errors from loading or validating configuration
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    #[diagnostic(code(variscout::config::not_found))]
    NotFound(PathBuf),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Yaml(#[from] YamlError),

    #[error("Cpk thresholds must be positive and increasing (critical < warning < capable), got {critical} / {warning} / {capable}")]
    #[diagnostic(code(variscout::config::cpk_thresholds))]
    InvalidCpkThresholds {
        critical: f64,
        warning: f64,
        capable: f64,
    },

    #[error("η² thresholds must satisfy 0 < medium < large <= 1, got {medium} / {large}")]
    #[diagnostic(code(variscout::config::eta_thresholds))]
    InvalidEtaThresholds { medium: f64, large: f64 },

    #[error("%GRR thresholds must satisfy 0 < excellent < marginal, got {excellent} / {marginal}")]
    #[diagnostic(code(variscout::config::grr_thresholds))]
    InvalidGrrThresholds { excellent: f64, marginal: f64 },

    #[error("significance level must be between 0 and 1, got {0}")]
    #[diagnostic(code(variscout::config::alpha))]
    InvalidSignificance(f64),
}

/// Analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// α used for every significance flag
    pub significance_level: f64,

    /// Classification band edges
    pub thresholds: Thresholds,

    /// Specification limits keyed by outcome column
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub specs: BTreeMap<String, SpecLimits>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            significance_level: 0.05,
            thresholds: Thresholds::default(),
            specs: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load and validate a config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let config: Config = parse_yaml_file(path)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Resolve the config for a run
    ///
    /// An explicit path must exist. Without one, the local file and then the
    /// user config directory are tried before falling back to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        for candidate in Self::search_paths() {
            if candidate.is_file() {
                return Self::from_file(&candidate);
            }
        }
        tracing::debug!("no config file found, using defaults");
        Ok(Self::default())
    }

    /// Candidate config locations in lookup order
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(dirs) = ProjectDirs::from("io", "variscout", "variscout") {
            paths.push(dirs.config_dir().join("config.yaml"));
        }
        paths
    }

    /// Check threshold ordering and α
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.thresholds;
        if !t.cpk.is_valid() {
            return Err(ConfigError::InvalidCpkThresholds {
                critical: t.cpk.critical,
                warning: t.cpk.warning,
                capable: t.cpk.capable,
            });
        }
        if !t.eta.is_valid() {
            return Err(ConfigError::InvalidEtaThresholds {
                medium: t.eta.medium,
                large: t.eta.large,
            });
        }
        if !t.grr.is_valid() {
            return Err(ConfigError::InvalidGrrThresholds {
                excellent: t.grr.excellent,
                marginal: t.grr.marginal,
            });
        }
        if !(self.significance_level > 0.0 && self.significance_level < 1.0) {
            return Err(ConfigError::InvalidSignificance(self.significance_level));
        }
        Ok(())
    }

    /// Spec limits for an outcome, with command-line overrides applied
    pub fn specs_for(&self, outcome: &str, overrides: &SpecLimits) -> SpecLimits {
        self.specs
            .get(outcome)
            .cloned()
            .unwrap_or_default()
            .merged_with(overrides)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.significance_level, 0.05);
        assert_eq!(config.thresholds.cpk.warning, 1.33);
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("variscout.yaml");
        fs::write(
            &path,
            "thresholds:\n  cpk:\n    critical: 1.2\nspecs:\n  Weight:\n    usl: 12.5\n    lsl: 9.5\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.thresholds.cpk.critical, 1.2);
        assert_eq!(config.thresholds.cpk.warning, 1.33);
        assert_eq!(config.thresholds.grr.marginal, 30.0);
        assert_eq!(config.specs["Weight"].usl, Some(12.5));
    }

    #[test]
    fn test_invalid_cpk_ordering_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.yaml");
        fs::write(&path, "thresholds:\n  cpk:\n    critical: 2.0\n").unwrap();
        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCpkThresholds { .. }));
    }

    #[test]
    fn test_invalid_alpha_rejected() {
        let config = Config {
            significance_level: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSignificance(_))
        ));
    }

    #[test]
    fn test_explicit_missing_path_is_error() {
        let err = Config::load(Some(Path::new("/no/such/variscout.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_specs_for_merges_overrides() {
        let mut config = Config::default();
        config.specs.insert(
            "Weight".into(),
            SpecLimits {
                usl: Some(12.5),
                lsl: Some(9.5),
                target: Some(11.0),
                grades: vec![],
            },
        );
        let specs = config.specs_for("Weight", &SpecLimits::new(None, Some(10.0)));
        assert_eq!(specs.usl, Some(12.5));
        assert_eq!(specs.lsl, Some(10.0));
        assert_eq!(specs.target, Some(11.0));

        let none = config.specs_for("Other", &SpecLimits::default());
        assert!(!none.has_limits());
    }
}
