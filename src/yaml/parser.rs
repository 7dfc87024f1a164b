//! YAML parsing with diagnostics

use serde::de::DeserializeOwned;
use std::path::Path;

use crate::yaml::diagnostics::{YamlError, YamlSyntaxError};

/// Parse YAML content into a typed value
///
/// A document that is empty or only comments yields `T::default()`.
pub fn parse_yaml<T: DeserializeOwned + Default + 'static>(content: &str, filename: &str) -> Result<T, YamlError> {
    let is_blank = content
        .lines()
        .map(str::trim)
        .all(|l| l.is_empty() || l.starts_with('#'));
    if is_blank {
        return Ok(T::default());
    }
    serde_yml::from_str(content)
        .map_err(|e| YamlError::Syntax(YamlSyntaxError::from_serde_error(&e, content, filename)))
}

/// Parse YAML from a file path
pub fn parse_yaml_file<T: DeserializeOwned + Default + 'static>(path: &Path) -> Result<T, YamlError> {
    let content = std::fs::read_to_string(path)?;
    parse_yaml(&content, &path.display().to_string())
}
