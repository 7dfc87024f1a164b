//! Filter and spec-limit arguments shared by CLI commands
//!
//! Filters are written `Factor=value1,value2`. Values that look like
//! numbers are matched by category key, so `Line=1` matches both `1` and
//! `1.0` in the data.

use std::str::FromStr;

use crate::analysis::descriptive::SpecLimits;
use crate::core::data::CellValue;
use crate::core::filter::FilterAction;

/// A `Factor=v1,v2` selection from the command line
#[derive(Debug, Clone, PartialEq)]
pub struct FilterArg {
    pub factor: String,
    pub values: Vec<CellValue>,
}

impl FromStr for FilterArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (factor, values) = s
            .split_once('=')
            .ok_or_else(|| format!("expected FACTOR=VALUE[,VALUE...], got '{}'", s))?;
        let factor = factor.trim();
        if factor.is_empty() {
            return Err(format!("missing factor name in '{}'", s));
        }
        let values: Vec<CellValue> = values.split(',').filter_map(CellValue::parse).collect();
        if values.is_empty() {
            return Err(format!("no values given for factor '{}'", factor));
        }
        Ok(FilterArg {
            factor: factor.to_string(),
            values,
        })
    }
}

impl FilterArg {
    /// Convert to a filter-stack action tagged with the CLI as source
    pub fn to_action(&self) -> FilterAction {
        FilterAction::filter(&self.factor, self.values.iter().cloned()).with_source("cli")
    }
}

/// Build a filter stack from ordered command-line filters
pub fn to_filter_stack(filters: &[FilterArg]) -> Vec<FilterAction> {
    filters.iter().map(FilterArg::to_action).collect()
}

/// Parse a significance level, rejecting values outside (0, 1)
pub fn parse_alpha(s: &str) -> Result<f64, String> {
    let alpha: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", s))?;
    if alpha > 0.0 && alpha < 1.0 {
        Ok(alpha)
    } else {
        Err(format!("significance level must be between 0 and 1, got {}", s))
    }
}

/// Specification limit overrides
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SpecArgs {
    /// Upper specification limit
    #[arg(long)]
    pub usl: Option<f64>,

    /// Lower specification limit
    #[arg(long)]
    pub lsl: Option<f64>,

    /// Target value
    #[arg(long)]
    pub target: Option<f64>,
}

impl SpecArgs {
    pub fn to_limits(&self) -> SpecLimits {
        SpecLimits {
            usl: self.usl,
            lsl: self.lsl,
            target: self.target,
            grades: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter_arg() {
        let f: FilterArg = "Machine=A,B".parse().unwrap();
        assert_eq!(f.factor, "Machine");
        assert_eq!(f.values, vec![CellValue::from("A"), CellValue::from("B")]);
    }

    #[test]
    fn test_parse_numeric_values() {
        let f: FilterArg = "Line = 1, 2".parse().unwrap();
        assert_eq!(f.factor, "Line");
        assert_eq!(f.values, vec![CellValue::Number(1.0), CellValue::Number(2.0)]);
    }

    #[test]
    fn test_parse_errors() {
        assert!("Machine".parse::<FilterArg>().is_err());
        assert!("=A".parse::<FilterArg>().is_err());
        assert!("Machine=".parse::<FilterArg>().is_err());
        assert!("Machine=,".parse::<FilterArg>().is_err());
    }

    #[test]
    fn test_to_filter_stack_keeps_order() {
        let filters: Vec<FilterArg> = vec!["Machine=A".parse().unwrap(), "Shift=Morning".parse().unwrap()];
        let stack = to_filter_stack(&filters);
        let factors: Vec<_> = stack
            .iter()
            .filter_map(|a| a.as_factor_filter().map(|(f, _)| f.to_string()))
            .collect();
        assert_eq!(factors, vec!["Machine", "Shift"]);
    }

    #[test]
    fn test_parse_alpha_range() {
        assert_eq!(parse_alpha("0.01"), Ok(0.01));
        assert_eq!(parse_alpha(" 0.1 "), Ok(0.1));
        assert!(parse_alpha("0").is_err());
        assert!(parse_alpha("1").is_err());
        assert!(parse_alpha("2").is_err());
        assert!(parse_alpha("-0.05").is_err());
        assert!(parse_alpha("NaN").is_err());
        assert!(parse_alpha("five").unwrap_err().contains("not a number"));
    }

    #[test]
    fn test_spec_args_to_limits() {
        let args = SpecArgs {
            usl: Some(12.0),
            lsl: None,
            target: Some(10.0),
        };
        let limits = args.to_limits();
        assert_eq!(limits.usl, Some(12.0));
        assert!(limits.lsl.is_none());
        assert!(limits.has_limits());
    }
}
