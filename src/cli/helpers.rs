//! Shared helper functions for CLI commands
//!
//! Number formatting lives here so every command rounds the same way.

/// Round a value to a precision that suits its magnitude
///
/// `reference` is a typical spread of the data (σ, range); values are shown
/// with enough decimals to resolve a hundredth of it.
pub fn smart_round(value: f64, reference: f64) -> String {
    if !value.is_finite() {
        return if value.is_nan() {
            "-".to_string()
        } else if value > 0.0 {
            "∞".to_string()
        } else {
            "-∞".to_string()
        };
    }
    let reference = reference.abs();
    let decimals = if reference > 0.0 && reference.is_finite() {
        (2.0 - reference.log10().floor()).clamp(0.0, 8.0) as usize
    } else {
        4
    };
    format!("{:.*}", decimals, value)
}

/// Format an optional value with a fixed number of decimals
pub fn format_opt(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.*}", decimals, v),
        Some(v) if v.is_infinite() => "∞".to_string(),
        _ => "-".to_string(),
    }
}

/// Format a p-value the way statistics tables usually show it
pub fn format_p_value(p: f64) -> String {
    if p < 0.001 {
        "<0.001".to_string()
    } else {
        format!("{:.3}", p)
    }
}

/// Format a percentage with one decimal
pub fn format_pct(value: f64) -> String {
    format!("{:.1}%", value)
}

/// Horizontal bar for a percentage (max 30 chars)
pub fn pct_bar(pct: f64) -> String {
    let len = ((pct.clamp(0.0, 100.0) / 100.0) * 30.0).round() as usize;
    "█".repeat(len)
}

/// Truncate a string to max_len chars, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smart_round() {
        assert_eq!(smart_round(12.345678, 2.0), "12.35");
        assert_eq!(smart_round(12.345678, 0.02), "12.3457");
        assert_eq!(smart_round(1234.4, 500.0), "1234");
        assert_eq!(smart_round(1.5, 0.0), "1.5000");
        assert_eq!(smart_round(f64::INFINITY, 1.0), "∞");
        assert_eq!(smart_round(f64::NAN, 1.0), "-");
    }

    #[test]
    fn test_format_opt() {
        assert_eq!(format_opt(Some(1.23456), 2), "1.23");
        assert_eq!(format_opt(None, 2), "-");
        assert_eq!(format_opt(Some(f64::INFINITY), 2), "∞");
    }

    #[test]
    fn test_format_p_value() {
        assert_eq!(format_p_value(0.0001), "<0.001");
        assert_eq!(format_p_value(0.0423), "0.042");
    }

    #[test]
    fn test_pct_bar() {
        assert_eq!(pct_bar(0.0), "");
        assert_eq!(pct_bar(100.0).chars().count(), 30);
        assert_eq!(pct_bar(150.0).chars().count(), 30);
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
    }
}
