//! `variscout glm` - multiple regression with categorical predictors and interactions

use console::style;
use miette::Result;
use std::path::PathBuf;
use tabled::Tabled;

use crate::analysis::multi_regression::{calculate_multi_regression, Collinearity, GlmOptions};
use crate::cli::commands::utils::{filtered_rows, insufficient, load_context, print_heading, require_columns};
use crate::cli::filters::{parse_alpha, FilterArg};
use crate::cli::helpers::{format_opt, format_p_value, truncate_str};
use crate::cli::output::{print_document, render_table};
use crate::cli::GlobalOpts;

#[derive(clap::Args, Debug)]
pub struct GlmArgs {
    /// CSV data file
    pub file: PathBuf,

    /// Outcome (numeric) column
    pub outcome: String,

    /// Predictor columns (repeatable or comma separated)
    #[arg(long = "predictor", short = 'p', value_delimiter = ',', required = true)]
    pub predictors: Vec<String>,

    /// Treat these predictors as categorical even if they look numeric
    #[arg(long = "categorical", value_delimiter = ',')]
    pub categorical: Vec<String>,

    /// Interaction term A:B (repeatable)
    #[arg(long = "interaction", short = 'i', value_parser = parse_interaction)]
    pub interactions: Vec<(String, String)>,

    /// Restrict to rows matching FACTOR=VALUE[,VALUE...] (repeatable)
    #[arg(long = "filter", short = 'F')]
    pub filters: Vec<FilterArg>,

    /// Significance level in (0, 1), overrides the config value
    #[arg(long, value_parser = parse_alpha)]
    pub alpha: Option<f64>,
}

fn parse_interaction(s: &str) -> Result<(String, String), String> {
    match s.split_once(':') {
        Some((a, b)) if !a.trim().is_empty() && !b.trim().is_empty() => {
            Ok((a.trim().to_string(), b.trim().to_string()))
        }
        _ => Err(format!("expected A:B, got '{}'", s)),
    }
}

#[derive(Tabled)]
struct TermLine {
    #[tabled(rename = "TERM")]
    name: String,
    #[tabled(rename = "ESTIMATE")]
    estimate: String,
    #[tabled(rename = "SE")]
    std_error: String,
    #[tabled(rename = "T")]
    t: String,
    #[tabled(rename = "P")]
    p: String,
    #[tabled(rename = "STD β")]
    standardized: String,
    #[tabled(rename = "VIF")]
    vif: String,
}

pub fn run(args: GlmArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = load_context(&args.file, global)?;
    let mut columns = vec![args.outcome.as_str()];
    columns.extend(args.predictors.iter().map(String::as_str));
    columns.extend(args.categorical.iter().map(String::as_str));
    columns.extend(args.interactions.iter().flat_map(|(a, b)| [a.as_str(), b.as_str()]));
    columns.extend(args.filters.iter().map(|f| f.factor.as_str()));
    require_columns(&ctx.dataset, &columns)?;

    for (a, b) in &args.interactions {
        if !args.predictors.contains(a) || !args.predictors.contains(b) {
            return Err(miette::miette!(
                help = "add both columns with --predictor",
                "interaction {}:{} uses a column that is not a predictor",
                a,
                b
            ));
        }
    }

    let options = GlmOptions {
        force_categorical: args.categorical.clone(),
        interactions: args.interactions.clone(),
        alpha: args.alpha.unwrap_or(ctx.config.significance_level),
    };
    let rows = filtered_rows(&ctx.dataset, &args.filters);
    let result = calculate_multi_regression(&rows, &args.outcome, &args.predictors, &options)
        .ok_or_else(|| insufficient("multiple regression", "too few complete rows or a singular design"))?;

    if print_document(&result, global.format)? {
        return Ok(());
    }

    let mut lines = vec![TermLine {
        name: "(intercept)".to_string(),
        estimate: format!("{:.4}", result.intercept),
        std_error: String::new(),
        t: String::new(),
        p: String::new(),
        standardized: String::new(),
        vif: String::new(),
    }];
    lines.extend(result.terms.iter().map(|t| TermLine {
        name: truncate_str(&t.name, 30),
        estimate: format!("{:.4}", t.estimate),
        std_error: format!("{:.4}", t.std_error),
        t: format!("{:.3}", t.t_statistic),
        p: if t.is_significant {
            format!("{} *", format_p_value(t.p_value))
        } else {
            format_p_value(t.p_value)
        },
        standardized: format_opt(t.standardized, 3),
        vif: match t.collinearity {
            Collinearity::None => format!("{:.2}", t.vif),
            Collinearity::Moderate => format!("{:.2} !", t.vif),
            Collinearity::Severe => format!("{:.2} !!", t.vif),
        },
    }));

    print_heading("GLM", &format!("{} ~ {}", result.outcome, args.predictors.join(" + ")));
    println!("{}", render_table(&lines));
    println!(
        "n = {}, R² = {:.3}, adj. R² = {:.3}, F({}, {}) = {:.3}, p {}, RMSE = {:.4}",
        result.n,
        result.r_squared,
        result.adj_r_squared,
        result.df_model,
        result.df_residual,
        result.f_statistic,
        format_p_value(result.p_value),
        result.rmse
    );
    for (predictor, level) in &result.reference_levels {
        println!("{} reference level for {}: {}", style("·").dim(), predictor, level);
    }
    for warning in &result.warnings {
        println!("{} {}", style("⚠").yellow(), warning);
    }
    Ok(())
}
