//! `variscout regress` - simple linear/quadratic regression

use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::analysis::regression::{calculate_regression, FitType};
use crate::cli::commands::utils::{filtered_rows, insufficient, load_context, print_heading, require_columns};
use crate::cli::filters::{parse_alpha, FilterArg};
use crate::cli::helpers::format_p_value;
use crate::cli::output::print_document;
use crate::cli::GlobalOpts;

#[derive(clap::Args, Debug)]
pub struct RegressArgs {
    /// CSV data file
    pub file: PathBuf,

    /// Predictor (numeric) column
    pub x: String,

    /// Outcome (numeric) column
    pub y: String,

    /// Restrict to rows matching FACTOR=VALUE[,VALUE...] (repeatable)
    #[arg(long = "filter", short = 'F')]
    pub filters: Vec<FilterArg>,

    /// Significance level in (0, 1), overrides the config value
    #[arg(long, value_parser = parse_alpha)]
    pub alpha: Option<f64>,
}

pub fn run(args: RegressArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = load_context(&args.file, global)?;
    let mut columns = vec![args.x.as_str(), args.y.as_str()];
    columns.extend(args.filters.iter().map(|f| f.factor.as_str()));
    require_columns(&ctx.dataset, &columns)?;

    let alpha = args.alpha.unwrap_or(ctx.config.significance_level);
    let rows = filtered_rows(&ctx.dataset, &args.filters);
    let result = calculate_regression(&rows, &args.x, &args.y, alpha).ok_or_else(|| {
        insufficient(
            "regression",
            &format!("need three numeric pairs and a varying '{}'", args.x),
        )
    })?;

    if print_document(&result, global.format)? {
        return Ok(());
    }

    let lin = &result.linear;
    print_heading("Regression", &format!("{} ~ {}", result.y_column, result.x_column));
    println!("{}: {}", style("n").bold(), result.n);
    println!();
    println!("{}", style("Linear:").bold());
    println!(
        "  {} = {:.4} + {:.4}·{}",
        result.y_column, lin.intercept, lin.slope, result.x_column
    );
    println!(
        "  r² = {:.3}, slope SE = {:.4}, t = {:.3}, p {}",
        lin.r_squared,
        lin.slope_std_error,
        lin.t_statistic,
        format_p_value(lin.p_value)
    );

    if let Some(q) = &result.quadratic {
        println!();
        println!("{}", style("Quadratic:").bold());
        println!(
            "  {} = {:.4} + {:.4}·{} + {:.4}·{}²",
            result.y_column, q.a, q.b, result.x_column, q.c, result.x_column
        );
        println!(
            "  r² = {:.3}, x² term p {}",
            q.r_squared,
            format_p_value(q.p_value_quadratic)
        );
        if let Some(x) = q.optimum_x {
            let kind = if q.c < 0.0 { "maximum" } else { "minimum" };
            println!("  {} at {} = {:.4}", kind, result.x_column, x);
        }
    }

    println!();
    let fit = match result.recommended_fit {
        FitType::Linear => style(result.recommended_fit.to_string()).cyan(),
        FitType::Quadratic => style(result.recommended_fit.to_string()).magenta(),
    };
    let significance = if result.is_significant {
        style("significant").green()
    } else {
        style("not significant").dim()
    };
    println!(
        "{} {} fit, {} relationship, {}",
        style("→").blue(),
        fit,
        result.strength,
        significance
    );
    Ok(())
}
