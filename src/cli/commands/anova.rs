//! `variscout anova` - one-way ANOVA across the levels of a factor

use console::style;
use miette::Result;
use std::path::PathBuf;
use tabled::Tabled;

use crate::analysis::anova::calculate_anova;
use crate::cli::commands::utils::{filtered_rows, insufficient, load_context, print_heading, require_columns};
use crate::cli::filters::{parse_alpha, FilterArg};
use crate::cli::helpers::{format_p_value, smart_round, truncate_str};
use crate::cli::output::{print_document, render_table};
use crate::cli::GlobalOpts;

#[derive(clap::Args, Debug)]
pub struct AnovaArgs {
    /// CSV data file
    pub file: PathBuf,

    /// Factor (categorical) column
    pub factor: String,

    /// Outcome (numeric) column
    pub outcome: String,

    /// Restrict to rows matching FACTOR=VALUE[,VALUE...] (repeatable)
    #[arg(long = "filter", short = 'F')]
    pub filters: Vec<FilterArg>,

    /// Significance level in (0, 1), overrides the config value
    #[arg(long, value_parser = parse_alpha)]
    pub alpha: Option<f64>,
}

#[derive(Tabled)]
struct GroupLine {
    #[tabled(rename = "GROUP")]
    name: String,
    #[tabled(rename = "N")]
    n: usize,
    #[tabled(rename = "MEAN")]
    mean: String,
    #[tabled(rename = "STD DEV")]
    std_dev: String,
}

#[derive(Tabled)]
struct SourceLine {
    #[tabled(rename = "SOURCE")]
    source: &'static str,
    #[tabled(rename = "SS")]
    ss: String,
    #[tabled(rename = "DF")]
    df: usize,
    #[tabled(rename = "MS")]
    ms: String,
    #[tabled(rename = "F")]
    f: String,
    #[tabled(rename = "P")]
    p: String,
}

pub fn run(args: AnovaArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = load_context(&args.file, global)?;
    let mut columns = vec![args.factor.as_str(), args.outcome.as_str()];
    columns.extend(args.filters.iter().map(|f| f.factor.as_str()));
    require_columns(&ctx.dataset, &columns)?;

    let alpha = args.alpha.unwrap_or(ctx.config.significance_level);
    let rows = filtered_rows(&ctx.dataset, &args.filters);
    let result = calculate_anova(&rows, &args.factor, &args.outcome, alpha).ok_or_else(|| {
        insufficient(
            "ANOVA",
            &format!("'{}' needs at least two groups with replicated '{}' values", args.factor, args.outcome),
        )
    })?;

    if print_document(&result, global.format)? {
        return Ok(());
    }

    let spread = result.ms_within.sqrt();
    let groups: Vec<GroupLine> = result
        .groups
        .iter()
        .map(|g| GroupLine {
            name: truncate_str(&g.name, 30),
            n: g.n,
            mean: smart_round(g.mean, spread),
            std_dev: smart_round(g.std_dev, spread),
        })
        .collect();
    let sources = vec![
        SourceLine {
            source: "Between",
            ss: format!("{:.4}", result.ss_between),
            df: result.df_between,
            ms: format!("{:.4}", result.ms_between),
            f: format!("{:.3}", result.f_statistic),
            p: format_p_value(result.p_value),
        },
        SourceLine {
            source: "Within",
            ss: format!("{:.4}", result.ss_within),
            df: result.df_within,
            ms: format!("{:.4}", result.ms_within),
            f: String::new(),
            p: String::new(),
        },
    ];

    print_heading("ANOVA", &format!("{} by {}", args.outcome, result.factor));
    println!("{}", render_table(&groups));
    println!("{}", render_table(&sources));
    println!("η² = {:.3}", result.eta_squared);
    let marker = if result.is_significant {
        style("✓").green()
    } else {
        style("·").dim()
    };
    println!("{} {}", marker, result.insight);
    Ok(())
}
