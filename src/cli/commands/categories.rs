//! `variscout categories` - per-category breakdown of one factor

use miette::Result;
use std::path::PathBuf;
use tabled::Tabled;

use crate::analysis::variation::{category_stats, eta_squared};
use crate::cli::commands::utils::{filtered_rows, insufficient, load_context, print_heading, require_columns};
use crate::cli::filters::FilterArg;
use crate::cli::helpers::{format_pct, pct_bar, smart_round, truncate_str};
use crate::cli::output::{print_document, render_table};
use crate::cli::GlobalOpts;

#[derive(clap::Args, Debug)]
pub struct CategoriesArgs {
    /// CSV data file
    pub file: PathBuf,

    /// Factor (categorical) column
    pub factor: String,

    /// Outcome (numeric) column
    pub outcome: String,

    /// Restrict to rows matching FACTOR=VALUE[,VALUE...] (repeatable)
    #[arg(long = "filter", short = 'F')]
    pub filters: Vec<FilterArg>,
}

#[derive(Tabled)]
struct CategoryLine {
    #[tabled(rename = "VALUE")]
    value: String,
    #[tabled(rename = "N")]
    n: usize,
    #[tabled(rename = "MEAN")]
    mean: String,
    #[tabled(rename = "STD DEV")]
    std_dev: String,
    #[tabled(rename = "CONTRIB")]
    contribution: String,
    #[tabled(rename = "")]
    bar: String,
}

pub fn run(args: CategoriesArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = load_context(&args.file, global)?;
    let mut columns = vec![args.factor.as_str(), args.outcome.as_str()];
    columns.extend(args.filters.iter().map(|f| f.factor.as_str()));
    require_columns(&ctx.dataset, &columns)?;

    let rows = filtered_rows(&ctx.dataset, &args.filters);
    let stats = category_stats(&rows, &args.factor, &args.outcome);
    if stats.is_empty() {
        return Err(insufficient(
            "category breakdown",
            &format!("no rows with both '{}' and a numeric '{}'", args.factor, args.outcome),
        ));
    }

    if print_document(&stats, global.format)? {
        return Ok(());
    }

    let spread = stats.iter().map(|c| c.std_dev).fold(0.0, f64::max);
    let lines: Vec<CategoryLine> = stats
        .iter()
        .map(|c| CategoryLine {
            value: truncate_str(&c.value, 30),
            n: c.n,
            mean: smart_round(c.mean, spread),
            std_dev: smart_round(c.std_dev, spread),
            contribution: format_pct(c.contribution_pct),
            bar: pct_bar(c.contribution_pct),
        })
        .collect();

    print_heading("Factor", &format!("{} → {}", args.factor, args.outcome));
    println!("{}", render_table(&lines));
    println!(
        "η² = {:.3}",
        eta_squared(&rows, &args.factor, &args.outcome)
    );
    Ok(())
}
