//! `variscout rank` - rank factors by the variation they explain

use console::style;
use miette::Result;
use std::path::PathBuf;
use tabled::Tabled;

use crate::analysis::thresholds::EffectSize;
use crate::analysis::variation::find_optimal_factors;
use crate::cli::commands::utils::{filtered_rows, load_context, require_columns};
use crate::cli::filters::FilterArg;
use crate::cli::helpers::{format_pct, pct_bar, truncate_str};
use crate::cli::output::{print_document, render_table};
use crate::cli::GlobalOpts;

#[derive(clap::Args, Debug)]
pub struct RankArgs {
    /// CSV data file
    pub file: PathBuf,

    /// Outcome (numeric) column
    pub outcome: String,

    /// Factors to rank (default: every categorical column)
    #[arg(long, value_delimiter = ',')]
    pub factors: Vec<String>,

    /// Rank within rows matching FACTOR=VALUE[,VALUE...] (repeatable)
    #[arg(long = "filter", short = 'F')]
    pub filters: Vec<FilterArg>,

    /// Show only the top N factors
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
}

#[derive(Tabled)]
struct RankLine {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "FACTOR")]
    factor: String,
    #[tabled(rename = "ETA²")]
    eta: String,
    #[tabled(rename = "EFFECT")]
    effect: String,
    #[tabled(rename = "GROUPS")]
    groups: usize,
    #[tabled(rename = "")]
    bar: String,
}

pub fn run(args: RankArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = load_context(&args.file, global)?;
    let mut columns = vec![args.outcome.as_str()];
    columns.extend(args.factors.iter().map(String::as_str));
    columns.extend(args.filters.iter().map(|f| f.factor.as_str()));
    require_columns(&ctx.dataset, &columns)?;

    let factors = if args.factors.is_empty() {
        ctx.dataset.categorical_columns()
    } else {
        args.factors.clone()
    };
    let rows = filtered_rows(&ctx.dataset, &args.filters);

    let mut ranking = find_optimal_factors(&rows, &factors, &args.outcome, &ctx.config.thresholds.eta);
    if let Some(limit) = args.limit {
        ranking.truncate(limit);
    }

    if print_document(&ranking, global.format)? {
        return Ok(());
    }
    if ranking.is_empty() {
        println!("No categorical factors to rank.");
        return Ok(());
    }

    let lines: Vec<RankLine> = ranking
        .iter()
        .enumerate()
        .map(|(i, r)| RankLine {
            rank: i + 1,
            factor: truncate_str(&r.factor, 30),
            eta: format!("{:.3}", r.eta_squared),
            effect: r.effect_size.to_string(),
            groups: r.group_count,
            bar: pct_bar(r.eta_squared * 100.0),
        })
        .collect();
    println!("{}", render_table(&lines));

    if let Some(top) = ranking.first().filter(|r| r.effect_size != EffectSize::Small) {
        println!(
            "{} {} explains {} of the variation in {}",
            style("→").blue(),
            style(&top.factor).cyan(),
            format_pct(top.eta_squared * 100.0),
            style(&args.outcome).cyan()
        );
    }
    Ok(())
}
