//! `variscout drill` - attribute variation along an ordered sequence of filters

use console::style;
use miette::Result;
use serde::Serialize;
use std::path::PathBuf;
use tabled::Tabled;

use crate::analysis::drill::DrillPath;
use crate::analysis::variation::{find_optimal_factors, FactorRanking};
use crate::cli::commands::utils::{load_context, print_heading, require_columns};
use crate::cli::filters::{FilterArg, SpecArgs};
use crate::cli::helpers::{format_opt, format_pct, pct_bar, truncate_str};
use crate::cli::output::{print_document, render_table};
use crate::cli::GlobalOpts;
use crate::core::data::DataRow;
use crate::core::DrillSession;

#[derive(clap::Args, Debug)]
pub struct DrillArgs {
    /// CSV data file
    pub file: PathBuf,

    /// Outcome (numeric) column
    pub outcome: String,

    /// Drill step FACTOR=VALUE[,VALUE...], applied in the order given
    #[arg(long = "step", short = 's', required = true)]
    pub steps: Vec<FilterArg>,

    /// Also rank the remaining factors on the drilled-down rows
    #[arg(long)]
    pub suggest: bool,

    #[command(flatten)]
    pub spec: SpecArgs,
}

#[derive(Debug, Serialize)]
struct DrillReport {
    outcome: String,
    #[serde(flatten)]
    path: DrillPath,
    remaining_rows: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    next_factors: Vec<FactorRanking>,
}

#[derive(Tabled)]
struct StepLine {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "FILTER")]
    filter: String,
    #[tabled(rename = "ETA²")]
    eta: String,
    #[tabled(rename = "CUMULATIVE")]
    cumulative: String,
    #[tabled(rename = "N")]
    counts: String,
    #[tabled(rename = "MEAN")]
    mean: String,
    #[tabled(rename = "CPK")]
    cpk: String,
}

pub fn run(args: DrillArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = load_context(&args.file, global)?;
    let mut columns = vec![args.outcome.as_str()];
    columns.extend(args.steps.iter().map(|f| f.factor.as_str()));
    require_columns(&ctx.dataset, &columns)?;

    let specs = ctx.config.specs_for(&args.outcome, &args.spec.to_limits());
    let eta_thresholds = ctx.config.thresholds.eta;
    let categorical = ctx.dataset.categorical_columns();

    let mut session = DrillSession::new(ctx.dataset, &args.outcome, Some(specs));
    for step in &args.steps {
        session.push_filter(step.to_action());
    }
    let path = session.drill_path();
    let remaining: Vec<DataRow> = session.filtered_rows().into_iter().cloned().collect();

    let next_factors = if args.suggest {
        let drilled: Vec<&str> = args.steps.iter().map(|s| s.factor.as_str()).collect();
        let candidates: Vec<String> = categorical
            .into_iter()
            .filter(|c| !drilled.contains(&c.as_str()))
            .collect();
        find_optimal_factors(&remaining, &candidates, &args.outcome, &eta_thresholds)
    } else {
        Vec::new()
    };

    let report = DrillReport {
        outcome: args.outcome.clone(),
        path,
        remaining_rows: remaining.len(),
        next_factors,
    };
    if print_document(&report, global.format)? {
        return Ok(());
    }

    print_heading("Drill path", &report.outcome);
    if report.path.is_empty() {
        println!("No drill steps could be evaluated (need at least two rows).");
        return Ok(());
    }

    let lines: Vec<StepLine> = report
        .path
        .steps
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let values: Vec<String> = s.values.iter().map(|v| v.to_string()).collect();
            StepLine {
                index: i + 1,
                filter: truncate_str(&format!("{} = {}", s.factor, values.join(", ")), 36),
                eta: format!("{:.3}", s.eta_squared),
                cumulative: format_pct(s.cumulative_eta_squared * 100.0),
                counts: format!("{} → {}", s.count_before, s.count_after),
                mean: format!("{} → {}", format_opt(s.mean_before, 3), format_opt(s.mean_after, 3)),
                cpk: if s.cpk_before.is_some() || s.cpk_after.is_some() {
                    format!("{} → {}", format_opt(s.cpk_before, 2), format_opt(s.cpk_after, 2))
                } else {
                    "-".to_string()
                },
            }
        })
        .collect();
    println!("{}", render_table(&lines));

    if report.path.steps.len() < args.steps.len() {
        println!(
            "{} stopped after {} of {} steps: fewer than two rows remain",
            style("⚠").yellow(),
            report.path.steps.len(),
            args.steps.len()
        );
    }

    if let Some(pct) = report.path.cumulative_variation_pct {
        println!(
            "{} {} {}",
            style("Explained variation:").bold(),
            style(format_pct(pct)).cyan(),
            pct_bar(pct)
        );
    }

    if !report.next_factors.is_empty() {
        println!();
        println!("{}", style("Next factors:").bold());
        for r in report.next_factors.iter().take(5) {
            println!(
                "  {:<24} η² {:.3} ({})",
                truncate_str(&r.factor, 24),
                r.eta_squared,
                r.effect_size
            );
        }
    }
    Ok(())
}
