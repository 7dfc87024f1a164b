//! `variscout stats` - capability statistics for an outcome

use console::style;
use miette::Result;
use serde::Serialize;
use std::path::PathBuf;

use crate::analysis::descriptive::{calculate_stats, SpecLimits, StatsResult};
use crate::analysis::thresholds::CapabilityLevel;
use crate::cli::commands::utils::{
    insufficient, load_context, print_heading, require_columns, styled_cpk,
};
use crate::cli::filters::{to_filter_stack, FilterArg, SpecArgs};
use crate::cli::helpers::{format_opt, format_pct, smart_round};
use crate::cli::output::print_document;
use crate::cli::GlobalOpts;
use crate::core::data::numeric_column;
use crate::core::filter::apply_filters;

#[derive(clap::Args, Debug)]
pub struct StatsArgs {
    /// CSV data file
    pub file: PathBuf,

    /// Outcome (numeric) column
    pub outcome: String,

    /// Restrict to rows matching FACTOR=VALUE[,VALUE...] (repeatable)
    #[arg(long = "filter", short = 'F')]
    pub filters: Vec<FilterArg>,

    #[command(flatten)]
    pub spec: SpecArgs,
}

#[derive(Debug, Serialize)]
struct StatsReport {
    outcome: String,
    specs: SpecLimits,
    #[serde(flatten)]
    stats: StatsResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    capability: Option<CapabilityLevel>,
}

pub fn run(args: StatsArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = load_context(&args.file, global)?;
    let mut columns = vec![args.outcome.as_str()];
    columns.extend(args.filters.iter().map(|f| f.factor.as_str()));
    require_columns(&ctx.dataset, &columns)?;

    let specs = ctx.config.specs_for(&args.outcome, &args.spec.to_limits());
    let stack = to_filter_stack(&args.filters);
    let rows = apply_filters(&ctx.dataset.rows, &stack);
    let values = numeric_column(rows, &args.outcome);

    let stats = calculate_stats(&values, Some(&specs))
        .ok_or_else(|| insufficient("statistics", &format!("no numeric values in '{}'", args.outcome)))?;

    let report = StatsReport {
        outcome: args.outcome.clone(),
        capability: stats.cpk.map(|c| ctx.config.thresholds.cpk.classify(c)),
        specs,
        stats,
    };
    if print_document(&report, global.format)? {
        return Ok(());
    }

    let s = &report.stats;
    let reference = if s.std_dev > 0.0 { s.std_dev } else { s.mean.abs() };
    print_heading("Outcome", &report.outcome);
    println!("{}: {}", style("n").bold(), s.n);
    println!("{}: {}", style("Mean").bold(), smart_round(s.mean, reference));
    println!("{}: {}", style("Std dev").bold(), smart_round(s.std_dev, reference));
    println!(
        "{}: {} .. {}",
        style("Range").bold(),
        smart_round(s.min, reference),
        smart_round(s.max, reference)
    );
    println!(
        "{}: LCL {} / UCL {}",
        style("Control limits").bold(),
        smart_round(s.lcl, reference),
        smart_round(s.ucl, reference)
    );

    if report.specs.has_limits() {
        println!();
        println!(
            "{}: LSL {} / USL {}",
            style("Spec limits").bold(),
            format_opt(report.specs.lsl, 4),
            format_opt(report.specs.usl, 4)
        );
        println!("{}: {}", style("Cp").bold(), format_opt(s.cp, 2));
        println!(
            "{}: {}",
            style("Cpk").bold(),
            styled_cpk(s.cpk, &ctx.config.thresholds.cpk)
        );
        println!(
            "{}: {}",
            style("Out of spec").bold(),
            format_pct(s.out_of_spec_percentage)
        );
    }

    if let Some(grades) = &s.grade_counts {
        println!();
        println!("{}", style("Grades:").bold());
        for g in grades {
            println!("  {:<12} ≤ {:<10} {}", g.label, smart_round(g.max, reference), g.count);
        }
    }
    Ok(())
}
