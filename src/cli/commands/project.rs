//! `variscout project` - compare current statistics with statistics after filtering

use console::style;
use miette::Result;
use serde::Serialize;
use std::path::PathBuf;
use tabled::Tabled;

use crate::analysis::descriptive::StatsResult;
use crate::analysis::projection::{calculate_projected_stats, ProjectedStats};
use crate::cli::commands::utils::{insufficient, load_context, print_heading, require_columns, styled_cpk};
use crate::cli::filters::{to_filter_stack, FilterArg, SpecArgs};
use crate::cli::helpers::{format_opt, format_pct, smart_round};
use crate::cli::output::{print_document, render_table};
use crate::cli::GlobalOpts;

#[derive(clap::Args, Debug)]
pub struct ProjectArgs {
    /// CSV data file
    pub file: PathBuf,

    /// Outcome (numeric) column
    pub outcome: String,

    /// Keep only rows matching FACTOR=VALUE[,VALUE...] (repeatable)
    #[arg(long = "filter", short = 'F', required = true)]
    pub filters: Vec<FilterArg>,

    #[command(flatten)]
    pub spec: SpecArgs,
}

#[derive(Debug, Serialize)]
struct ProjectReport {
    outcome: String,
    #[serde(flatten)]
    projection: ProjectedStats,
}

#[derive(Tabled)]
struct CompareLine {
    #[tabled(rename = "")]
    metric: &'static str,
    #[tabled(rename = "CURRENT")]
    current: String,
    #[tabled(rename = "PROJECTED")]
    projected: String,
}

fn compare_lines(current: &StatsResult, projected: &StatsResult) -> Vec<CompareLine> {
    let reference = current.std_dev;
    let line = |metric: &'static str, before: String, after: String| CompareLine {
        metric,
        current: before,
        projected: after,
    };
    vec![
        line("n", current.n.to_string(), projected.n.to_string()),
        line(
            "mean",
            smart_round(current.mean, reference),
            smart_round(projected.mean, reference),
        ),
        line(
            "std dev",
            smart_round(current.std_dev, reference),
            smart_round(projected.std_dev, reference),
        ),
        line("cp", format_opt(current.cp, 2), format_opt(projected.cp, 2)),
        line("cpk", format_opt(current.cpk, 2), format_opt(projected.cpk, 2)),
        line(
            "out of spec",
            format_pct(current.out_of_spec_percentage),
            format_pct(projected.out_of_spec_percentage),
        ),
    ]
}

pub fn run(args: ProjectArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = load_context(&args.file, global)?;
    let mut columns = vec![args.outcome.as_str()];
    columns.extend(args.filters.iter().map(|f| f.factor.as_str()));
    require_columns(&ctx.dataset, &columns)?;

    let specs = ctx.config.specs_for(&args.outcome, &args.spec.to_limits());
    let stack = to_filter_stack(&args.filters);
    let projection = calculate_projected_stats(&ctx.dataset.rows, &args.outcome, &stack, Some(&specs))
        .ok_or_else(|| insufficient("projection", "no numeric outcome values left after filtering"))?;

    let report = ProjectReport {
        outcome: args.outcome.clone(),
        projection,
    };
    if print_document(&report, global.format)? {
        return Ok(());
    }

    let p = &report.projection;
    print_heading("Projection", &report.outcome);
    println!("{}", render_table(&compare_lines(&p.current, &p.projected)));
    println!(
        "{}: {}",
        style("Mean shift").bold(),
        smart_round(p.mean_shift, p.current.std_dev)
    );
    println!(
        "{}: {}",
        style("σ reduction").bold(),
        format_pct(p.std_dev_reduction_pct)
    );
    if let Some(delta) = p.cpk_delta {
        println!(
            "{}: {:+.2} (now {})",
            style("Cpk change").bold(),
            delta,
            styled_cpk(p.projected.cpk, &ctx.config.thresholds.cpk)
        );
    }
    Ok(())
}
