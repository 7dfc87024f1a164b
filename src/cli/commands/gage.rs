//! `variscout gage` - crossed Gage R&R study

use console::style;
use miette::Result;
use std::path::PathBuf;
use tabled::Tabled;

use crate::analysis::gage_rr::calculate_gage_rr;
use crate::analysis::thresholds::GrrVerdict;
use crate::cli::commands::utils::{insufficient, load_context, print_heading, require_columns};
use crate::cli::helpers::{format_opt, format_pct, format_p_value, pct_bar};
use crate::cli::output::{print_document, render_table};
use crate::cli::GlobalOpts;

#[derive(clap::Args, Debug)]
pub struct GageArgs {
    /// CSV data file
    pub file: PathBuf,

    /// Part column
    #[arg(long, default_value = "Part")]
    pub part: String,

    /// Operator column
    #[arg(long, default_value = "Operator")]
    pub operator: String,

    /// Measurement column
    #[arg(long, default_value = "Measurement")]
    pub measurement: String,
}

#[derive(Tabled)]
struct AnovaLine {
    #[tabled(rename = "SOURCE")]
    source: String,
    #[tabled(rename = "DF")]
    df: usize,
    #[tabled(rename = "SS")]
    ss: String,
    #[tabled(rename = "MS")]
    ms: String,
    #[tabled(rename = "F")]
    f: String,
    #[tabled(rename = "P")]
    p: String,
}

#[derive(Tabled)]
struct ComponentLine {
    #[tabled(rename = "COMPONENT")]
    name: &'static str,
    #[tabled(rename = "VARIANCE")]
    variance: String,
    #[tabled(rename = "% STUDY VAR")]
    pct: String,
    #[tabled(rename = "")]
    bar: String,
}

pub fn run(args: GageArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = load_context(&args.file, global)?;
    require_columns(
        &ctx.dataset,
        &[args.part.as_str(), args.operator.as_str(), args.measurement.as_str()],
    )?;

    let result = calculate_gage_rr(
        &ctx.dataset.rows,
        &args.part,
        &args.operator,
        &args.measurement,
        &ctx.config.thresholds.grr,
    )
    .ok_or_else(|| {
        insufficient(
            "Gage R&R",
            "need ≥2 parts, ≥2 operators and a balanced design with ≥2 replicates per cell",
        )
    })?;

    if print_document(&result, global.format)? {
        return Ok(());
    }

    let anova: Vec<AnovaLine> = result
        .anova
        .iter()
        .map(|r| AnovaLine {
            source: r.source.clone(),
            df: r.df,
            ss: format!("{:.5}", r.ss),
            ms: format!("{:.5}", r.ms),
            f: format_opt(r.f, 3),
            p: r.p.map(format_p_value).unwrap_or_default(),
        })
        .collect();

    let v = &result.variance;
    let component = |name, variance: f64, pct: f64| ComponentLine {
        name,
        variance: format!("{:.6}", variance),
        pct: format_pct(pct),
        bar: pct_bar(pct),
    };
    let components = vec![
        component("Repeatability", v.repeatability, result.pct_repeatability),
        component("Reproducibility", v.reproducibility, result.pct_reproducibility),
        component("Gage R&R", v.grr, result.pct_grr),
        component("Part-to-part", v.part, result.pct_part),
    ];

    print_heading(
        "Gage R&R",
        &format!(
            "{} parts × {} operators × {} replicates",
            result.parts, result.operators, result.replicates
        ),
    );
    println!("{}", render_table(&anova));
    if !result.interaction_significant {
        println!(
            "{} part × operator interaction not significant; pooled into repeatability",
            style("·").dim()
        );
    }
    println!("{}", render_table(&components));
    println!("{}: {}", style("ndc").bold(), result.ndc);

    let verdict = match result.verdict {
        GrrVerdict::Excellent => style(result.verdict.to_string()).green().bold(),
        GrrVerdict::Marginal => style(result.verdict.to_string()).yellow(),
        GrrVerdict::Unacceptable => style(result.verdict.to_string()).red().bold(),
    };
    println!(
        "{}: {} ({} GRR)",
        style("Measurement system").bold(),
        verdict,
        format_pct(result.pct_grr)
    );
    Ok(())
}
