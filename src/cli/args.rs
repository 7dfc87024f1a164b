//! Command-line argument definitions

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    anova::AnovaArgs, categories::CategoriesArgs, columns::ColumnsArgs,
    completions::CompletionsArgs, drill::DrillArgs, gage::GageArgs, glm::GlmArgs,
    project::ProjectArgs, rank::RankArgs, regress::RegressArgs, stats::StatsArgs,
};

/// VariScout - find where process variation comes from
#[derive(Parser, Debug)]
#[command(name = "variscout", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command
#[derive(clap::Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Config file (defaults to ./variscout.yaml, then the user config dir)
    #[arg(long, global = true, env = "VARISCOUT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Output formats
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable on a terminal
    #[default]
    Auto,
    /// Aligned text tables
    Table,
    /// JSON document
    Json,
    /// YAML document
    Yaml,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List columns with their detected kind
    Columns(ColumnsArgs),

    /// Capability statistics for an outcome (mean, σ, limits, Cp/Cpk)
    Stats(StatsArgs),

    /// Rank factors by the variation they explain (η²)
    Rank(RankArgs),

    /// Per-category breakdown of one factor
    Categories(CategoriesArgs),

    /// One-way ANOVA across the levels of a factor
    Anova(AnovaArgs),

    /// Simple linear/quadratic regression on one numeric predictor
    Regress(RegressArgs),

    /// Multiple regression with categorical predictors and interactions
    Glm(GlmArgs),

    /// Crossed Gage R&R study
    Gage(GageArgs),

    /// Attribute variation along an ordered sequence of filters
    Drill(DrillArgs),

    /// Compare current statistics with statistics after filtering
    Project(ProjectArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}
