use clap::Parser;
use miette::Result;
use tracing_subscriber::EnvFilter;
use variscout::cli::commands::{
    anova, categories, columns, completions, drill, gage, glm, project, rank, regress, stats,
};
use variscout::cli::{Cli, Commands};

/// Log to stderr so stdout stays clean for JSON/YAML output
///
/// `RUST_LOG` wins when set; otherwise `-v` raises the level.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    // Install miette's fancy error handler for beautiful diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    init_tracing(cli.global.verbose);
    let global = &cli.global;

    match cli.command {
        Commands::Columns(args) => columns::run(args, global),
        Commands::Stats(args) => stats::run(args, global),
        Commands::Rank(args) => rank::run(args, global),
        Commands::Categories(args) => categories::run(args, global),
        Commands::Anova(args) => anova::run(args, global),
        Commands::Regress(args) => regress::run(args, global),
        Commands::Glm(args) => glm::run(args, global),
        Commands::Gage(args) => gage::run(args, global),
        Commands::Drill(args) => drill::run(args, global),
        Commands::Project(args) => project::run(args, global),
        Commands::Completions(args) => completions::run(args),
    }
}
