mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::metrics::MetricsArgs;
use commands::project::ProjectArgs;

/// Construction-project economic evaluation
#[derive(Parser)]
#[command(
    name = "peval",
    version,
    about = "Construction-project economic evaluation",
    long_about = "Runs the full economic evaluation of a construction project with decimal \
                  precision: investment and asset formation, depreciation, cost, profit and \
                  tax, cash flows, balance sheet and financial indicators."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log engine stages to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every calculation and print the result tables
    Project(ProjectArgs),
    /// NPV, IRR and payback of a single cash-flow series
    Metrics(MetricsArgs),
    /// List the result table names in output order
    Tables,
    /// Print a default input document to start from
    Template,
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Project(args) => commands::project::run_project(args),
        Commands::Metrics(args) => commands::metrics::run_metrics(args),
        Commands::Tables => commands::project::run_tables(),
        Commands::Template => commands::project::run_template(),
        Commands::Version => {
            println!("peval {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
