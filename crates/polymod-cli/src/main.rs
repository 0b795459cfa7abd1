//! Polymod CLI - inspect identifiers, check routing files, and drive a matrix offline.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "polymod")]
#[command(author, version, about = "Polyphonic modulation matrix CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List modulation sources
    Sources(commands::ids::SourcesArgs),

    /// List modulation destinations
    Destinations(commands::ids::DestinationsArgs),

    /// Validate a routing file
    Check(commands::check::CheckArgs),

    /// Apply a routing file to fixed source values and print the result
    Run(commands::run::RunArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sources(args) => commands::ids::run_sources(&args),
        Commands::Destinations(args) => commands::ids::run_destinations(&args),
        Commands::Check(args) => commands::check::run(&args),
        Commands::Run(args) => commands::run::run(&args),
    }
}
