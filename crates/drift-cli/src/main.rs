//! Drift command-line interface.
//!
//! Runs, validates and inspects particle-tracking experiments described
//! by a JSON run file.

mod commands;
mod run_file;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Lagrangian particle tracking on gridded ocean-model forcing
#[derive(Parser)]
#[command(name = "drift")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Lagrangian particle tracking on ocean-model forcing", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation
    Run(commands::run::RunArgs),
    /// Check a run file and every input it names
    Validate(commands::validate::ValidateArgs),
    /// Describe forcing files
    Info(commands::info::InfoArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => anyhow::bail!("unknown log level '{other}'"),
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run(args) => commands::run::execute(args),
        Commands::Validate(args) => commands::validate::execute(args),
        Commands::Info(args) => commands::info::execute(args),
    }
}
