//! ACE CLI — the main entry point.
//!
//! Commands:
//! - `onboard` — Write a default config file
//! - `status`  — Show the effective configuration
//! - `replay`  — Run recorded execution traces through the engine

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "ace",
    about = "ACE — self-evolving knowledge context for decision loops",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to read (or, for `onboard`, to write) instead of ~/.ace/config.toml
    #[arg(short, long, global = true, env = "ACE_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Onboard,

    /// Show the effective configuration
    Status,

    /// Replay execution traces through generate → reflect → curate → refine
    Replay {
        /// JSON file holding an array of execution traces
        #[arg(short, long)]
        traces: PathBuf,

        /// JSON file of knowledge records to start from
        #[arg(short, long, conflicts_with = "baseline")]
        seed: Option<PathBuf>,

        /// Start from the built-in baseline items
        #[arg(long)]
        baseline: bool,

        /// Write the final knowledge records to this file
        #[arg(short, long)]
        export: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run(cli.config).await?,
        Commands::Status => commands::status::run(cli.config).await?,
        Commands::Replay {
            traces,
            seed,
            baseline,
            export,
        } => {
            commands::replay::run(commands::replay::ReplayArgs {
                config: cli.config,
                traces,
                seed,
                baseline,
                export,
            })
            .await?
        }
    }

    Ok(())
}
