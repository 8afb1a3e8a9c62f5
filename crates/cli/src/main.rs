//! Steward CLI: the main entry point.
//!
//! Commands:
//! - `run`    : pursue a goal in a workspace until completion or a budget runs out
//! - `tools`  : print the tool definitions shown to the model
//! - `config` : print the effective configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod approval;
mod commands;
mod progress;

#[derive(Parser)]
#[command(
    name = "steward",
    about = "Steward: an autonomous coding agent",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.steward/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the agent against a goal
    Run(commands::run::RunArgs),

    /// List the available tools
    Tools,

    /// Show the effective configuration
    Config {
        /// Print the built-in defaults instead
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
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

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Run(args) => commands::run::run(config_path, args).await?,
        Commands::Tools => commands::tools::run()?,
        Commands::Config { default } => commands::config_cmd::show(config_path, default)?,
    }

    Ok(())
}
