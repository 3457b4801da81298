//! reportqa CLI - ingest documents and ask cited questions about them

mod cli;
mod commands;
mod context;
mod error;
mod output;

use clap::Parser;
use cli::{Cli, Commands};
use context::CliContext;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_command_async(cli))
}

async fn run_command_async(cli: Cli) -> anyhow::Result<()> {
    let ctx = CliContext::from_cli(&cli)?;

    match cli.command {
        Commands::Ingest {
            files,
            chunk_size,
            overlap,
        } => {
            commands::ingest::run(&ctx, &files, chunk_size, overlap).await?;
        }

        Commands::Ask { question } => {
            commands::ask::run(&ctx, &question).await?;
        }

        Commands::Inspect { units } => {
            commands::inspect::run(&ctx, units)?;
        }
    }

    Ok(())
}
