//! Command-line interface for kinesis-loadtest
//!
//! # Usage Examples
//!
//! ## Produce
//! ```bash
//! export AWS_ACCESS_KEY=... AWS_SECRET_KEY=... AWS_REGION_NAME=us-east-1
//!
//! # Run two producers until Ctrl-C
//! kinesis-loadtest produce --stream-name events --producers 2
//!
//! # Create the stream first and stop after five minutes
//! kinesis-loadtest produce --stream-name events --create-stream \
//!   --shard-count 2 --run-for 5m
//!
//! # Against a local emulator
//! kinesis-loadtest produce --stream-name events \
//!   --endpoint-url http://localhost:4566 --event-count 10
//! ```
//!
//! ## Consume
//! ```bash
//! kinesis-loadtest consume '{"Records":[...]}'
//! cat envelope.json | kinesis-loadtest consume -
//! ```

use anyhow::Context;
use clap::Parser;
use kinesis_loadtest::config::parse_duration;
use kinesis_loadtest::{run_consume, run_produce, Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Produce { args, run_for } => {
            let run_for = run_for
                .as_deref()
                .map(parse_duration)
                .transpose()
                .context("Invalid --run-for")?;
            run_produce(&args, run_for).await?;
        }
        Commands::Consume { args } => {
            run_consume(&args)?;
        }
    }

    Ok(())
}
