//! `produce` subcommand: run the producer pool until done or interrupted.

use anyhow::Context;
use loadtest_populate_kinesis::{KinesisPopulateArgs, KinesisPopulator, PoolReport};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Set up the populator, optionally create the stream, then produce.
///
/// Ctrl-C and `run_for` both cancel the pool; workers stop at their next
/// iteration boundary.
pub async fn run_produce(
    args: &KinesisPopulateArgs,
    run_for: Option<Duration>,
) -> anyhow::Result<PoolReport> {
    let populator = KinesisPopulator::from_args(args)
        .await
        .context("Failed to configure Kinesis producer")?;

    if args.create_stream {
        populator
            .create_stream(args.shard_count)
            .await
            .with_context(|| format!("Failed to create stream '{}'", args.stream_name))?;
    }

    let token = CancellationToken::new();
    let stopper = tokio::spawn(cancel_on_signal(token.clone(), run_for));

    let report = populator.populate(token.clone()).await;

    token.cancel();
    if let Err(e) = stopper.await {
        warn!("Shutdown listener ended abnormally: {e}");
    }
    if report.workers_panicked > 0 {
        error!("{} producer(s) terminated abnormally", report.workers_panicked);
    }
    Ok(report)
}

async fn cancel_on_signal(token: CancellationToken, run_for: Option<Duration>) {
    let deadline = async {
        match run_for {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    tokio::select! {
        _ = token.cancelled() => return,
        _ = &mut deadline => {
            info!("Run time of {:?} elapsed, stopping producers", run_for.unwrap_or_default());
        }
        signal = tokio::signal::ctrl_c() => match signal {
            Ok(()) => info!("Received Ctrl-C, stopping producers"),
            Err(e) => {
                warn!("Unable to listen for Ctrl-C: {e}");
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = &mut deadline => {}
                }
            }
        },
    }
    token.cancel();
}
