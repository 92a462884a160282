//! Kinesis populator for load testing.
//!
//! [`KinesisPopulator`] ties the pieces together: it optionally creates the
//! stream, then runs a [`ProducerWorkerPool`] where every worker gets its own
//! seeded [`EventGenerator`].

use crate::args::KinesisPopulateArgs;
use crate::error::Result;
use crate::generator::EventGenerator;
use crate::pool::{PoolConfig, PoolReport, ProducerWorkerPool};
use crate::service::{DryRunStreamService, KinesisStreamService, StreamService};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Publishes synthetic events to a stream.
///
/// # Example
///
/// ```ignore
/// let populator = KinesisPopulator::new(Arc::new(DryRunStreamService), config, 42)?;
/// populator.create_stream(1).await?;
/// let report = populator.populate(CancellationToken::new()).await;
/// ```
pub struct KinesisPopulator {
    pool: ProducerWorkerPool,
    service: Arc<dyn StreamService>,
    seed: u64,
}

impl KinesisPopulator {
    /// Validate `config` and prepare the pool.
    pub fn new(service: Arc<dyn StreamService>, config: PoolConfig, seed: u64) -> Result<Self> {
        let pool = ProducerWorkerPool::new(config, Arc::clone(&service))?;
        Ok(Self {
            pool,
            service,
            seed,
        })
    }

    /// Build a populator from CLI arguments, connecting to Kinesis unless
    /// `--dry-run` is set.
    pub async fn from_args(args: &KinesisPopulateArgs) -> Result<Self> {
        let service: Arc<dyn StreamService> = if args.dry_run {
            info!("Dry run: batches will be logged, not sent");
            Arc::new(DryRunStreamService)
        } else {
            let settings = args.aws.settings()?;
            Arc::new(KinesisStreamService::connect(&settings).await)
        };
        Self::new(service, args.pool_config(), args.seed)
    }

    pub fn config(&self) -> &PoolConfig {
        self.pool.config()
    }

    pub async fn create_stream(&self, shard_count: u32) -> Result<()> {
        self.service
            .create_stream(&self.config().stream_name, shard_count)
            .await?;
        Ok(())
    }

    /// Run the producers until they finish or `token` is cancelled.
    pub async fn populate(&self, token: CancellationToken) -> PoolReport {
        let config = self.config();
        info!(
            "Will produce data to stream {}, using {} producers, sleeping {:?} in between, {} records per batch",
            config.stream_name, config.workers, config.interval, config.batch_limit
        );
        match config.iterations {
            Some(n) => info!("Each producer will send {n} batches"),
            None => info!("Producers will run until interrupted"),
        }

        let seed = self.seed;
        let report = self
            .pool
            .run(
                move |worker_id| EventGenerator::new(seed.wrapping_add(u64::from(worker_id))),
                token,
            )
            .await;

        info!(
            "Published {} records in {} batches ({} failed batches, {} rejected records) in {:?} ({:.1} records/sec)",
            report.records_published,
            report.batches_succeeded,
            report.batches_failed,
            report.records_rejected,
            report.total_duration,
            report.records_per_second()
        );
        report
    }
}
