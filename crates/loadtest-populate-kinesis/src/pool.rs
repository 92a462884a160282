//! Concurrent producer workers.
//!
//! Each worker is an independent tokio task that loops
//! `sleep(interval) → assemble → put_records → record outcome` until it has
//! run its iterations, its generator is exhausted, or the cancellation token
//! fires. Workers share nothing but the `Arc<dyn StreamService>`; their
//! outcomes are merged when they are joined.

use crate::batch::{BatchAssembler, RecordGenerator, DEFAULT_BATCH_SIZE};
use crate::error::{KinesisPopulatorError, Result};
use crate::service::StreamService;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Pool configuration.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub stream_name: String,
    pub workers: u32,
    /// Batches per worker; `None` runs until cancelled.
    pub iterations: Option<u64>,
    /// Pause before every batch.
    pub interval: Duration,
    pub batch_limit: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            stream_name: String::new(),
            workers: 1,
            iterations: None,
            interval: Duration::from_millis(1),
            batch_limit: DEFAULT_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    Succeeded {
        records: usize,
        /// Records the service rejected inside an accepted request.
        failed_records: usize,
    },
    Failed {
        error: String,
    },
}

/// The result of one worker iteration.
#[derive(Debug, Clone)]
pub struct WorkerOutcome {
    pub worker_id: u32,
    pub iteration: u64,
    pub status: OutcomeStatus,
    /// Time spent in `put_records`.
    pub elapsed: Duration,
}

impl WorkerOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Succeeded { .. })
    }
}

/// Per-worker tallies, returned when the worker task completes.
#[derive(Debug, Default)]
struct WorkerReport {
    outcomes: Vec<WorkerOutcome>,
    batches_succeeded: u64,
    batches_failed: u64,
    records_published: u64,
    records_rejected: u64,
}

impl WorkerReport {
    fn record(&mut self, outcome: WorkerOutcome, keep: bool) {
        match &outcome.status {
            OutcomeStatus::Succeeded {
                records,
                failed_records,
            } => {
                self.batches_succeeded += 1;
                self.records_published += records.saturating_sub(*failed_records) as u64;
                self.records_rejected += *failed_records as u64;
            }
            OutcomeStatus::Failed { .. } => self.batches_failed += 1,
        }
        if keep {
            self.outcomes.push(outcome);
        }
    }
}

/// Aggregated results of a pool run.
#[derive(Debug, Clone, Default)]
pub struct PoolReport {
    /// Every outcome, ordered by worker then iteration. Only populated for
    /// bounded runs; unbounded runs keep the counters below.
    pub outcomes: Vec<WorkerOutcome>,
    pub workers_completed: u32,
    pub workers_panicked: u32,
    pub batches_succeeded: u64,
    pub batches_failed: u64,
    pub records_published: u64,
    pub records_rejected: u64,
    pub total_duration: Duration,
}

impl PoolReport {
    fn merge(&mut self, worker: WorkerReport) {
        self.workers_completed += 1;
        self.batches_succeeded += worker.batches_succeeded;
        self.batches_failed += worker.batches_failed;
        self.records_published += worker.records_published;
        self.records_rejected += worker.records_rejected;
        self.outcomes.extend(worker.outcomes);
    }

    pub fn outcomes_for(&self, worker_id: u32) -> impl Iterator<Item = &WorkerOutcome> {
        self.outcomes.iter().filter(move |o| o.worker_id == worker_id)
    }

    pub fn records_per_second(&self) -> f64 {
        let secs = self.total_duration.as_secs_f64();
        if secs > 0.0 {
            self.records_published as f64 / secs
        } else {
            0.0
        }
    }
}

pub struct ProducerWorkerPool {
    config: PoolConfig,
    assembler: BatchAssembler,
    service: Arc<dyn StreamService>,
}

impl ProducerWorkerPool {
    pub fn new(config: PoolConfig, service: Arc<dyn StreamService>) -> Result<Self> {
        if config.workers == 0 {
            return Err(KinesisPopulatorError::Config(
                "at least one producer is required".to_string(),
            ));
        }
        let assembler = BatchAssembler::new(config.batch_limit)?;
        Ok(Self {
            config,
            assembler,
            service,
        })
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Run all workers to completion. `make_generator` is called once per
    /// worker id.
    pub async fn run<F, G>(&self, make_generator: F, token: CancellationToken) -> PoolReport
    where
        F: Fn(u32) -> G,
        G: RecordGenerator + 'static,
    {
        let start = Instant::now();
        let config = Arc::new(self.config.clone());
        let mut workers = JoinSet::new();

        for worker_id in 0..self.config.workers {
            workers.spawn(run_worker(
                worker_id,
                make_generator(worker_id),
                Arc::clone(&config),
                self.assembler,
                Arc::clone(&self.service),
                token.clone(),
            ));
        }

        let mut report = PoolReport::default();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(worker) => report.merge(worker),
                Err(e) => {
                    error!("Producer worker task failed: {e}");
                    report.workers_panicked += 1;
                }
            }
        }

        report.outcomes.sort_by_key(|o| (o.worker_id, o.iteration));
        report.total_duration = start.elapsed();
        report
    }
}

async fn run_worker<G: RecordGenerator>(
    worker_id: u32,
    mut generator: G,
    config: Arc<PoolConfig>,
    assembler: BatchAssembler,
    service: Arc<dyn StreamService>,
    token: CancellationToken,
) -> WorkerReport {
    let mut report = WorkerReport::default();
    let keep_outcomes = config.iterations.is_some();
    let mut iteration: u64 = 0;

    debug!(worker_id, "Producer started");

    loop {
        if config.iterations.is_some_and(|max| iteration >= max) {
            break;
        }

        tokio::select! {
            biased;
            _ = token.cancelled() => {
                info!(worker_id, iteration, "Cancellation requested, stopping producer");
                break;
            }
            _ = tokio::time::sleep(config.interval) => {}
        }

        let batch = assembler.assemble(&mut generator);
        if batch.is_empty() {
            info!(worker_id, iteration, "Record generator exhausted, stopping producer");
            break;
        }

        let started = Instant::now();
        let status = match service.put_records(&config.stream_name, batch).await {
            Ok(result) => {
                if result.failed_record_count > 0 {
                    warn!(
                        worker_id,
                        iteration,
                        "PutRecords accepted with {} of {} records rejected",
                        result.failed_record_count,
                        result.records_submitted
                    );
                } else {
                    debug!(
                        worker_id,
                        iteration,
                        records = result.records_submitted,
                        "PutRecords succeeded"
                    );
                }
                OutcomeStatus::Succeeded {
                    records: result.records_submitted,
                    failed_records: result.failed_record_count,
                }
            }
            Err(e) => {
                error!(worker_id, iteration, "Error @ PutRecords: {e}");
                OutcomeStatus::Failed {
                    error: e.to_string(),
                }
            }
        };

        report.record(
            WorkerOutcome {
                worker_id,
                iteration,
                status,
                elapsed: started.elapsed(),
            },
            keep_outcomes,
        );
        iteration += 1;
    }

    debug!(worker_id, iterations = iteration, "Producer finished");
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::DryRunStreamService;

    #[test]
    fn test_new_validates_config() {
        let service: Arc<dyn StreamService> = Arc::new(DryRunStreamService);

        let zero_workers = PoolConfig {
            workers: 0,
            ..PoolConfig::default()
        };
        assert!(matches!(
            ProducerWorkerPool::new(zero_workers, Arc::clone(&service)),
            Err(KinesisPopulatorError::Config(_))
        ));

        let oversized = PoolConfig {
            batch_limit: 501,
            ..PoolConfig::default()
        };
        assert!(matches!(
            ProducerWorkerPool::new(oversized, service),
            Err(KinesisPopulatorError::InvalidBatchSize { size: 501, .. })
        ));
    }

    #[test]
    fn test_records_per_second() {
        let report = PoolReport {
            records_published: 500,
            total_duration: Duration::from_secs(2),
            ..PoolReport::default()
        };
        assert_eq!(report.records_per_second(), 250.0);
        assert_eq!(PoolReport::default().records_per_second(), 0.0);
    }

    #[tokio::test]
    async fn test_exhausted_generator_stops_worker() {
        let config = PoolConfig {
            stream_name: "s".to_string(),
            iterations: Some(10),
            batch_limit: 2,
            ..PoolConfig::default()
        };
        let pool = ProducerWorkerPool::new(config, Arc::new(DryRunStreamService)).unwrap();

        let report = pool
            .run(
                |_| {
                    let mut left = 3;
                    move || {
                        (left > 0).then(|| {
                            left -= 1;
                            crate::batch::BatchEntry::new("x", "pk")
                        })
                    }
                },
                CancellationToken::new(),
            )
            .await;

        // 2 + 1 records, then an empty batch that is never submitted.
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.records_published, 3);
    }
}
