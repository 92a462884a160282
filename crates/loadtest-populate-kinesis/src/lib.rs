//! Kinesis populator for load testing.
//!
//! Generates synthetic activity events and publishes them with `PutRecords`
//! from a pool of concurrent producers.
//!
//! # Architecture
//!
//! ```text
//! EventGenerator (seed + worker id) → BatchAssembler → StreamService::put_records
//!        ↑                                                      │
//!        └──────── ProducerWorkerPool (one task per worker) ◄───┘ WorkerOutcome
//! ```
//!
//! # Modules
//!
//! - [`args`] - CLI argument definitions
//! - [`batch`] - batch assembly
//! - [`generator`] - synthetic page-view events
//! - [`pool`] - concurrent producer workers
//! - [`service`] - stream service trait with Kinesis and dry-run adapters
//! - [`populator`] - high-level facade
//! - [`error`] - error types

pub mod args;
pub mod batch;
pub mod error;
pub mod generator;
pub mod pool;
pub mod populator;
pub mod service;

// Re-export main types for convenient access
pub use args::{AwsArgs, KinesisPopulateArgs};
pub use batch::{
    Batch, BatchAssembler, BatchEntry, RecordGenerator, DEFAULT_BATCH_SIZE,
    MAX_RECORDS_PER_REQUEST,
};
pub use error::{KinesisPopulatorError, Result, ServiceError};
pub use generator::EventGenerator;
pub use pool::{OutcomeStatus, PoolConfig, PoolReport, ProducerWorkerPool, WorkerOutcome};
pub use populator::KinesisPopulator;
pub use service::{
    AwsSettings, BatchResult, DryRunStreamService, KinesisStreamService, StreamService,
};
