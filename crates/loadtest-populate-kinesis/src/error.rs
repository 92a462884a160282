//! Error types for the Kinesis populator.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while setting up or running population.
#[derive(Error, Debug)]
pub enum KinesisPopulatorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid batch size {size}: must be between 1 and {max}")]
    InvalidBatchSize { size: usize, max: usize },

    #[error("Stream service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Event encoding error: {0}")]
    Encoding(#[from] event_types::EventCodecError),
}

/// Errors reported by a [`crate::service::StreamService`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Request to stream '{stream}' failed: {message}")]
    Request { stream: String, message: String },

    #[error("Stream '{stream}' did not become active within {timeout:?}")]
    NotActive { stream: String, timeout: Duration },
}

/// Result type alias for populator operations.
pub type Result<T> = std::result::Result<T, KinesisPopulatorError>;
