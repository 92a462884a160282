//! Error types for envelope decoding.

use event_types::EventCodecError;
use thiserror::Error;

/// Errors that abort decoding of a whole envelope.
#[derive(Error, Debug)]
pub enum EnvelopeError {
    #[error("Invalid delivery envelope: {0}")]
    InvalidEnvelope(#[from] serde_json::Error),

    #[error("Record {index} (sequence number '{sequence_number}') has a malformed payload encoding: {source}")]
    TransportDecode {
        index: usize,
        sequence_number: String,
        source: base64::DecodeError,
    },
}

/// Errors confined to a single record.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Malformed payload encoding: {0}")]
    Transport(#[from] base64::DecodeError),

    #[error("Could not deserialize event: {0}")]
    Schema(#[from] EventCodecError),
}

/// Result type alias for envelope operations.
pub type Result<T> = std::result::Result<T, EnvelopeError>;
