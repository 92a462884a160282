//! Error types for event-types crate.

use thiserror::Error;

/// Errors that can occur while encoding or decoding event markup.
#[derive(Error, Debug)]
pub enum EventCodecError {
    #[error("Malformed event markup: {0}")]
    Malformed(String),

    #[error("Event encoding error: {0}")]
    Encode(String),
}

impl From<quick_xml::Error> for EventCodecError {
    fn from(err: quick_xml::Error) -> Self {
        EventCodecError::Malformed(err.to_string())
    }
}

/// Result type alias for event-types operations.
pub type Result<T> = std::result::Result<T, EventCodecError>;
