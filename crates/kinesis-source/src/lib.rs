//! Kinesis delivery envelope decoding for kinesis-loadtest.
//!
//! This crate provides:
//! - Wire types for the JSON envelope Kinesis delivers to consumers
//! - A layered decoder: base64 transport decoding, then event markup decoding
//!
//! # Error policy
//!
//! A record whose payload is not valid base64 aborts the whole envelope
//! (the delivery is considered corrupt). A record whose markup cannot be
//! decoded is reported on its own and the remaining records are still
//! decoded. [`TransportErrorPolicy::SkipRecord`] opts into isolating
//! transport failures per record as well.
//!
//! # Dependency Direction
//!
//! The event model and codec live in `event-types`; this crate only adds the
//! envelope layer on top of them.

pub mod decoder;
pub mod envelope;
pub mod error;

pub use decoder::{DecodeAttempt, DecodeSummary, EnvelopeDecoder, TransportErrorPolicy};
pub use envelope::{DeliveryEnvelope, KinesisRecord, RecordDescriptor};
pub use error::{EnvelopeError, RecordError, Result};

// Re-export from event-types for convenience
pub use event_types::{Decoded, Event, SchemaDriftWarning};
