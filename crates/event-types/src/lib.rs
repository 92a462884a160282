//! Activity event model and markup codec for kinesis-loadtest.
//!
//! Events travel through the stream as tagged markup with an `<event>` root.
//! This crate owns both directions of that format.
//!
//! # Architecture
//!
//! ```text
//! Forward (producer):  Event → markup bytes
//! Reverse (consumer):  markup bytes → BINDINGS (path → setter) → Event + drift warnings
//! ```
//!
//! # Modules
//!
//! - [`event`] - the wide, all-optional `Event` aggregate
//! - [`schema`] - declarative path bindings
//! - [`forward`] - encoding for producers
//! - [`reverse`] - permissive decoding for consumers
//! - [`error`] - error types
//!
//! # Example
//!
//! ```
//! use event_types::decode_event;
//!
//! let decoded = decode_event(br#"<event id="x" type="page:view"><mystery/></event>"#).unwrap();
//! assert_eq!(decoded.event.id.as_deref(), Some("x"));
//! assert!(decoded.has_drift());
//! ```

pub mod error;
pub mod event;
pub mod forward;
pub mod reverse;
pub mod schema;

// Re-export main types for convenient access
pub use error::{EventCodecError, Result};
pub use event::{
    Comment, CommentContent, Data, Diff, Event, File, Grant, PageRef, Parameter, Property,
    Request, Tag, User, Workflow, WorkflowData,
};
pub use forward::encode_event;
pub use reverse::{decode_event, Decoded, SchemaDriftWarning, ROOT_ELEMENT};
pub use schema::SCHEMA_VERSION;
