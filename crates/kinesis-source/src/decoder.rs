//! Envelope → events.
//!
//! Each record goes through two layers: base64 transport decoding, then the
//! event markup codec. The two layers fail differently. A transport failure
//! means the delivery itself is corrupt, so by default the whole envelope is
//! rejected. A markup failure only affects its own record and is returned as
//! that record's outcome.
//!
//! Every record is logged at `info` as it is reached, so the records ahead of
//! a transport failure still show up. Markup failures and drift are logged at
//! `warn`.

use crate::envelope::{DeliveryEnvelope, RecordDescriptor};
use crate::error::{EnvelopeError, RecordError, Result};
use event_types::{decode_event, Decoded, Event, SchemaDriftWarning};
use tracing::{debug, info, warn};

/// What to do when a record's payload is not valid base64.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransportErrorPolicy {
    /// Fail the whole call; no attempts are returned.
    #[default]
    AbortEnvelope,
    /// Record a [`RecordError::Transport`] for the record and keep going.
    SkipRecord,
}

/// The outcome of decoding one record.
#[derive(Debug)]
pub struct DecodeAttempt {
    /// Position of the record in the envelope.
    pub index: usize,
    pub record: RecordDescriptor,
    /// Transport-decoded payload, when base64 decoding succeeded.
    pub payload: Option<Vec<u8>>,
    pub outcome: std::result::Result<Decoded, RecordError>,
}

impl DecodeAttempt {
    pub fn event(&self) -> Option<&Event> {
        self.outcome.as_ref().ok().map(|decoded| &decoded.event)
    }

    /// Drift warnings for a decoded record; empty when decoding failed.
    pub fn warnings(&self) -> &[SchemaDriftWarning] {
        match &self.outcome {
            Ok(decoded) => &decoded.warnings,
            Err(_) => &[],
        }
    }

    pub fn has_drift(&self) -> bool {
        !self.warnings().is_empty()
    }
}

/// Counts over a decoded envelope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeSummary {
    pub records: usize,
    pub decoded: usize,
    pub failed: usize,
    /// Decoded records that carried unrecognized content.
    pub drifted: usize,
}

impl DecodeSummary {
    pub fn from_attempts(attempts: &[DecodeAttempt]) -> Self {
        let mut summary = Self {
            records: attempts.len(),
            ..Self::default()
        };
        for attempt in attempts {
            match &attempt.outcome {
                Ok(decoded) => {
                    summary.decoded += 1;
                    if decoded.has_drift() {
                        summary.drifted += 1;
                    }
                }
                Err(_) => summary.failed += 1,
            }
        }
        summary
    }
}

/// Decodes delivery envelopes into events.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeDecoder {
    policy: TransportErrorPolicy,
}

impl EnvelopeDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: TransportErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> TransportErrorPolicy {
        self.policy
    }

    /// Decode a JSON envelope.
    ///
    /// Returns exactly one attempt per record, in envelope order, unless the
    /// envelope is invalid JSON or (under [`TransportErrorPolicy::AbortEnvelope`])
    /// any record fails transport decoding.
    pub fn decode(&self, envelope_json: &[u8]) -> Result<Vec<DecodeAttempt>> {
        let envelope = DeliveryEnvelope::from_json(envelope_json)?;
        self.decode_envelope(envelope)
    }

    /// Decode an already parsed envelope.
    pub fn decode_envelope(&self, envelope: DeliveryEnvelope) -> Result<Vec<DecodeAttempt>> {
        debug!("Decoding envelope with {} records", envelope.len());

        let mut attempts = Vec::with_capacity(envelope.len());
        for (index, kinesis_record) in envelope.records.into_iter().enumerate() {
            let record = kinesis_record.kinesis;
            info!(
                index,
                partition_key = %record.partition_key,
                sequence_number = %record.sequence_number,
                schema_version = %record.schema_version,
                "Kinesis record: {}",
                record.encoded_payload
            );

            let payload = match record.decode_payload() {
                Ok(payload) => payload,
                Err(source) => match self.policy {
                    TransportErrorPolicy::AbortEnvelope => {
                        return Err(EnvelopeError::TransportDecode {
                            index,
                            sequence_number: record.sequence_number,
                            source,
                        });
                    }
                    TransportErrorPolicy::SkipRecord => {
                        warn!(index, "Skipping record with malformed encoding: {source}");
                        attempts.push(DecodeAttempt {
                            index,
                            record,
                            payload: None,
                            outcome: Err(RecordError::Transport(source)),
                        });
                        continue;
                    }
                },
            };

            info!(index, "Decoded data to: {}", String::from_utf8_lossy(&payload));
            let outcome = decode_event(&payload).map_err(RecordError::from);
            match &outcome {
                Ok(decoded) => {
                    for warning in &decoded.warnings {
                        warn!(
                            partition_key = %record.partition_key,
                            sequence_number = %record.sequence_number,
                            "Unrecognized event content: {warning}"
                        );
                    }
                }
                Err(e) => warn!(
                    index,
                    partition_key = %record.partition_key,
                    sequence_number = %record.sequence_number,
                    "Failed to decode record: {e}"
                ),
            }
            attempts.push(DecodeAttempt {
                index,
                record,
                payload: Some(payload),
                outcome,
            });
        }

        Ok(attempts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope_json(descriptors: Vec<RecordDescriptor>) -> Vec<u8> {
        serde_json::to_vec(&DeliveryEnvelope::from_descriptors(descriptors)).unwrap()
    }

    #[test]
    fn test_schema_failure_is_per_record() {
        let json = envelope_json(vec![
            RecordDescriptor::new("a", "1", b"<event id=\"1\"/>"),
            RecordDescriptor::new("b", "2", b"garbage"),
            RecordDescriptor::new("c", "3", b"<event id=\"3\"/>"),
        ]);

        let attempts = EnvelopeDecoder::new().decode(&json).unwrap();

        assert_eq!(attempts.len(), 3);
        assert_eq!(attempts[0].event().unwrap().id.as_deref(), Some("1"));
        assert!(matches!(attempts[1].outcome, Err(RecordError::Schema(_))));
        assert_eq!(attempts[1].payload.as_deref(), Some(&b"garbage"[..]));
        assert_eq!(attempts[2].event().unwrap().id.as_deref(), Some("3"));

        let summary = DecodeSummary::from_attempts(&attempts);
        assert_eq!(summary.decoded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.drifted, 0);
    }

    #[test]
    fn test_skip_policy_isolates_transport_errors() {
        let mut bad = RecordDescriptor::new("b", "2", b"");
        bad.encoded_payload = "***".to_string();
        let json = envelope_json(vec![
            RecordDescriptor::new("a", "1", b"<event id=\"1\"/>"),
            bad,
            RecordDescriptor::new("c", "3", b"<event id=\"3\"><extra/></event>"),
        ]);

        let attempts = EnvelopeDecoder::new()
            .with_policy(TransportErrorPolicy::SkipRecord)
            .decode(&json)
            .unwrap();

        assert_eq!(attempts.len(), 3);
        assert!(attempts[1].payload.is_none());
        assert!(matches!(attempts[1].outcome, Err(RecordError::Transport(_))));
        assert!(attempts[2].has_drift());
        assert_eq!(
            DecodeSummary::from_attempts(&attempts),
            DecodeSummary {
                records: 3,
                decoded: 2,
                failed: 1,
                drifted: 1,
            }
        );
    }

    #[test]
    fn test_empty_envelope() {
        let attempts = EnvelopeDecoder::new().decode(br#"{"Records": []}"#).unwrap();
        assert!(attempts.is_empty());
    }

    #[test]
    fn test_invalid_json() {
        let result = EnvelopeDecoder::new().decode(b"<event/>");
        assert!(matches!(result, Err(EnvelopeError::InvalidEnvelope(_))));
    }
}
