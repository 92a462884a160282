//! Delivery envelope wire types.
//!
//! The shape is the one Kinesis hands to a Lambda consumer:
//!
//! ```json
//! {"Records": [{"kinesis": {"partitionKey": "...", "kinesisSchemaVersion": "1.0",
//!                           "data": "<base64>", "sequenceNumber": "..."}}]}
//! ```
//!
//! Fields this crate does not use (`eventSource`, `approximateArrivalTimestamp`, ...)
//! are ignored.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize};

/// Top-level delivery document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryEnvelope {
    #[serde(rename = "Records", default, deserialize_with = "null_as_default")]
    pub records: Vec<KinesisRecord>,
}

/// One entry of `Records`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KinesisRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub kinesis: RecordDescriptor,
}

/// Metadata and encoded payload of a single stream record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDescriptor {
    #[serde(rename = "partitionKey", default, deserialize_with = "null_as_default")]
    pub partition_key: String,
    #[serde(rename = "kinesisSchemaVersion", default, deserialize_with = "null_as_default")]
    pub schema_version: String,
    /// Base64 (standard alphabet, padded) of the event markup.
    #[serde(rename = "data", default, deserialize_with = "null_as_default")]
    pub encoded_payload: String,
    #[serde(rename = "sequenceNumber", default, deserialize_with = "null_as_default")]
    pub sequence_number: String,
}

/// Reads an explicit `null` the same way as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl RecordDescriptor {
    /// Build a descriptor around raw payload bytes, encoding them for transport.
    pub fn new(partition_key: &str, sequence_number: &str, payload: &[u8]) -> Self {
        Self {
            partition_key: partition_key.to_string(),
            schema_version: "1.0".to_string(),
            encoded_payload: STANDARD.encode(payload),
            sequence_number: sequence_number.to_string(),
        }
    }

    /// Reverse the transport encoding.
    pub fn decode_payload(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(self.encoded_payload.as_bytes())
    }
}

impl DeliveryEnvelope {
    /// Parse an envelope from its JSON form.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn from_descriptors(descriptors: impl IntoIterator<Item = RecordDescriptor>) -> Self {
        Self {
            records: descriptors
                .into_iter()
                .map(|kinesis| KinesisRecord { kinesis })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lambda_envelope() {
        let json = r#"{
            "Records": [{
                "eventID": "shardId-000000000000:4954",
                "eventSource": "aws:kinesis",
                "kinesis": {
                    "partitionKey": "site_1",
                    "kinesisSchemaVersion": "1.0",
                    "data": "PGV2ZW50Lz4=",
                    "sequenceNumber": "49545115243490985018280067714973144582180062593244200961",
                    "approximateArrivalTimestamp": 1428537600.0
                }
            }]
        }"#;

        let envelope = DeliveryEnvelope::from_json(json.as_bytes()).unwrap();

        assert_eq!(envelope.len(), 1);
        let record = &envelope.records[0].kinesis;
        assert_eq!(record.partition_key, "site_1");
        assert_eq!(record.schema_version, "1.0");
        assert_eq!(record.decode_payload().unwrap(), b"<event/>");
    }

    #[test]
    fn test_missing_keys_default_to_empty() {
        let envelope =
            DeliveryEnvelope::from_json(br#"{"Records": [{"kinesis": {"data": ""}}]}"#).unwrap();

        let record = &envelope.records[0].kinesis;
        assert_eq!(record.partition_key, "");
        assert_eq!(record.sequence_number, "");
        assert!(record.decode_payload().unwrap().is_empty());
    }

    #[test]
    fn test_record_without_kinesis_object() {
        let envelope =
            DeliveryEnvelope::from_json(br#"{"Records":[{"eventSource":"aws:kinesis"}]}"#).unwrap();

        assert_eq!(envelope.len(), 1);
        assert_eq!(envelope.records[0].kinesis, RecordDescriptor::default());
    }

    #[test]
    fn test_null_values_default_to_empty() {
        let json = br#"{"Records":[
            {"kinesis":{"partitionKey":null,"kinesisSchemaVersion":null,"data":"PGV2ZW50Lz4=","sequenceNumber":null}},
            {"kinesis":null}
        ]}"#;

        let envelope = DeliveryEnvelope::from_json(json).unwrap();

        assert_eq!(envelope.len(), 2);
        let first = &envelope.records[0].kinesis;
        assert_eq!(first.partition_key, "");
        assert_eq!(first.sequence_number, "");
        assert_eq!(first.decode_payload().unwrap(), b"<event/>");
        assert_eq!(envelope.records[1].kinesis.encoded_payload, "");
        assert!(DeliveryEnvelope::from_json(br#"{"Records":null}"#).unwrap().is_empty());
    }

    #[test]
    fn test_descriptor_encodes_payload() {
        let record = RecordDescriptor::new("pk", "1", b"<event id=\"x\"/>");

        assert_eq!(record.encoded_payload, "PGV2ZW50IGlkPSJ4Ii8+");
        assert_eq!(record.decode_payload().unwrap(), b"<event id=\"x\"/>");
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        assert!(DeliveryEnvelope::from_json(b"{\"Records\": [").is_err());
        assert!(DeliveryEnvelope::from_json(b"not json").is_err());
    }
}
