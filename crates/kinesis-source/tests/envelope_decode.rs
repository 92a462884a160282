//! Envelope decoding against hand-written Kinesis deliveries.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::io::Write;
use std::sync::{Arc, Mutex};

use kinesis_source::{
    DeliveryEnvelope, EnvelopeDecoder, EnvelopeError, RecordDescriptor, RecordError,
};

fn envelope_with_payloads(payloads: &[&str]) -> Vec<u8> {
    let descriptors = payloads.iter().enumerate().map(|(i, payload)| {
        RecordDescriptor::new(&format!("site_{i}"), &i.to_string(), payload.as_bytes())
    });
    serde_json::to_vec(&DeliveryEnvelope::from_descriptors(descriptors)).unwrap()
}

#[test]
fn test_single_page_view_record() {
    let markup = r#"<event id="x" datetime="d" type="page:view" wikiid="w" journaled="false" version="2"></event>"#;
    let json = format!(
        r#"{{"Records":[{{"kinesis":{{"partitionKey":"pk","kinesisSchemaVersion":"1.0","data":"{}","sequenceNumber":"1"}}}}]}}"#,
        STANDARD.encode(markup)
    );

    let attempts = EnvelopeDecoder::new().decode(json.as_bytes()).unwrap();

    assert_eq!(attempts.len(), 1);
    let attempt = &attempts[0];
    assert_eq!(attempt.record.partition_key, "pk");
    assert_eq!(attempt.record.sequence_number, "1");
    let event = attempt.event().unwrap();
    assert_eq!(event.id.as_deref(), Some("x"));
    assert_eq!(event.event_type.as_deref(), Some("page:view"));
    assert_eq!(event.datetime.as_deref(), Some("d"));
    assert_eq!(event.wiki_id.as_deref(), Some("w"));
    assert!(event.request.is_none());
    assert!(event.page.is_none());
    assert!(event.tags_added.is_empty());
    assert!(event.unrecognized.is_none());
    assert!(!attempt.has_drift());
}

#[test]
fn test_every_record_is_attempted_in_order() {
    let payloads = [
        r#"<event id="0" type="page:view"/>"#,
        "definitely not markup",
        r#"<event id="2" type="page:edit"><unknown-section/></event>"#,
        r#"<event id="3" type="user:login"><user id="42"/></event>"#,
        "",
    ];

    let attempts = EnvelopeDecoder::new()
        .decode(&envelope_with_payloads(&payloads))
        .unwrap();

    assert_eq!(attempts.len(), payloads.len());
    for (i, attempt) in attempts.iter().enumerate() {
        assert_eq!(attempt.index, i);
        assert_eq!(attempt.record.partition_key, format!("site_{i}"));
    }
    assert_eq!(attempts[0].event().unwrap().id.as_deref(), Some("0"));
    assert!(matches!(attempts[1].outcome, Err(RecordError::Schema(_))));
    assert!(attempts[2].has_drift());
    assert_eq!(attempts[2].warnings()[0].element, "unknown-section");
    assert_eq!(
        attempts[3]
            .event()
            .unwrap()
            .user
            .as_ref()
            .unwrap()
            .id
            .as_deref(),
        Some("42")
    );
    assert!(matches!(attempts[4].outcome, Err(RecordError::Schema(_))));
}

#[test]
fn test_bad_transport_encoding_aborts_everything() {
    let json = br#"{"Records":[
        {"kinesis":{"partitionKey":"a","kinesisSchemaVersion":"1.0","data":"PGV2ZW50Lz4=","sequenceNumber":"1"}},
        {"kinesis":{"partitionKey":"b","kinesisSchemaVersion":"1.0","data":"%%% not base64 %%%","sequenceNumber":"2"}},
        {"kinesis":{"partitionKey":"c","kinesisSchemaVersion":"1.0","data":"PGV2ZW50Lz4=","sequenceNumber":"3"}}
    ]}"#;

    let result = EnvelopeDecoder::new().decode(json);

    match result {
        Err(EnvelopeError::TransportDecode {
            index,
            sequence_number,
            ..
        }) => {
            assert_eq!(index, 1);
            assert_eq!(sequence_number, "2");
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[test]
fn test_unpadded_base64_is_a_transport_error() {
    // "<event/>" without its trailing '='
    let json = br#"{"Records":[{"kinesis":{"partitionKey":"a","kinesisSchemaVersion":"1.0","data":"PGV2ZW50Lz4","sequenceNumber":"1"}}]}"#;

    let result = EnvelopeDecoder::new().decode(json);

    assert!(matches!(
        result,
        Err(EnvelopeError::TransportDecode { index: 0, .. })
    ));
}

#[test]
fn test_record_without_kinesis_object_is_still_attempted() {
    let json = br#"{"Records":[
        {"eventSource":"aws:kinesis"},
        {"kinesis":{"partitionKey":null,"kinesisSchemaVersion":"1.0","data":"PGV2ZW50IGlkPSJ4Ii8+","sequenceNumber":null}}
    ]}"#;

    let attempts = EnvelopeDecoder::new().decode(json).unwrap();

    assert_eq!(attempts.len(), 2);
    // An absent payload decodes to no bytes, which is not an event.
    assert_eq!(attempts[0].payload.as_deref(), Some(&b""[..]));
    assert!(matches!(attempts[0].outcome, Err(RecordError::Schema(_))));
    assert_eq!(attempts[1].record.partition_key, "");
    assert_eq!(attempts[1].event().unwrap().id.as_deref(), Some("x"));
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn decode_with_logs(json: &[u8]) -> (bool, String) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .finish();

    let ok = tracing::subscriber::with_default(subscriber, || {
        EnvelopeDecoder::new().decode(json).is_ok()
    });
    let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    (ok, output)
}

#[test]
fn test_records_before_transport_failure_are_logged() {
    let json = envelope_with_raw_data(&[
        STANDARD.encode(r#"<event id="a"/>"#).as_str(),
        "%%%",
        STANDARD.encode(r#"<event id="c"/>"#).as_str(),
    ]);

    let (ok, output) = decode_with_logs(json.as_bytes());

    assert!(!ok);
    assert!(output.contains(r#"Decoded data to: <event id="a"/>"#));
    assert!(output.contains("Kinesis record: %%%"));
    assert!(!output.contains(STANDARD.encode(r#"<event id="c"/>"#).as_str()));
}

#[test]
fn test_schema_failures_and_drift_are_warned() {
    let json = envelope_with_raw_data(&[
        STANDARD.encode("not markup").as_str(),
        STANDARD.encode(r#"<event id="d"><mystery/></event>"#).as_str(),
    ]);

    let (ok, output) = decode_with_logs(json.as_bytes());

    assert!(ok);
    let warnings: Vec<&str> = output.lines().filter(|l| l.contains(" WARN ")).collect();
    assert_eq!(warnings.len(), 2);
    assert!(warnings[0].contains("Failed to decode record"));
    assert!(warnings[1].contains("Unrecognized event content"));
    assert!(warnings[1].contains("mystery"));
}

fn envelope_with_raw_data(data: &[&str]) -> String {
    let records: Vec<String> = data
        .iter()
        .enumerate()
        .map(|(i, d)| {
            format!(
                r#"{{"kinesis":{{"partitionKey":"site_{i}","kinesisSchemaVersion":"1.0","data":"{d}","sequenceNumber":"{i}"}}}}"#
            )
        })
        .collect();
    format!(r#"{{"Records":[{}]}}"#, records.join(","))
}
