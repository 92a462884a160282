//! Synthetic page-view events.
//!
//! The generator is seeded, so the same seed yields the same sequence of
//! ids, users, pages and partition keys. Only `datetime` depends on the
//! configured start time.

use crate::batch::{BatchEntry, RecordGenerator};
use chrono::{DateTime, SecondsFormat, Utc};
use event_types::{encode_event, Data, Event, PageRef, Parameter, Request, User};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::error;
use uuid::Uuid;

/// Number of distinct `site_{n}` partition keys.
pub const DEFAULT_SITE_COUNT: u32 = 100;

const PAGE_PATHS: &[&str] = &[
    "",
    "Home",
    "Sandbox",
    "Docs/Getting_Started",
    "Docs/Reference/API",
    "Community/Forums",
    "Release_Notes",
];

const USER_NAMES: &[&str] = &["admin", "alice", "bob", "carol", "dave", "erin"];

/// Generates page-view events and their encoded payloads.
#[derive(Debug)]
pub struct EventGenerator {
    rng: StdRng,
    serial: u64,
    site_count: u32,
    start_time: DateTime<Utc>,
}

impl EventGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            serial: 0,
            site_count: DEFAULT_SITE_COUNT,
            start_time: Utc::now(),
        }
    }

    pub fn with_start_time(mut self, start_time: DateTime<Utc>) -> Self {
        self.start_time = start_time;
        self
    }

    pub fn with_site_count(mut self, site_count: u32) -> Self {
        self.site_count = site_count.max(1);
        self
    }

    /// Serial number the next event will carry.
    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// Produce the next event along with its partition key.
    pub fn next_event(&mut self) -> (Event, String) {
        let serial = self.serial;
        self.serial += 1;

        let site = format!("site_{}", self.rng.gen_range(1..=self.site_count));
        let user_index = self.rng.gen_range(0..USER_NAMES.len());
        let page_index = self.rng.gen_range(0..PAGE_PATHS.len());
        let datetime = self.start_time + chrono::Duration::milliseconds(serial as i64);

        let user = User {
            id: Some((user_index + 1).to_string()),
            anonymous: Some("false".to_string()),
            username: Some(USER_NAMES[user_index].to_string()),
            name: None,
        };

        let event = Event {
            id: Some(self.uuid().to_string()),
            datetime: Some(datetime.to_rfc3339_opts(SecondsFormat::Millis, true)),
            event_type: Some("page:view".to_string()),
            wiki_id: Some(site.clone()),
            journaled: Some("false".to_string()),
            version: Some("2".to_string()),
            request: Some(Request {
                id: Some(self.uuid().to_string()),
                seq: Some(serial.to_string()),
                count: Some("1".to_string()),
                signature: Some(format!("GET:pages/{}/contents", page_index + 1)),
                ip: Some(self.ip()),
                session_id: Some(format!("{:016x}", self.rng.gen::<u64>())),
                parameters: vec![Parameter {
                    name: Some("mode".to_string()),
                    value: Some("view".to_string()),
                }],
                user: Some(user.clone()),
            }),
            page: Some(PageRef {
                id: Some((page_index + 1).to_string()),
                path: Some(PAGE_PATHS[page_index].to_string()),
            }),
            data: Some(Data {
                uri_host: Some(format!("{site}.example.com")),
                uri_scheme: Some("https".to_string()),
                uri_query: Some(String::new()),
                query: None,
                constraint: None,
            }),
            user: Some(user),
            ..Event::default()
        };

        (event, site)
    }

    fn uuid(&mut self) -> Uuid {
        let mut bytes = [0u8; 16];
        self.rng.fill(&mut bytes);
        bytes[6] = (bytes[6] & 0x0f) | 0x40;
        bytes[8] = (bytes[8] & 0x3f) | 0x80;
        Uuid::from_bytes(bytes)
    }

    fn ip(&mut self) -> String {
        let octets: [u8; 3] = self.rng.gen();
        format!("10.{}.{}.{}", octets[0], octets[1], octets[2])
    }
}

impl RecordGenerator for EventGenerator {
    fn next_record(&mut self) -> Option<BatchEntry> {
        let (event, partition_key) = self.next_event();
        match encode_event(&event) {
            Ok(payload) => Some(BatchEntry {
                payload,
                partition_key,
            }),
            Err(e) => {
                // Treated as exhaustion; the worker stops.
                error!("Failed to encode generated event: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use event_types::decode_event;

    fn fixed(seed: u64) -> EventGenerator {
        let start = Utc.with_ymd_and_hms(2014, 2, 6, 0, 0, 6).unwrap();
        EventGenerator::new(seed).with_start_time(start)
    }

    #[test]
    fn test_same_seed_same_records() {
        let mut a = fixed(7);
        let mut b = fixed(7);
        for _ in 0..5 {
            assert_eq!(a.next_record(), b.next_record());
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let mut a = fixed(1);
        let mut b = fixed(2);
        assert_ne!(a.next_event().0.id, b.next_event().0.id);
    }

    #[test]
    fn test_serial_is_embedded_and_increments() {
        let mut generator = fixed(42);
        for expected in 0..3u64 {
            let (event, _) = generator.next_event();
            let seq = event.request.unwrap().seq.unwrap();
            assert_eq!(seq, expected.to_string());
        }
        assert_eq!(generator.serial(), 3);
    }

    #[test]
    fn test_partition_key_matches_wiki() {
        let mut generator = fixed(42).with_site_count(3);
        for _ in 0..20 {
            let (event, key) = generator.next_event();
            assert!(["site_1", "site_2", "site_3"].contains(&key.as_str()));
            assert_eq!(event.wiki_id.as_deref(), Some(key.as_str()));
        }
    }

    #[test]
    fn test_payload_decodes_without_drift() {
        let mut generator = fixed(42);
        let (event, _) = generator.next_event();
        let mut replay = fixed(42);
        let entry = replay.next_record().unwrap();

        let decoded = decode_event(&entry.payload).unwrap();

        assert!(!decoded.has_drift());
        assert_eq!(decoded.event.id, event.id);
        assert_eq!(decoded.event.datetime.as_deref(), Some("2014-02-06T00:00:06.000Z"));
        assert_eq!(decoded.event.event_type.as_deref(), Some("page:view"));
        let id = decoded.event.id.unwrap();
        assert_eq!(Uuid::parse_str(&id).unwrap().get_version_num(), 4);
    }
}
