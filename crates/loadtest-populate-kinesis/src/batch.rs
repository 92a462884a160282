//! Batch assembly.
//!
//! A batch is filled from a [`RecordGenerator`] until it holds the configured
//! number of entries or the generator runs dry.

use crate::error::{KinesisPopulatorError, Result};

/// Default number of records per PutRecords request.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Hard limit on records in a single PutRecords request.
pub const MAX_RECORDS_PER_REQUEST: usize = 500;

/// One record to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub payload: Vec<u8>,
    pub partition_key: String,
}

impl BatchEntry {
    pub fn new(payload: impl Into<Vec<u8>>, partition_key: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            partition_key: partition_key.into(),
        }
    }
}

/// Ordered entries submitted in one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    entries: Vec<BatchEntry>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<BatchEntry> {
        self.entries
    }

    /// Total payload size in bytes.
    pub fn payload_bytes(&self) -> usize {
        self.entries.iter().map(|e| e.payload.len()).sum()
    }
}

impl FromIterator<BatchEntry> for Batch {
    fn from_iter<I: IntoIterator<Item = BatchEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// A source of records. `None` means the source is exhausted.
pub trait RecordGenerator: Send {
    fn next_record(&mut self) -> Option<BatchEntry>;
}

impl<F> RecordGenerator for F
where
    F: FnMut() -> Option<BatchEntry> + Send,
{
    fn next_record(&mut self) -> Option<BatchEntry> {
        self()
    }
}

/// Pulls records from a generator into size-limited batches.
#[derive(Debug, Clone, Copy)]
pub struct BatchAssembler {
    limit: usize,
}

impl BatchAssembler {
    pub fn new(limit: usize) -> Result<Self> {
        if limit == 0 || limit > MAX_RECORDS_PER_REQUEST {
            return Err(KinesisPopulatorError::InvalidBatchSize {
                size: limit,
                max: MAX_RECORDS_PER_REQUEST,
            });
        }
        Ok(Self { limit })
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Fill a batch. Never asks the generator for more than `limit` records.
    pub fn assemble<G: RecordGenerator + ?Sized>(&self, generator: &mut G) -> Batch {
        let mut entries = Vec::with_capacity(self.limit);
        while entries.len() < self.limit {
            match generator.next_record() {
                Some(entry) => entries.push(entry),
                None => break,
            }
        }
        Batch { entries }
    }
}

impl Default for BatchAssembler {
    fn default() -> Self {
        Self {
            limit: DEFAULT_BATCH_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting(limit: Option<usize>) -> impl FnMut() -> Option<BatchEntry> + Send {
        let mut produced = 0usize;
        move || {
            if limit.is_some_and(|l| produced >= l) {
                return None;
            }
            produced += 1;
            Some(BatchEntry::new(format!("r{produced}"), "pk"))
        }
    }

    #[test]
    fn test_unbounded_generator_fills_to_limit() {
        let assembler = BatchAssembler::new(10).unwrap();
        let mut generator = counting(None);

        let batch = assembler.assemble(&mut generator);
        assert_eq!(batch.len(), 10);
        assert_eq!(batch.entries()[0].payload, b"r1");
        assert_eq!(batch.entries()[9].payload, b"r10");

        // The generator was not over-consumed.
        let next = assembler.assemble(&mut generator);
        assert_eq!(next.entries()[0].payload, b"r11");
    }

    #[test]
    fn test_exhausted_generator_gives_short_then_empty_batch() {
        let assembler = BatchAssembler::new(10).unwrap();
        let mut generator = counting(Some(3));

        assert_eq!(assembler.assemble(&mut generator).len(), 3);
        assert!(assembler.assemble(&mut generator).is_empty());
    }

    #[test]
    fn test_limit_bounds() {
        assert!(BatchAssembler::new(1).is_ok());
        assert!(BatchAssembler::new(MAX_RECORDS_PER_REQUEST).is_ok());
        assert!(matches!(
            BatchAssembler::new(0),
            Err(KinesisPopulatorError::InvalidBatchSize { size: 0, .. })
        ));
        assert!(BatchAssembler::new(MAX_RECORDS_PER_REQUEST + 1).is_err());
    }

    #[test]
    fn test_payload_bytes() {
        let batch: Batch = vec![BatchEntry::new("abc", "a"), BatchEntry::new("de", "b")]
            .into_iter()
            .collect();
        assert_eq!(batch.payload_bytes(), 5);
    }
}
