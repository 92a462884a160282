//! Stream service abstraction.
//!
//! The worker pool only needs to create a stream and put batches into it.
//! [`KinesisStreamService`] does that against AWS (or an emulator via
//! `endpoint_url`); [`DryRunStreamService`] only logs.

use crate::batch::Batch;
use crate::error::ServiceError;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_kinesis::config::{Credentials, Region};
use aws_sdk_kinesis::error::DisplayErrorContext;
use aws_sdk_kinesis::primitives::Blob;
use aws_sdk_kinesis::types::{PutRecordsRequestEntry, StreamStatus};
use aws_sdk_kinesis::Client;
use std::time::Duration;
use tracing::{debug, info};

/// How long `create_stream` waits for a new stream to become active.
const STREAM_ACTIVE_TIMEOUT: Duration = Duration::from_secs(120);
const STREAM_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Result of a single PutRecords call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchResult {
    pub records_submitted: usize,
    /// Records the service rejected individually. These are not retried.
    pub failed_record_count: usize,
}

#[async_trait]
pub trait StreamService: Send + Sync {
    /// Create the stream, treating "already exists" as success.
    async fn create_stream(&self, stream_name: &str, shard_count: u32) -> Result<(), ServiceError>;

    async fn put_records(&self, stream_name: &str, batch: Batch) -> Result<BatchResult, ServiceError>;
}

/// Resolved AWS connection settings.
#[derive(Clone)]
pub struct AwsSettings {
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    pub endpoint_url: Option<String>,
}

impl std::fmt::Debug for AwsSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsSettings")
            .field("access_key", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .field("region", &self.region)
            .field("endpoint_url", &self.endpoint_url)
            .finish()
    }
}

/// Kinesis-backed service.
pub struct KinesisStreamService {
    client: Client,
    active_timeout: Duration,
}

impl KinesisStreamService {
    pub async fn connect(settings: &AwsSettings) -> Self {
        let credentials = Credentials::new(
            settings.access_key.clone(),
            settings.secret_key.clone(),
            None,
            None,
            "kinesis-loadtest",
        );
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .credentials_provider(credentials);
        if let Some(endpoint_url) = &settings.endpoint_url {
            info!("Using Kinesis endpoint override: {endpoint_url}");
            loader = loader.endpoint_url(endpoint_url);
        }
        let sdk_config = loader.load().await;
        Self::from_client(Client::new(&sdk_config))
    }

    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            active_timeout: STREAM_ACTIVE_TIMEOUT,
        }
    }

    async fn wait_until_active(&self, stream_name: &str) -> Result<(), ServiceError> {
        let deadline = tokio::time::Instant::now() + self.active_timeout;
        loop {
            let output = self
                .client
                .describe_stream_summary()
                .stream_name(stream_name)
                .send()
                .await
                .map_err(|e| request_error(stream_name, e))?;
            let active = output
                .stream_description_summary()
                .is_some_and(|summary| matches!(summary.stream_status(), StreamStatus::Active));
            if active {
                info!("Stream '{stream_name}' is active");
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(ServiceError::NotActive {
                    stream: stream_name.to_string(),
                    timeout: self.active_timeout,
                });
            }
            debug!("Waiting for stream '{stream_name}' to become active");
            tokio::time::sleep(STREAM_POLL_INTERVAL).await;
        }
    }
}

fn request_error<E>(stream_name: &str, err: E) -> ServiceError
where
    E: std::error::Error,
{
    ServiceError::Request {
        stream: stream_name.to_string(),
        message: DisplayErrorContext(&err).to_string(),
    }
}

#[async_trait]
impl StreamService for KinesisStreamService {
    async fn create_stream(&self, stream_name: &str, shard_count: u32) -> Result<(), ServiceError> {
        let result = self
            .client
            .create_stream()
            .stream_name(stream_name)
            .shard_count(shard_count as i32)
            .send()
            .await;

        match result {
            Ok(_) => info!("Created stream '{stream_name}' with {shard_count} shard(s)"),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_resource_in_use_exception()) =>
            {
                info!("Stream '{stream_name}' already exists");
            }
            Err(err) => return Err(request_error(stream_name, err)),
        }

        self.wait_until_active(stream_name).await
    }

    async fn put_records(&self, stream_name: &str, batch: Batch) -> Result<BatchResult, ServiceError> {
        let records_submitted = batch.len();
        let entries = batch
            .into_entries()
            .into_iter()
            .map(|entry| {
                PutRecordsRequestEntry::builder()
                    .data(Blob::new(entry.payload))
                    .partition_key(entry.partition_key)
                    .build()
                    .map_err(|e| ServiceError::InvalidRequest(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let output = self
            .client
            .put_records()
            .stream_name(stream_name)
            .set_records(Some(entries))
            .send()
            .await
            .map_err(|e| request_error(stream_name, e))?;

        Ok(BatchResult {
            records_submitted,
            failed_record_count: output.failed_record_count().unwrap_or(0).max(0) as usize,
        })
    }
}

/// Logs each batch and reports it as fully accepted.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunStreamService;

#[async_trait]
impl StreamService for DryRunStreamService {
    async fn create_stream(&self, stream_name: &str, shard_count: u32) -> Result<(), ServiceError> {
        info!("[dry-run] Would create stream '{stream_name}' with {shard_count} shard(s)");
        Ok(())
    }

    async fn put_records(&self, stream_name: &str, batch: Batch) -> Result<BatchResult, ServiceError> {
        debug!(
            "[dry-run] PutRecords to '{stream_name}': {} records, {} bytes",
            batch.len(),
            batch.payload_bytes()
        );
        Ok(BatchResult {
            records_submitted: batch.len(),
            failed_record_count: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::BatchEntry;

    #[tokio::test]
    async fn test_dry_run_accepts_everything() {
        let service = DryRunStreamService;
        let batch: Batch = (0..3).map(|i| BatchEntry::new(vec![b'x'; i], "pk")).collect();

        service.create_stream("s", 1).await.unwrap();
        let result = service.put_records("s", batch).await.unwrap();

        assert_eq!(
            result,
            BatchResult {
                records_submitted: 3,
                failed_record_count: 0
            }
        );
    }

    #[test]
    fn test_settings_debug_hides_secrets() {
        let settings = AwsSettings {
            access_key: "AKIAEXAMPLE".to_string(),
            secret_key: "very-secret".to_string(),
            region: "eu-west-1".to_string(),
            endpoint_url: None,
        };
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("AKIAEXAMPLE"));
        assert!(!rendered.contains("very-secret"));
        assert!(rendered.contains("eu-west-1"));
    }
}
