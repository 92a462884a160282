//! CLI argument definitions for the Kinesis populator.

use crate::batch::DEFAULT_BATCH_SIZE;
use crate::error::{KinesisPopulatorError, Result};
use crate::pool::PoolConfig;
use crate::service::AwsSettings;
use clap::Args;
use std::time::Duration;

/// AWS connection settings. All credentials come from the environment.
#[derive(Args, Clone, Debug, Default)]
pub struct AwsArgs {
    /// AWS access key id
    #[arg(long, env = "AWS_ACCESS_KEY", hide_env_values = true)]
    pub aws_access_key: Option<String>,

    /// AWS secret access key
    #[arg(long, env = "AWS_SECRET_KEY", hide_env_values = true)]
    pub aws_secret_key: Option<String>,

    /// AWS region the stream lives in (e.g. "us-east-1")
    #[arg(long, env = "AWS_REGION_NAME")]
    pub aws_region_name: Option<String>,

    /// Override the Kinesis endpoint (e.g. a local emulator)
    #[arg(long, env = "KINESIS_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,
}

impl AwsArgs {
    /// Resolve the settings, failing if any credential is missing or empty.
    pub fn settings(&self) -> Result<AwsSettings> {
        Ok(AwsSettings {
            access_key: required(&self.aws_access_key, "AWS_ACCESS_KEY")?,
            secret_key: required(&self.aws_secret_key, "AWS_SECRET_KEY")?,
            region: required(&self.aws_region_name, "AWS_REGION_NAME")?,
            endpoint_url: self.endpoint_url.clone().filter(|url| !url.is_empty()),
        })
    }
}

fn required(value: &Option<String>, env_name: &str) -> Result<String> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(KinesisPopulatorError::Config(format!(
            "The {env_name} env variable needs to be set"
        ))),
    }
}

/// Kinesis-specific populate arguments.
#[derive(Args, Clone, Debug)]
pub struct KinesisPopulateArgs {
    /// Name of the target stream
    #[arg(long)]
    pub stream_name: String,

    /// Milliseconds each producer sleeps between batches
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u64).range(1..))]
    pub sleep_range: u64,

    /// Number of concurrent producers
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
    pub producers: u32,

    /// Batches each producer sends (omit to run until interrupted)
    #[arg(long)]
    pub event_count: Option<u64>,

    /// Records per PutRecords request (1-500)
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Random seed for deterministic generation (same seed = same events)
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Create the stream before producing if it does not exist
    #[arg(long)]
    pub create_stream: bool,

    /// Shard count used with --create-stream
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
    pub shard_count: u32,

    /// Log batches instead of sending them
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub aws: AwsArgs,
}

impl KinesisPopulateArgs {
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            stream_name: self.stream_name.clone(),
            workers: self.producers,
            iterations: self.event_count,
            interval: Duration::from_millis(self.sleep_range),
            batch_limit: self.batch_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aws(key: Option<&str>, secret: Option<&str>, region: Option<&str>) -> AwsArgs {
        AwsArgs {
            aws_access_key: key.map(String::from),
            aws_secret_key: secret.map(String::from),
            aws_region_name: region.map(String::from),
            endpoint_url: Some(String::new()),
        }
    }

    #[test]
    fn test_settings_require_every_credential() {
        let settings = aws(Some("k"), Some("s"), Some("us-east-1")).settings().unwrap();
        assert_eq!(settings.region, "us-east-1");
        assert!(settings.endpoint_url.is_none());

        let err = aws(Some("k"), None, Some("us-east-1")).settings().unwrap_err();
        assert!(err.to_string().contains("AWS_SECRET_KEY"));

        let err = aws(Some(""), Some("s"), Some("us-east-1")).settings().unwrap_err();
        assert!(err.to_string().contains("AWS_ACCESS_KEY"));

        let err = aws(Some("k"), Some("s"), None).settings().unwrap_err();
        assert!(err.to_string().contains("AWS_REGION_NAME"));
    }
}
