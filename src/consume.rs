//! `consume` subcommand: decode a delivery envelope and log every record.

use anyhow::Context;
use clap::Args;
use kinesis_source::{DecodeAttempt, DecodeSummary, EnvelopeDecoder, TransportErrorPolicy};
use std::io::Read;
use std::path::PathBuf;
use tracing::{info, warn};

/// Arguments for the `consume` subcommand.
#[derive(Args, Clone, Debug, Default)]
pub struct ConsumeArgs {
    /// Delivery envelope JSON ("-" reads stdin)
    #[arg(conflicts_with = "file")]
    pub envelope: Option<String>,

    /// Read the envelope from a file ("-" reads stdin)
    #[arg(long, short = 'f')]
    pub file: Option<PathBuf>,

    /// Record base64 failures per record instead of rejecting the envelope
    #[arg(long)]
    pub skip_bad_transport: bool,
}

impl ConsumeArgs {
    pub fn policy(&self) -> TransportErrorPolicy {
        if self.skip_bad_transport {
            TransportErrorPolicy::SkipRecord
        } else {
            TransportErrorPolicy::AbortEnvelope
        }
    }

    /// Load the envelope bytes from whichever source was given.
    pub fn read_envelope(&self) -> anyhow::Result<Vec<u8>> {
        match (&self.envelope, &self.file) {
            (Some(inline), _) if inline != "-" => Ok(inline.clone().into_bytes()),
            (_, Some(path)) if path.as_os_str() != "-" => std::fs::read(path)
                .with_context(|| format!("Failed to read envelope from {path:?}")),
            (None, None) => anyhow::bail!("No envelope given: pass it inline, or use --file"),
            _ => {
                let mut buf = Vec::new();
                std::io::stdin()
                    .read_to_end(&mut buf)
                    .context("Failed to read envelope from stdin")?;
                Ok(buf)
            }
        }
    }
}

/// Decode the envelope and log each record.
pub fn run_consume(args: &ConsumeArgs) -> anyhow::Result<DecodeSummary> {
    let envelope = args.read_envelope()?;
    let attempts = EnvelopeDecoder::new()
        .with_policy(args.policy())
        .decode(&envelope)
        .context("Failed to decode delivery envelope")?;

    for attempt in &attempts {
        log_attempt(attempt);
    }

    let summary = DecodeSummary::from_attempts(&attempts);
    info!(
        "Processed {} records: {} decoded, {} failed, {} with unrecognized content",
        summary.records, summary.decoded, summary.failed, summary.drifted
    );
    Ok(summary)
}

/// Records and decode failures are already logged by the decoder; this adds
/// the decoded event itself.
fn log_attempt(attempt: &DecodeAttempt) {
    let Ok(decoded) = &attempt.outcome else {
        return;
    };
    match serde_json::to_string(&decoded.event) {
        Ok(json) => info!(index = attempt.index, "Event: {json}"),
        Err(e) => warn!(index = attempt.index, "Failed to render event: {e}"),
    }
}
