//! kinesis-loadtest library
//!
//! Synthetic load for a Kinesis stream and the matching consumer-side decode
//! path.
//!
//! # Crates
//!
//! - `event_types` - the activity `Event` model and its markup codec
//! - `kinesis_source` - delivery envelope decoding
//! - `loadtest_populate_kinesis` - concurrent batch producers
//!
//! # CLI Usage
//!
//! ```bash
//! # Four producers, 100 batches each, 50ms apart
//! kinesis-loadtest produce --stream-name events --producers 4 \
//!   --event-count 100 --sleep-range 50
//!
//! # Decode a delivery envelope
//! kinesis-loadtest consume --file envelope.json
//! ```

use clap::{Parser, Subcommand};
use loadtest_populate_kinesis::KinesisPopulateArgs;

pub mod config;
pub mod consume;
pub mod produce;

pub use consume::{run_consume, ConsumeArgs};
pub use produce::run_produce;

#[derive(Parser)]
#[command(name = "kinesis-loadtest")]
#[command(about = "Generate synthetic load for a Kinesis stream and decode its deliveries")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Publish synthetic events with concurrent producers
    Produce {
        #[command(flatten)]
        args: KinesisPopulateArgs,

        /// Stop after this long (e.g. "500ms", "30s", "5m", "1h")
        #[arg(long)]
        run_for: Option<String>,
    },

    /// Decode a delivery envelope and log every event
    Consume {
        #[command(flatten)]
        args: ConsumeArgs,
    },
}
