//! Configuration helpers shared by the subcommands.

pub mod duration;

pub use duration::parse_duration;
