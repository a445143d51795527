//! # Outputs
//!
//! Output-buffering stage of the metric relay.
//!
//! Responsibilities:
//! - Filter and tag-rewrite metrics per output
//! - Accumulate metrics into bounded, drop-oldest buffers
//! - Send full batches immediately, retry failed batches on every flush
//! - Fan-out incoming metrics to every configured sink

pub mod agent;
pub mod buffer;
pub mod error;
pub mod filter;
pub mod flusher;
pub mod running_output;
pub mod sinks;
pub mod stats;

pub use agent::{create_agent, Agent, AgentBuilder, AgentReport};
pub use buffer::MetricBuffer;
pub use contracts::{Metric, MetricSink};
pub use error::OutputError;
pub use filter::Filter;
pub use flusher::Flusher;
pub use running_output::{OutputSettings, RunningOutput};
pub use sinks::{ConfiguredSink, FileSink, LogSink, NetworkSink};
pub use stats::{OutputStats, StatsSnapshot};
