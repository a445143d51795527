//! MetricSink trait - output stage downstream interface
//!
//! Defines the abstract interface for sinks.

use crate::{ContractError, Metric};

/// Metric output trait
///
/// All sink implementations must implement this trait.
#[trait_variant::make(MetricSink: Send)]
pub trait LocalMetricSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one batch of metrics
    ///
    /// A batch is either accepted as a whole or reported as failed; the
    /// caller keeps ownership of the metrics and decides about retries.
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, batch: &[Metric]) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
