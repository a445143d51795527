//! Flusher - periodic explicit flush of every output

use std::sync::Arc;
use std::time::Duration;

use contracts::MetricSink;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::running_output::RunningOutput;

/// Calls `RunningOutput::write` on every output at a fixed interval
pub struct Flusher<S> {
    outputs: Vec<Arc<RunningOutput<S>>>,
    interval: Duration,
}

impl<S: MetricSink + 'static> Flusher<S> {
    /// Create a flusher over `outputs`
    pub fn new(outputs: Vec<Arc<RunningOutput<S>>>, interval: Duration) -> Self {
        Self { outputs, interval }
    }

    /// Flush every output once
    ///
    /// Returns the number of outputs whose flush failed.
    pub async fn flush_all(&self) -> usize {
        let mut failed = 0;
        for output in &self.outputs {
            if let Err(e) = output.write().await {
                failed += 1;
                warn!(
                    output = %output.name(),
                    error = %e,
                    pending = output.fail_buffer().len(),
                    "Flush failed, metrics kept for retry"
                );
            }
        }
        failed
    }

    /// Run until `cancel` fires
    ///
    /// The first flush happens one full interval after start.
    #[instrument(
        name = "flusher_run",
        skip(self, cancel),
        fields(outputs = self.outputs.len(), interval_ms = self.interval.as_millis() as u64)
    )]
    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let failed = self.flush_all().await;
                    debug!(failed, "Flush round complete");
                }
            }
        }

        debug!("Flusher stopped");
    }

    /// Spawn the flusher as a background task
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run(cancel).await;
        })
    }
}
