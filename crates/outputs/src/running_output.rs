//! RunningOutput - filter, batch and retry in front of a single sink
//!
//! Metrics accumulate in a primary buffer sized to one batch. A full
//! primary buffer is sent immediately; failed batches move to the fail
//! buffer (capacity = buffer limit) and are retried on the next explicit
//! `write`. Both buffers evict their oldest metrics when full, so producers
//! never wait on a slow or unavailable sink.

use std::time::Instant;

use contracts::{
    AgentSettings, ContractError, Metric, MetricSink, OutputConfig, DEFAULT_METRIC_BATCH_SIZE,
    DEFAULT_METRIC_BUFFER_LIMIT,
};
use observability::{BUFFER_FAIL, BUFFER_PRIMARY};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::buffer::MetricBuffer;
use crate::error::OutputError;
use crate::filter::Filter;
use crate::stats::{OutputStats, StatsSnapshot};

/// Batch size, buffer limit and logging behaviour of an output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSettings {
    /// Metrics per batch (0 = default)
    pub batch_size: usize,
    /// Fail buffer capacity (0 = default)
    pub buffer_limit: usize,
    /// Suppress the per-write info line
    pub quiet: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_METRIC_BATCH_SIZE,
            buffer_limit: DEFAULT_METRIC_BUFFER_LIMIT,
            quiet: false,
        }
    }
}

/// Output stage wrapping one sink
pub struct RunningOutput<S> {
    name: String,
    sink: Mutex<S>,
    filter: Filter,
    quiet: bool,
    batch_size: usize,
    buffer_limit: usize,
    /// Primary buffer, capacity = batch size
    buffer: MetricBuffer,
    /// Failed writes pending retry, capacity = buffer limit
    fail_buffer: MetricBuffer,
    stats: OutputStats,
}

impl<S: MetricSink> RunningOutput<S> {
    /// Create a new output; zero sizes fall back to the defaults
    pub fn new(name: impl Into<String>, sink: S, filter: Filter, settings: OutputSettings) -> Self {
        let batch_size = if settings.batch_size == 0 {
            DEFAULT_METRIC_BATCH_SIZE
        } else {
            settings.batch_size
        };
        let buffer_limit = if settings.buffer_limit == 0 {
            DEFAULT_METRIC_BUFFER_LIMIT
        } else {
            settings.buffer_limit
        };

        Self {
            name: name.into(),
            sink: Mutex::new(sink),
            filter,
            quiet: settings.quiet,
            batch_size,
            buffer_limit,
            buffer: MetricBuffer::new(batch_size),
            fail_buffer: MetricBuffer::new(buffer_limit),
            stats: OutputStats::new(),
        }
    }

    /// Create from configuration, inheriting agent-level defaults
    pub fn from_config(
        config: &OutputConfig,
        agent: &AgentSettings,
        sink: S,
    ) -> Result<Self, OutputError> {
        let filter = Filter::compile(&config.name, &config.filter)?;
        let settings = OutputSettings {
            batch_size: config.batch_size(agent),
            buffer_limit: config.buffer_limit(agent),
            quiet: agent.quiet,
        };
        Ok(Self::new(&config.name, sink, filter, settings))
    }

    /// Output name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Metrics per batch
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Fail buffer capacity
    pub fn buffer_limit(&self) -> usize {
        self.buffer_limit
    }

    /// Primary buffer
    pub fn buffer(&self) -> &MetricBuffer {
        &self.buffer
    }

    /// Buffer of failed metrics pending retry
    pub fn fail_buffer(&self) -> &MetricBuffer {
        &self.fail_buffer
    }

    /// Get snapshot of counters and buffer state
    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            metrics_added: self.stats.metrics_added(),
            metrics_filtered: self.stats.metrics_filtered(),
            batches_written: self.stats.batches_written(),
            metrics_written: self.stats.metrics_written(),
            write_failures: self.stats.write_failures(),
            buffer_len: self.buffer.len(),
            buffer_drops: self.buffer.drops(),
            fail_buffer_len: self.fail_buffer.len(),
            fail_buffer_drops: self.fail_buffer.drops(),
            write_latency_ms: self.stats.write_latency(),
        }
    }

    /// Add a metric to the output
    ///
    /// Sends a batch as soon as the primary buffer holds `batch_size`
    /// metrics; a failed send moves the batch to the fail buffer.
    pub async fn add_metric(&self, metric: Metric) {
        if self.filter.is_active() && !self.filter.should_metric_pass(&metric) {
            self.stats.inc_metrics_filtered();
            observability::record_metrics_filtered(&self.name);
            return;
        }

        // Metrics are immutable: a tag rewrite builds a new one
        let metric = if self.filter.rewrites_tags() {
            let mut tags = metric.tags().clone();
            self.filter.filter_tags(&mut tags);
            metric.with_tags(tags)
        } else {
            metric
        };

        let evicted = self.buffer.add([metric]);
        observability::record_metrics_dropped(&self.name, BUFFER_PRIMARY, evicted);
        self.stats.inc_metrics_added();

        if self.buffer.len() == self.batch_size {
            let batch = self.buffer.batch(self.batch_size);
            if let Err(e) = self.write_batch(&batch).await {
                warn!(
                    output = %self.name,
                    count = batch.len(),
                    error = %e,
                    "Full batch write failed, moving to fail buffer"
                );
                self.requeue(batch);
            }
        }
    }

    /// Write all cached metrics to the sink
    ///
    /// First retries the fail buffer, batch by batch, re-queueing every
    /// batch that fails again; those failures are not reported. Then sends
    /// one batch from the primary buffer and reports its outcome.
    #[instrument(name = "running_output_write", skip(self), fields(output = %self.name))]
    pub async fn write(&self) -> Result<(), OutputError> {
        if !self.fail_buffer.is_empty() {
            let fail_len = self.fail_buffer.len();
            // One extra batch covers the remainder; it is empty when
            // fail_len is a multiple of batch_size.
            let n_batches = fail_len / self.batch_size + 1;
            debug!(
                output = %self.name,
                pending = fail_len,
                batches = n_batches,
                "Retrying failed metrics"
            );

            for i in 0..n_batches {
                let size = if i == n_batches - 1 {
                    fail_len % self.batch_size
                } else {
                    self.batch_size
                };
                let batch = self.fail_buffer.batch(size);
                if let Err(e) = self.write_batch(&batch).await {
                    debug!(output = %self.name, error = %e, "Retry failed, re-queueing");
                    self.requeue(batch);
                }
            }
        }

        let batch = self.buffer.batch(self.batch_size);
        let result = self.write_batch(&batch).await;

        observability::record_buffer_len(&self.name, BUFFER_PRIMARY, self.buffer.len());
        match result {
            Ok(()) => {
                observability::record_buffer_len(&self.name, BUFFER_FAIL, self.fail_buffer.len());
                Ok(())
            }
            Err(e) => {
                self.requeue(batch);
                observability::record_buffer_len(&self.name, BUFFER_FAIL, self.fail_buffer.len());
                Err(e.into())
            }
        }
    }

    /// Close the underlying sink
    pub async fn close(&self) -> Result<(), OutputError> {
        self.sink.lock().await.close().await?;
        Ok(())
    }

    /// Send one batch; empty batches succeed without touching the sink.
    /// Never mutates the buffers.
    async fn write_batch(&self, batch: &[Metric]) -> Result<(), ContractError> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut sink = self.sink.lock().await;
        let start = Instant::now();
        let result = sink.write(batch).await;
        let elapsed = start.elapsed();
        drop(sink);

        match result {
            Ok(()) => {
                self.stats.record_write(batch.len(), elapsed);
                observability::record_batch_written(&self.name, batch.len(), elapsed);
                if !self.quiet {
                    info!(
                        output = %self.name,
                        count = batch.len(),
                        elapsed = ?elapsed,
                        "Wrote metrics to output"
                    );
                }
                Ok(())
            }
            Err(e) => {
                self.stats.inc_write_failures();
                observability::record_write_failure(&self.name);
                Err(e)
            }
        }
    }

    fn requeue(&self, batch: Vec<Metric>) {
        let evicted = self.fail_buffer.add(batch);
        if evicted > 0 {
            warn!(
                output = %self.name,
                dropped = evicted,
                limit = self.buffer_limit,
                "Fail buffer full, oldest metrics dropped"
            );
        }
        observability::record_metrics_dropped(&self.name, BUFFER_FAIL, evicted);
    }
}
