//! Output statistics for observability

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use observability::{RunningStats, StatsSummary};
use parking_lot::Mutex;

/// Counters for a single output
#[derive(Debug, Default)]
pub struct OutputStats {
    /// Metrics accepted into the primary buffer
    metrics_added: AtomicU64,
    /// Metrics rejected by the filter
    metrics_filtered: AtomicU64,
    /// Successful non-empty batch writes
    batches_written: AtomicU64,
    /// Metrics delivered by successful writes
    metrics_written: AtomicU64,
    /// Failed batch writes
    write_failures: AtomicU64,
    /// Sink write latency in milliseconds
    write_latency_ms: Mutex<RunningStats>,
}

impl OutputStats {
    /// Create new stats instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metrics_added(&self) -> u64 {
        self.metrics_added.load(Ordering::Relaxed)
    }

    pub fn inc_metrics_added(&self) {
        self.metrics_added.fetch_add(1, Ordering::Relaxed);
    }

    pub fn metrics_filtered(&self) -> u64 {
        self.metrics_filtered.load(Ordering::Relaxed)
    }

    pub fn inc_metrics_filtered(&self) {
        self.metrics_filtered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn batches_written(&self) -> u64 {
        self.batches_written.load(Ordering::Relaxed)
    }

    pub fn metrics_written(&self) -> u64 {
        self.metrics_written.load(Ordering::Relaxed)
    }

    /// Record a successful batch write
    pub fn record_write(&self, count: usize, elapsed: Duration) {
        self.batches_written.fetch_add(1, Ordering::Relaxed);
        self.metrics_written
            .fetch_add(count as u64, Ordering::Relaxed);
        self.write_latency_ms
            .lock()
            .push(elapsed.as_secs_f64() * 1000.0);
    }

    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    pub fn inc_write_failures(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Latency summary of successful writes
    pub fn write_latency(&self) -> StatsSummary {
        self.write_latency_ms.lock().summary()
    }
}

/// Snapshot of output state (for reporting)
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsSnapshot {
    pub metrics_added: u64,
    pub metrics_filtered: u64,
    pub batches_written: u64,
    pub metrics_written: u64,
    pub write_failures: u64,
    pub buffer_len: usize,
    pub buffer_drops: u64,
    pub fail_buffer_len: usize,
    pub fail_buffer_drops: u64,
    pub write_latency_ms: StatsSummary,
}

impl StatsSnapshot {
    /// Total metrics lost to overflow, in either buffer
    pub fn total_dropped(&self) -> u64 {
        self.buffer_drops + self.fail_buffer_drops
    }

    /// Metrics currently held, pending delivery
    pub fn pending(&self) -> usize {
        self.buffer_len + self.fail_buffer_len
    }
}

impl std::fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Metrics added: {}", self.metrics_added)?;
        writeln!(f, "Metrics filtered: {}", self.metrics_filtered)?;
        writeln!(
            f,
            "Metrics written: {} ({} batches)",
            self.metrics_written, self.batches_written
        )?;
        writeln!(f, "Write failures: {}", self.write_failures)?;
        writeln!(
            f,
            "Pending: {} (buffer {}, fail buffer {})",
            self.pending(),
            self.buffer_len,
            self.fail_buffer_len
        )?;
        writeln!(
            f,
            "Dropped: {} (buffer {}, fail buffer {})",
            self.total_dropped(),
            self.buffer_drops,
            self.fail_buffer_drops
        )?;
        write!(f, "Write latency (ms): {}", self.write_latency_ms)
    }
}
