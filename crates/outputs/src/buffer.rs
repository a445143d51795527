//! Bounded metric buffer with drop-oldest overflow.
//!
//! A `HeapRb` guarded by a single mutex. Evict-then-insert and
//! count-then-drain each run under one lock acquisition.
//! Insertion never waits for space and extraction never waits for data.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use contracts::Metric;
use parking_lot::Mutex;
use ringbuf::{traits::*, HeapRb};

/// Fixed-capacity, insertion-ordered metric buffer
pub struct MetricBuffer {
    inner: Mutex<HeapRb<Metric>>,
    capacity: usize,
    drops: AtomicU64,
}

impl fmt::Debug for MetricBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricBuffer")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("drops", &self.drops())
            .finish()
    }
}

impl MetricBuffer {
    /// Create a buffer holding at most `capacity` metrics (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(HeapRb::new(capacity)),
            capacity,
            drops: AtomicU64::new(0),
        }
    }

    /// Check if the buffer is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Get the number of metrics in the buffer
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.lock().occupied_len()
    }

    /// Maximum number of metrics held
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total metrics evicted by overflow since creation
    #[inline]
    pub fn drops(&self) -> u64 {
        self.drops.load(Ordering::Relaxed)
    }

    /// Append metrics at the tail, in call order
    ///
    /// If the buffer is full, overwrites the oldest metric. Each insertion
    /// evicts at most one element. Returns the number of evicted metrics.
    pub fn add<I>(&self, metrics: I) -> u64
    where
        I: IntoIterator<Item = Metric>,
    {
        let mut evicted = 0u64;
        {
            let mut rb = self.inner.lock();
            for metric in metrics {
                if rb.is_full() {
                    let _ = rb.try_pop();
                    evicted += 1;
                }
                let _ = rb.try_push(metric);
            }
        }

        if evicted > 0 {
            self.drops.fetch_add(evicted, Ordering::Relaxed);
        }
        evicted
    }

    /// Remove and return up to `batch_size` metrics from the head, oldest first
    pub fn batch(&self, batch_size: usize) -> Vec<Metric> {
        let mut rb = self.inner.lock();
        let n = rb.occupied_len().min(batch_size);

        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            match rb.try_pop() {
                Some(metric) => out.push(metric),
                None => break,
            }
        }
        out
    }
}
