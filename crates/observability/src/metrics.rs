//! 输出阶段指标收集模块
//!
//! 记录 RunningOutput 的写入、失败、丢弃与缓冲区深度指标。

use std::time::Duration;

use metrics::{counter, gauge, histogram};

/// Buffer label for the primary (batch) buffer
pub const BUFFER_PRIMARY: &str = "primary";

/// Buffer label for the fail (retry) buffer
pub const BUFFER_FAIL: &str = "fail";

/// 记录一次成功写入的批次
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_batch_written;
///
/// let start = Instant::now();
/// sink.write(&batch).await?;
/// record_batch_written("influx", batch.len(), start.elapsed());
/// ```
pub fn record_batch_written(output: &str, count: usize, elapsed: Duration) {
    counter!(
        "metric_relay_metrics_written_total",
        "output" => output.to_string()
    )
    .increment(count as u64);

    counter!(
        "metric_relay_batches_written_total",
        "output" => output.to_string()
    )
    .increment(1);

    histogram!(
        "metric_relay_write_duration_ms",
        "output" => output.to_string()
    )
    .record(elapsed.as_secs_f64() * 1000.0);
}

/// 记录一次写入失败
pub fn record_write_failure(output: &str) {
    counter!(
        "metric_relay_write_failures_total",
        "output" => output.to_string()
    )
    .increment(1);
}

/// 记录因缓冲区溢出而被驱逐的指标
pub fn record_metrics_dropped(output: &str, buffer: &'static str, count: u64) {
    if count == 0 {
        return;
    }
    counter!(
        "metric_relay_metrics_dropped_total",
        "output" => output.to_string(),
        "buffer" => buffer
    )
    .increment(count);
}

/// 记录被过滤器拒绝的指标
pub fn record_metrics_filtered(output: &str) {
    counter!(
        "metric_relay_metrics_filtered_total",
        "output" => output.to_string()
    )
    .increment(1);
}

/// 记录缓冲区深度
pub fn record_buffer_len(output: &str, buffer: &'static str, len: usize) {
    gauge!(
        "metric_relay_buffer_len",
        "output" => output.to_string(),
        "buffer" => buffer
    )
    .set(len as f64);
}

/// 统计摘要
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary::from(self)
    }
}
