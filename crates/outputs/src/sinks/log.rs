//! LogSink - logs batch summaries via tracing

use contracts::{ContractError, Metric, MetricSink};
use tracing::{debug, info, instrument};

/// Sink that logs metric batches for debugging
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_batch_summary(&self, batch: &[Metric]) {
        let first = batch.first().map(|m| m.timestamp());
        let last = batch.last().map(|m| m.timestamp());

        info!(
            sink = %self.name,
            metrics = batch.len(),
            first = ?first,
            last = ?last,
            "Metric batch received"
        );

        for metric in batch {
            debug!(
                sink = %self.name,
                metric = metric.name(),
                tags = ?metric.tags(),
                fields = ?metric.fields(),
                timestamp = %metric.timestamp(),
                "Metric"
            );
        }
    }
}

impl MetricSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, batch),
        fields(sink = %self.name, metrics = batch.len())
    )]
    async fn write(&mut self, batch: &[Metric]) -> Result<(), ContractError> {
        self.log_batch_summary(batch);
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use contracts::{FieldValue, Fields, Tags};

    #[tokio::test]
    async fn test_log_sink_write() {
        let mut sink = LogSink::new("test_log");
        let metric = Metric::new(
            "cpu",
            Tags::new(),
            Fields::from([("usage".to_string(), FieldValue::Float(12.5))]),
            Utc::now(),
        )
        .unwrap();

        assert!(sink.write(&[metric]).await.is_ok());
        assert!(sink.write(&[]).await.is_ok());
    }

    #[tokio::test]
    async fn test_log_sink_name() {
        let sink = LogSink::new("my_logger");
        assert_eq!(sink.name(), "my_logger");
    }
}
