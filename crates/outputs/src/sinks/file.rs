//! FileSink - appends metrics to a JSON lines file

use contracts::{ContractError, Metric, MetricSink};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, error, instrument};

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Output file, created if missing and appended to otherwise
    pub path: PathBuf,
}

impl FileSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, String> {
        let path = params
            .get("path")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| "missing 'path' parameter".to_string())?;

        Ok(Self { path })
    }
}

/// Sink that writes one JSON object per metric
pub struct FileSink {
    name: String,
    config: FileSinkConfig,
    writer: Option<BufWriter<File>>,
}

impl FileSink {
    /// Create a new FileSink, opening the file for append
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.path)?;

        Ok(Self {
            name: name.into(),
            config,
            writer: Some(BufWriter::new(file)),
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, ContractError> {
        let name = name.into();
        let config = FileSinkConfig::from_params(params)
            .map_err(|e| ContractError::sink_connection(&name, e))?;
        Self::new(&name, config).map_err(|e| ContractError::sink_connection(&name, e.to_string()))
    }

    fn write_batch_to_disk(&mut self, batch: &[Metric]) -> std::io::Result<()> {
        let writer = self.writer.as_mut().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotConnected, "file sink closed")
        })?;

        for metric in batch {
            serde_json::to_writer(&mut *writer, metric)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            writer.write_all(b"\n")?;
        }
        writer.flush()
    }

    fn persist_batch(&mut self, batch: &[Metric]) -> Result<(), ContractError> {
        self.write_batch_to_disk(batch).map_err(|e| {
            error!(
                sink = %self.name,
                path = %self.config.path.display(),
                error = %e,
                "Write failed"
            );
            ContractError::sink_write(&self.name, e.to_string())
        })
    }
}

impl MetricSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write",
        skip(self, batch),
        fields(sink = %self.name, metrics = batch.len())
    )]
    async fn write(&mut self, batch: &[Metric]) -> Result<(), ContractError> {
        self.persist_batch(batch)
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        debug!(sink = %self.name, "FileSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use contracts::{FieldValue, Fields, Tags};
    use tempfile::tempdir;

    fn metric(name: &str) -> Metric {
        Metric::new(
            name,
            Tags::from([("host".to_string(), "h1".to_string())]),
            Fields::from([("value".to_string(), FieldValue::Integer(7))]),
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_file_sink_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("metrics.jsonl");
        let config = FileSinkConfig { path: path.clone() };

        let mut sink = FileSink::new("test_file", config).unwrap();
        sink.write(&[metric("cpu"), metric("mem")]).await.unwrap();
        sink.write(&[metric("disk")]).await.unwrap();
        sink.close().await.unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);

        let decoded: Metric = serde_json::from_str(lines[2]).unwrap();
        assert_eq!(decoded.name(), "disk");
        assert_eq!(decoded.tags()["host"], "h1");
    }

    #[tokio::test]
    async fn test_file_sink_write_after_close_fails() {
        let dir = tempdir().unwrap();
        let config = FileSinkConfig {
            path: dir.path().join("metrics.jsonl"),
        };

        let mut sink = FileSink::new("test_file", config).unwrap();
        sink.close().await.unwrap();

        let err = sink.write(&[metric("cpu")]).await.unwrap_err();
        assert!(matches!(err, ContractError::SinkWrite { .. }));
    }

    #[test]
    fn test_file_sink_requires_path() {
        assert!(FileSinkConfig::from_params(&HashMap::new()).is_err());
        assert!(FileSink::from_params("f", &HashMap::new()).is_err());
    }
}
