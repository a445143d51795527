//! Sink implementations
//!
//! Contains LogSink, FileSink and NetworkSink, plus `ConfiguredSink`, the
//! config-driven union of the three.

mod file;
mod log;
mod network;

pub use self::file::{FileSink, FileSinkConfig};
pub use self::log::LogSink;
pub use self::network::{encode_line_protocol, NetworkFormat, NetworkSink, NetworkSinkConfig};

use contracts::{ContractError, Metric, MetricSink, OutputConfig, SinkType};
use tracing::instrument;

use crate::error::OutputError;

/// Sink selected by `OutputConfig::sink_type`
///
/// `MetricSink` has async methods and is not object safe, so configured
/// outputs dispatch through this enum instead of a trait object.
pub enum ConfiguredSink {
    Log(LogSink),
    File(FileSink),
    Network(NetworkSink),
}

impl ConfiguredSink {
    /// Create the sink described by `config`
    #[instrument(
        name = "configured_sink_create",
        skip(config),
        fields(sink = %config.name, sink_type = ?config.sink_type)
    )]
    pub async fn from_config(config: &OutputConfig) -> Result<Self, OutputError> {
        let sink = match config.sink_type {
            SinkType::Log => Self::Log(LogSink::new(&config.name)),
            SinkType::File => Self::File(
                FileSink::from_params(&config.name, &config.params)
                    .map_err(|e| OutputError::sink_creation(&config.name, e.to_string()))?,
            ),
            SinkType::Network => Self::Network(
                NetworkSink::from_params(&config.name, &config.params)
                    .await
                    .map_err(|e| OutputError::sink_creation(&config.name, e.to_string()))?,
            ),
        };
        Ok(sink)
    }
}

impl MetricSink for ConfiguredSink {
    fn name(&self) -> &str {
        match self {
            Self::Log(s) => s.name(),
            Self::File(s) => s.name(),
            Self::Network(s) => s.name(),
        }
    }

    async fn write(&mut self, batch: &[Metric]) -> Result<(), ContractError> {
        match self {
            Self::Log(s) => s.write(batch).await,
            Self::File(s) => s.write(batch).await,
            Self::Network(s) => s.write(batch).await,
        }
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        match self {
            Self::Log(s) => s.close().await,
            Self::File(s) => s.close().await,
            Self::Network(s) => s.close().await,
        }
    }
}
