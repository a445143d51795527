//! Error types shared across the relay
//!
//! Config errors stop startup; sink errors are recoverable and drive the
//! retry path; metric errors reject a single record.

use thiserror::Error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ContractError {
    /// The configuration text could not be decoded
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// The configuration decoded but breaks a rule
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    #[error("invalid metric '{name}': {reason}")]
    InvalidMetric { name: String, reason: String },

    /// A batch was not accepted; the caller keeps the metrics for retry
    #[error("sink '{sink}' write error: {message}")]
    SinkWrite { sink: String, message: String },

    /// A sink could not be created or connected
    #[error("sink '{sink}' connection error: {message}")]
    SinkConnection { sink: String, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invalid_metric(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidMetric {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn sink_write(sink: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink: sink.into(),
            message: message.into(),
        }
    }

    pub fn sink_connection(sink: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkConnection {
            sink: sink.into(),
            message: message.into(),
        }
    }
}
