//! Output stage error types

use contracts::ContractError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    /// The configured sink could not be built
    #[error("failed to create sink for output '{output}': {message}")]
    SinkCreation { output: String, message: String },

    /// A filter glob does not compile
    #[error("invalid filter pattern '{pattern}' for output '{output}': {message}")]
    InvalidFilter {
        output: String,
        pattern: String,
        message: String,
    },

    /// Write or close failure reported by the sink
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl OutputError {
    pub fn sink_creation(output: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            output: output.into(),
            message: message.into(),
        }
    }

    pub fn invalid_filter(
        output: impl Into<String>,
        pattern: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidFilter {
            output: output.into(),
            pattern: pattern.into(),
            message: message.into(),
        }
    }
}
