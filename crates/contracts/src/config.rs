//! AgentConfig - Config Loader output
//!
//! Describes the agent-wide settings and the list of configured outputs.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default number of metrics per batch
pub const DEFAULT_METRIC_BATCH_SIZE: usize = 1000;

/// Default number of metrics kept in the fail buffer.
/// It should be a multiple of the batch size.
pub const DEFAULT_METRIC_BUFFER_LIMIT: usize = 10000;

/// Default flush interval in milliseconds
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 10_000;

/// Full agent configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Agent-wide settings
    #[serde(default)]
    pub agent: AgentSettings,

    /// Output definitions
    #[serde(default)]
    pub outputs: Vec<OutputConfig>,
}

/// Agent-wide settings, also used as defaults for outputs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Period of the explicit flush
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,

    /// Batch size inherited by outputs without their own
    #[serde(default = "default_metric_batch_size")]
    pub metric_batch_size: usize,

    /// Buffer limit inherited by outputs without their own
    #[serde(default = "default_metric_buffer_limit")]
    pub metric_buffer_limit: usize,

    /// Suppress per-write logging
    #[serde(default)]
    pub quiet: bool,
}

fn default_flush_interval_ms() -> u64 {
    DEFAULT_FLUSH_INTERVAL_MS
}

fn default_metric_batch_size() -> usize {
    DEFAULT_METRIC_BATCH_SIZE
}

fn default_metric_buffer_limit() -> usize {
    DEFAULT_METRIC_BUFFER_LIMIT
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            flush_interval_ms: DEFAULT_FLUSH_INTERVAL_MS,
            metric_batch_size: DEFAULT_METRIC_BATCH_SIZE,
            metric_buffer_limit: DEFAULT_METRIC_BUFFER_LIMIT,
            quiet: false,
        }
    }
}

/// A single configured output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output name (used in logs and metrics)
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Batch size override (0 / missing = inherit)
    #[serde(default)]
    pub metric_batch_size: usize,

    /// Buffer limit override (0 / missing = inherit)
    #[serde(default)]
    pub metric_buffer_limit: usize,

    /// Filter rules
    #[serde(flatten)]
    pub filter: FilterConfig,

    /// Type specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl OutputConfig {
    /// Create an output config with no filter and no overrides
    pub fn new(name: impl Into<String>, sink_type: SinkType) -> Self {
        Self {
            name: name.into(),
            sink_type,
            metric_batch_size: 0,
            metric_buffer_limit: 0,
            filter: FilterConfig::default(),
            params: HashMap::new(),
        }
    }

    /// Effective batch size: own value, then agent value, then default
    pub fn batch_size(&self, agent: &AgentSettings) -> usize {
        first_non_zero(
            self.metric_batch_size,
            agent.metric_batch_size,
            DEFAULT_METRIC_BATCH_SIZE,
        )
    }

    /// Effective buffer limit: own value, then agent value, then default
    pub fn buffer_limit(&self, agent: &AgentSettings) -> usize {
        first_non_zero(
            self.metric_buffer_limit,
            agent.metric_buffer_limit,
            DEFAULT_METRIC_BUFFER_LIMIT,
        )
    }
}

fn first_non_zero(own: usize, inherited: usize, default: usize) -> usize {
    [own, inherited]
        .into_iter()
        .find(|v| *v != 0)
        .unwrap_or(default)
}

/// Per-output metric filter rules (glob patterns)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Metric names allowed through
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub namepass: Vec<String>,

    /// Metric names rejected
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub namedrop: Vec<String>,

    /// Tag key -> value patterns; a metric passes if any matches
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub tagpass: HashMap<String, Vec<String>>,

    /// Tag key -> value patterns; a metric is rejected if any matches
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub tagdrop: HashMap<String, Vec<String>>,

    /// Tag keys to keep
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub taginclude: Vec<String>,

    /// Tag keys to remove
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tagexclude: Vec<String>,
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Log output
    Log,
    /// JSON lines file
    File,
    /// UDP datagrams
    Network,
}
