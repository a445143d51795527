//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Metric Relay - buffered, retrying metric delivery to configured outputs
#[derive(Parser, Debug)]
#[command(
    name = "metric-relay",
    author,
    version,
    about = "Buffered metric relay with batching and retry",
    long_about = "Reads metrics as JSON lines, filters them per output, batches them \n\
                  and writes them to the configured sinks. Failed batches are kept \n\
                  in a bounded fail buffer and retried on the next flush."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "METRIC_RELAY_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "METRIC_RELAY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the relay, reading metrics until end of input or a signal
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "relay.toml",
        env = "METRIC_RELAY_CONFIG"
    )]
    pub config: PathBuf,

    /// JSON-lines metric input ("-" = stdin)
    #[arg(short, long, default_value = "-", env = "METRIC_RELAY_INPUT")]
    pub input: PathBuf,

    /// Override the agent flush interval (milliseconds)
    #[arg(long, env = "METRIC_RELAY_FLUSH_INTERVAL_MS")]
    pub flush_interval_ms: Option<u64>,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Capacity of the channel between input and outputs
    #[arg(long, default_value = "1000", env = "METRIC_RELAY_CHANNEL_CAPACITY")]
    pub channel_capacity: usize,

    /// Metrics server port (0 = disabled)
    #[arg(
        long,
        default_value_t = observability::DEFAULT_METRICS_PORT,
        env = "METRIC_RELAY_METRICS_PORT"
    )]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "relay.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "relay.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show per-output filters and parameters
    #[arg(long)]
    pub outputs: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
