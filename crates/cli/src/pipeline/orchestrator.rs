//! Relay orchestrator - wires the metric input to the outputs.

use std::future::Future;
use std::time::Instant;

use contracts::AgentConfig;
use outputs::create_agent;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::input::{forward_metrics, InputSource};
use super::RelayStats;
use crate::error::{CliError, Result};

/// Relay configuration
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Agent and output configuration
    pub agent: AgentConfig,

    /// Metric input
    pub input: InputSource,

    /// Channel capacity between input and outputs
    pub channel_capacity: usize,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main relay orchestrator
pub struct Relay {
    config: RelayConfig,
}

impl Relay {
    /// Create a new relay with the given configuration
    pub fn new(config: RelayConfig) -> Self {
        Self { config }
    }

    /// Run until the input ends or `shutdown` resolves
    ///
    /// In both cases the outputs get a final flush before this returns.
    pub async fn run<F>(self, shutdown: F) -> Result<RelayStats>
    where
        F: Future<Output = ()>,
    {
        let start_time = Instant::now();
        let RelayConfig {
            agent,
            input,
            channel_capacity,
            metrics_port,
        } = self.config;

        if let Some(port) = metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let reader = input.open().await?;

        let (tx, rx) = mpsc::channel(channel_capacity.max(1));
        let agent = create_agent(agent, rx).await?;
        let agent_handle = agent.spawn();

        let cancel = CancellationToken::new();
        let mut forward = tokio::spawn(forward_metrics(reader, tx, cancel.clone()));

        info!(input = %input.describe(), "Relay started");

        let mut interrupted = false;
        let forwarded = tokio::select! {
            result = &mut forward => result,
            _ = shutdown => {
                warn!("Received shutdown signal, stopping input");
                interrupted = true;
                cancel.cancel();
                (&mut forward).await
            }
        };

        // The input task owned the sender; the agent drains and closes now
        let outputs = agent_handle
            .await
            .map_err(|e| CliError::relay_execution(format!("agent task failed: {e}")))?;

        let input_stats = match forwarded {
            Ok(Ok(stats)) => stats,
            Ok(Err(e)) => {
                error!(input = %input.describe(), error = %e, "Input read failed");
                return Err(CliError::input(input.describe(), e));
            }
            Err(e) => {
                return Err(CliError::relay_execution(format!("input task failed: {e}")));
            }
        };

        Ok(RelayStats {
            input: input_stats,
            outputs,
            duration: start_time.elapsed(),
            interrupted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{OutputConfig, SinkType};
    use std::io::Write;

    fn relay_config(input: InputSource, output_path: &std::path::Path) -> RelayConfig {
        let mut output = OutputConfig::new("archive", SinkType::File);
        output
            .params
            .insert("path".into(), output_path.display().to_string());
        output.filter.namedrop = vec!["debug_*".into()];

        RelayConfig {
            agent: AgentConfig {
                outputs: vec![output],
                ..Default::default()
            },
            input,
            channel_capacity: 4,
            metrics_port: None,
        }
    }

    #[tokio::test]
    async fn test_relay_runs_until_end_of_input() {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("in.jsonl");
        let output_path = dir.path().join("out.jsonl");

        let mut file = std::fs::File::create(&input_path).unwrap();
        for i in 0..5 {
            writeln!(file, r#"{{"name":"cpu","fields":{{"v":{i}}}}}"#).unwrap();
        }
        writeln!(file, r#"{{"name":"debug_cpu","fields":{{"v":0}}}}"#).unwrap();
        drop(file);

        let relay = Relay::new(relay_config(InputSource::File(input_path), &output_path));
        let stats = relay.run(std::future::pending()).await.unwrap();

        assert!(!stats.interrupted);
        assert_eq!(stats.input.metrics_accepted, 6);
        assert_eq!(stats.total_written(), 5);
        assert_eq!(stats.outputs[0].1.metrics_filtered, 1);

        let written = std::fs::read_to_string(&output_path).unwrap();
        assert_eq!(written.lines().count(), 5);
    }

    #[tokio::test]
    async fn test_relay_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let relay = Relay::new(relay_config(
            InputSource::File(dir.path().join("missing.jsonl")),
            &dir.path().join("out.jsonl"),
        ));
        let result = relay.run(std::future::pending()).await;
        assert!(matches!(result, Err(CliError::Input { .. })));
    }
}
