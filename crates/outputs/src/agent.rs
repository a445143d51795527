//! Agent - fan-out of incoming metrics to every configured output

use std::sync::Arc;
use std::time::Duration;

use contracts::{AgentConfig, Metric, MetricSink};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::error::OutputError;
use crate::flusher::Flusher;
use crate::running_output::RunningOutput;
use crate::sinks::ConfiguredSink;
use crate::stats::StatsSnapshot;

/// Final per-output statistics, in configuration order
pub type AgentReport = Vec<(String, StatsSnapshot)>;

/// Builder for creating an Agent
pub struct AgentBuilder {
    config: AgentConfig,
    input_rx: mpsc::Receiver<Metric>,
}

impl AgentBuilder {
    /// Create a new AgentBuilder
    pub fn new(config: AgentConfig, input_rx: mpsc::Receiver<Metric>) -> Self {
        Self { config, input_rx }
    }

    /// Build every configured output
    #[instrument(name = "agent_builder_build", skip(self))]
    pub async fn build(self) -> Result<Agent<ConfiguredSink>, OutputError> {
        let outputs = Self::initialize_outputs(&self.config).await?;

        Ok(Agent {
            outputs,
            input_rx: self.input_rx,
            flush_interval: Duration::from_millis(self.config.agent.flush_interval_ms),
        })
    }

    #[instrument(
        name = "agent_initialize_outputs",
        skip(config),
        fields(output_count = config.outputs.len())
    )]
    async fn initialize_outputs(
        config: &AgentConfig,
    ) -> Result<Vec<Arc<RunningOutput<ConfiguredSink>>>, OutputError> {
        let mut outputs = Vec::with_capacity(config.outputs.len());
        for output_config in &config.outputs {
            let sink = ConfiguredSink::from_config(output_config).await?;
            let output = RunningOutput::from_config(output_config, &config.agent, sink)?;
            info!(
                output = %output.name(),
                batch_size = output.batch_size(),
                buffer_limit = output.buffer_limit(),
                "Output initialized"
            );
            outputs.push(Arc::new(output));
        }
        Ok(outputs)
    }
}

/// Feeds metrics into outputs and drives their periodic flush
pub struct Agent<S> {
    outputs: Vec<Arc<RunningOutput<S>>>,
    input_rx: mpsc::Receiver<Metric>,
    flush_interval: Duration,
}

impl<S: MetricSink + 'static> Agent<S> {
    /// Create an agent with custom outputs (for testing)
    pub fn with_outputs(
        outputs: Vec<Arc<RunningOutput<S>>>,
        flush_interval: Duration,
        input_rx: mpsc::Receiver<Metric>,
    ) -> Self {
        Self {
            outputs,
            input_rx,
            flush_interval,
        }
    }

    /// Shared handles to the outputs
    pub fn outputs(&self) -> &[Arc<RunningOutput<S>>] {
        &self.outputs
    }

    /// Get stats for all outputs
    pub fn stats(&self) -> AgentReport {
        Self::report(&self.outputs)
    }

    /// Run the agent main loop
    ///
    /// Consumes metrics from input and adds each one to every output.
    /// When the input channel closes, stops the flusher, performs a final
    /// flush, closes the sinks and returns the final stats.
    #[instrument(name = "agent_run", skip(self))]
    pub async fn run(mut self) -> AgentReport {
        info!(
            outputs = self.outputs.len(),
            flush_interval_ms = self.flush_interval.as_millis() as u64,
            "Agent started"
        );

        let cancel = CancellationToken::new();
        let flusher = Flusher::new(self.outputs.clone(), self.flush_interval).spawn(cancel.clone());

        let mut metric_count: u64 = 0;
        while let Some(metric) = self.input_rx.recv().await {
            metric_count += 1;
            self.dispatch_metric(metric).await;

            if metric_count.is_multiple_of(1000) {
                debug!(metrics = metric_count, "Agent progress");
            }
        }

        info!(metrics = metric_count, "Agent input closed, shutting down");

        cancel.cancel();
        if let Err(e) = flusher.await {
            error!(error = ?e, "Flusher task panicked");
        }

        Self::shutdown_outputs(&self.outputs).await;

        info!("Agent shutdown complete");
        Self::report(&self.outputs)
    }

    /// Spawn the agent as a background task
    pub fn spawn(self) -> JoinHandle<AgentReport> {
        tokio::spawn(async move { self.run().await })
    }

    async fn dispatch_metric(&self, metric: Metric) {
        if let Some((last, rest)) = self.outputs.split_last() {
            for output in rest {
                output.add_metric(metric.clone()).await;
            }
            last.add_metric(metric).await;
        }
    }

    async fn shutdown_outputs(outputs: &[Arc<RunningOutput<S>>]) {
        for output in outputs {
            if let Err(e) = output.write().await {
                warn!(
                    output = %output.name(),
                    error = %e,
                    lost = output.fail_buffer().len(),
                    "Final flush failed"
                );
            }
            if let Err(e) = output.close().await {
                error!(output = %output.name(), error = %e, "Close failed on shutdown");
            }
        }
    }

    fn report(outputs: &[Arc<RunningOutput<S>>]) -> AgentReport {
        outputs
            .iter()
            .map(|o| (o.name().to_string(), o.stats()))
            .collect()
    }
}

/// Convenience function to create an agent from configuration
#[instrument(name = "agent_create", skip(config, input_rx))]
pub async fn create_agent(
    config: AgentConfig,
    input_rx: mpsc::Receiver<Metric>,
) -> Result<Agent<ConfiguredSink>, OutputError> {
    AgentBuilder::new(config, input_rx).build().await
}
