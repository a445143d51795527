//! `run` command implementation.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{InputSource, Relay, RelayConfig};

/// Execute the `run` command
pub async fn run_relay(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let mut config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(interval) = args.flush_interval_ms {
        if interval == 0 {
            anyhow::bail!("--flush-interval-ms must be > 0");
        }
        info!(flush_interval_ms = interval, "Overriding flush interval from CLI");
        config.agent.flush_interval_ms = interval;
    }

    info!(
        outputs = config.outputs.len(),
        flush_interval_ms = config.agent.flush_interval_ms,
        metric_batch_size = config.agent.metric_batch_size,
        metric_buffer_limit = config.agent.metric_buffer_limit,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    if config.outputs.is_empty() {
        warn!("No outputs configured - metrics will be discarded");
    }

    let relay = Relay::new(RelayConfig {
        agent: config,
        input: InputSource::from_arg(&args.input),
        channel_capacity: args.channel_capacity,
        metrics_port: (args.metrics_port != 0).then_some(args.metrics_port),
    });

    info!("Starting relay...");

    let stats = relay
        .run(shutdown_signal())
        .await
        .context("Relay execution failed")?;

    info!(
        metrics_accepted = stats.input.metrics_accepted,
        metrics_written = stats.total_written(),
        metrics_dropped = stats.total_dropped(),
        duration_secs = stats.duration.as_secs_f64(),
        "Relay completed"
    );
    stats.print_summary();

    info!("Metric Relay finished");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &contracts::AgentConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Agent:");
    println!("  Flush interval: {} ms", config.agent.flush_interval_ms);
    println!("  Batch size: {}", config.agent.metric_batch_size);
    println!("  Buffer limit: {}", config.agent.metric_buffer_limit);
    println!("  Quiet: {}", config.agent.quiet);

    println!("\nOutputs ({}):", config.outputs.len());
    for output in &config.outputs {
        println!(
            "  - {} ({:?}) batch={} limit={}",
            output.name,
            output.sink_type,
            output.batch_size(&config.agent),
            output.buffer_limit(&config.agent)
        );
    }

    println!();
}
