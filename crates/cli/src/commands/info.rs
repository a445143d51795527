//! `info` command implementation.

use std::collections::HashMap;

use anyhow::{Context, Result};
use contracts::{AgentConfig, FilterConfig, OutputConfig};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    agent: AgentInfo,
    outputs: Vec<OutputInfo>,
}

#[derive(Serialize)]
struct AgentInfo {
    flush_interval_ms: u64,
    metric_batch_size: usize,
    metric_buffer_limit: usize,
    quiet: bool,
}

#[derive(Serialize)]
struct OutputInfo {
    name: String,
    sink_type: String,
    metric_batch_size: usize,
    metric_buffer_limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<FilterConfig>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    params: HashMap<String, String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&config, args.outputs);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&config, args.outputs);
    }

    Ok(())
}

fn build_config_info(config: &AgentConfig, detailed: bool) -> ConfigInfo {
    let outputs = config
        .outputs
        .iter()
        .map(|o| OutputInfo {
            name: o.name.clone(),
            sink_type: format!("{:?}", o.sink_type),
            metric_batch_size: o.batch_size(&config.agent),
            metric_buffer_limit: o.buffer_limit(&config.agent),
            filter: detailed.then(|| o.filter.clone()),
            params: if detailed {
                o.params.clone()
            } else {
                HashMap::new()
            },
        })
        .collect();

    ConfigInfo {
        agent: AgentInfo {
            flush_interval_ms: config.agent.flush_interval_ms,
            metric_batch_size: config.agent.metric_batch_size,
            metric_buffer_limit: config.agent.metric_buffer_limit,
            quiet: config.agent.quiet,
        },
        outputs,
    }
}

fn print_config_info(config: &AgentConfig, detailed: bool) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Metric Relay Configuration                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let agent = &config.agent;
    println!("⚙️  Agent");
    println!("   ├─ Flush interval: {} ms", agent.flush_interval_ms);
    println!("   ├─ Batch size: {}", agent.metric_batch_size);
    println!("   ├─ Buffer limit: {}", agent.metric_buffer_limit);
    println!("   └─ Quiet: {}", agent.quiet);

    println!("\n📤 Outputs ({})", config.outputs.len());
    for (i, output) in config.outputs.iter().enumerate() {
        let is_last = i == config.outputs.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        println!(
            "   {} {} ({:?}) batch={} limit={}",
            prefix,
            output.name,
            output.sink_type,
            output.batch_size(agent),
            output.buffer_limit(agent)
        );

        if detailed {
            for line in describe_output(output) {
                println!("   {}  • {}", child_prefix, line);
            }
        }
    }

    println!();
}

/// One line per configured filter rule or parameter
fn describe_output(output: &OutputConfig) -> Vec<String> {
    let filter = &output.filter;
    let mut lines = Vec::new();

    let lists = [
        ("namepass", &filter.namepass),
        ("namedrop", &filter.namedrop),
        ("taginclude", &filter.taginclude),
        ("tagexclude", &filter.tagexclude),
    ];
    for (label, patterns) in lists {
        if !patterns.is_empty() {
            lines.push(format!("{}: {:?}", label, patterns));
        }
    }

    let tables = [("tagpass", &filter.tagpass), ("tagdrop", &filter.tagdrop)];
    for (label, table) in tables {
        let mut keys: Vec<_> = table.iter().collect();
        keys.sort();
        for (key, patterns) in keys {
            lines.push(format!("{}.{}: {:?}", label, key, patterns));
        }
    }

    let mut params: Vec<_> = output.params.iter().collect();
    params.sort();
    for (key, value) in params {
        lines.push(format!("param {} = {}", key, value));
    }

    lines
}
