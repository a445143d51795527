//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::AgentConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    flush_interval_ms: u64,
    metric_batch_size: usize,
    metric_buffer_limit: usize,
    output_count: usize,
    filtered_output_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            let filtered_output_count = config
                .outputs
                .iter()
                .filter(|o| o.filter != Default::default())
                .count();

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    flush_interval_ms: config.agent.flush_interval_ms,
                    metric_batch_size: config.agent.metric_batch_size,
                    metric_buffer_limit: config.agent.metric_buffer_limit,
                    output_count: config.outputs.len(),
                    filtered_output_count,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &AgentConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.outputs.is_empty() {
        warnings.push("No outputs configured - metrics will be discarded".to_string());
    }

    for output in &config.outputs {
        let batch_size = output.batch_size(&config.agent);
        let buffer_limit = output.buffer_limit(&config.agent);
        if buffer_limit % batch_size != 0 {
            warnings.push(format!(
                "Output '{}': metric_buffer_limit ({}) is not a multiple of metric_batch_size ({})",
                output.name, buffer_limit, batch_size
            ));
        }
        if !output.filter.namepass.is_empty() && !output.filter.namedrop.is_empty() {
            warnings.push(format!(
                "Output '{}': both namepass and namedrop are set, namedrop is applied to passed names only",
                output.name
            ));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Flush interval: {} ms", summary.flush_interval_ms);
            println!("  Batch size: {}", summary.metric_batch_size);
            println!("  Buffer limit: {}", summary.metric_buffer_limit);
            println!(
                "  Outputs: {} ({} filtered)",
                summary.output_count, summary.filtered_output_count
            );
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
