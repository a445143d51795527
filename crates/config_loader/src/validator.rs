//! 配置校验模块
//!
//! 校验规则：
//! - flush_interval_ms > 0
//! - output name 非空且唯一
//! - metric_buffer_limit >= metric_batch_size (不是整数倍时仅告警)
//! - 过滤规则中的 glob 模式可编译
//! - sink 必填参数齐全 (file: path, network: addr)

use std::collections::HashSet;
use std::net::SocketAddr;

use contracts::{AgentConfig, ContractError, OutputConfig, SinkType};
use tracing::warn;

/// 校验 AgentConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &AgentConfig) -> Result<(), ContractError> {
    validate_agent_settings(config)?;
    validate_output_names(config)?;
    for output in &config.outputs {
        validate_buffer_sizes(config, output)?;
        validate_filter_patterns(output)?;
        validate_sink_params(output)?;
    }
    Ok(())
}

/// 校验全局设置
fn validate_agent_settings(config: &AgentConfig) -> Result<(), ContractError> {
    if config.agent.flush_interval_ms == 0 {
        return Err(ContractError::config_validation(
            "agent.flush_interval_ms",
            "flush_interval_ms must be > 0",
        ));
    }
    Ok(())
}

/// 校验 output name 非空且唯一
fn validate_output_names(config: &AgentConfig) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, output) in config.outputs.iter().enumerate() {
        if output.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("outputs[{}].name", idx),
                "output name cannot be empty",
            ));
        }
        if !seen.insert(output.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("outputs[name={}]", output.name),
                "duplicate output name",
            ));
        }
    }
    Ok(())
}

/// 校验缓冲区大小 (使用继承后的实际值)
fn validate_buffer_sizes(config: &AgentConfig, output: &OutputConfig) -> Result<(), ContractError> {
    let batch_size = output.batch_size(&config.agent);
    let buffer_limit = output.buffer_limit(&config.agent);

    if buffer_limit < batch_size {
        return Err(ContractError::config_validation(
            format!("outputs[{}].metric_buffer_limit", output.name),
            format!(
                "metric_buffer_limit ({}) must be >= metric_batch_size ({})",
                buffer_limit, batch_size
            ),
        ));
    }

    if buffer_limit % batch_size != 0 {
        warn!(
            output = %output.name,
            batch_size,
            buffer_limit,
            "metric_buffer_limit is not a multiple of metric_batch_size"
        );
    }
    Ok(())
}

/// 校验 glob 模式
fn validate_filter_patterns(output: &OutputConfig) -> Result<(), ContractError> {
    let filter = &output.filter;
    let lists = [
        ("namepass", &filter.namepass),
        ("namedrop", &filter.namedrop),
        ("taginclude", &filter.taginclude),
        ("tagexclude", &filter.tagexclude),
    ];
    for (field, patterns) in lists {
        check_patterns(&output.name, field, patterns)?;
    }

    let tables = [("tagpass", &filter.tagpass), ("tagdrop", &filter.tagdrop)];
    for (field, table) in tables {
        for (key, patterns) in table {
            check_patterns(&output.name, &format!("{field}.{key}"), patterns)?;
        }
    }
    Ok(())
}

fn check_patterns(output: &str, field: &str, patterns: &[String]) -> Result<(), ContractError> {
    for pattern in patterns {
        if let Err(e) = glob::Pattern::new(pattern) {
            return Err(ContractError::config_validation(
                format!("outputs[{}].{}", output, field),
                format!("invalid pattern '{}': {}", pattern, e),
            ));
        }
    }
    Ok(())
}

/// 校验 sink 参数
fn validate_sink_params(output: &OutputConfig) -> Result<(), ContractError> {
    match output.sink_type {
        SinkType::Log => Ok(()),
        SinkType::File => match output.params.get("path") {
            Some(path) if !path.is_empty() => Ok(()),
            _ => Err(ContractError::config_validation(
                format!("outputs[{}].params.path", output.name),
                "file sink requires a 'path' parameter",
            )),
        },
        SinkType::Network => {
            let field = format!("outputs[{}].params", output.name);
            let addr = output.params.get("addr").ok_or_else(|| {
                ContractError::config_validation(
                    format!("{field}.addr"),
                    "network sink requires an 'addr' parameter",
                )
            })?;
            addr.parse::<SocketAddr>().map_err(|e| {
                ContractError::config_validation(
                    format!("{field}.addr"),
                    format!("invalid address '{}': {}", addr, e),
                )
            })?;
            match output.params.get("format").map(String::as_str) {
                None | Some("line") | Some("json") => Ok(()),
                Some(other) => Err(ContractError::config_validation(
                    format!("{field}.format"),
                    format!("unknown format '{}', expected 'line' or 'json'", other),
                )),
            }
        }
    }
}
