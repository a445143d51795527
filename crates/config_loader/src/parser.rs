//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON (可选) 格式。

use std::path::Path;

use contracts::{AgentConfig, ContractError};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式 (大小写不敏感)
    pub fn from_extension(ext: &str) -> Option<Self> {
        if ext.eq_ignore_ascii_case("toml") {
            Some(Self::Toml)
        } else if ext.eq_ignore_ascii_case("json") {
            Some(Self::Json)
        } else {
            None
        }
    }

    /// 从文件路径推断格式
    pub fn from_path(path: &Path) -> Result<Self, ContractError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ContractError::config_parse("config file has no extension"))?;
        Self::from_extension(ext)
            .ok_or_else(|| ContractError::config_parse(format!("unsupported config format: .{ext}")))
    }

    fn label(self) -> &'static str {
        match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
        }
    }
}

/// 根据格式解析配置 (不做校验)
pub fn parse(content: &str, format: ConfigFormat) -> Result<AgentConfig, ContractError> {
    let decoded = match format {
        ConfigFormat::Toml => toml::from_str(content).map_err(into_source),
        ConfigFormat::Json => serde_json::from_str(content).map_err(into_source),
    };
    decoded.map_err(|source| ContractError::ConfigParse {
        message: format!("{} parse error: {source}", format.label()),
        source: Some(source),
    })
}

fn into_source<E>(e: E) -> Box<dyn std::error::Error + Send + Sync>
where
    E: std::error::Error + Send + Sync + 'static,
{
    Box::new(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SinkType;

    #[test]
    fn test_parse_toml_minimal() {
        let content = r#"
[agent]
flush_interval_ms = 5000
metric_batch_size = 500

[[outputs]]
name = "stdout"
sink_type = "log"
"#;
        let result = parse(content, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.agent.flush_interval_ms, 5000);
        assert_eq!(config.agent.metric_batch_size, 500);
        assert_eq!(config.agent.metric_buffer_limit, 10000);
        assert_eq!(config.outputs.len(), 1);
        assert_eq!(config.outputs[0].sink_type, SinkType::Log);
    }

    #[test]
    fn test_parse_toml_filters_and_params() {
        let content = r#"
[[outputs]]
name = "archive"
sink_type = "file"
metric_batch_size = 10
namepass = ["cpu*", "mem"]
tagexclude = ["secret"]

[outputs.tagpass]
host = ["web-*"]

[outputs.params]
path = "/tmp/metrics.jsonl"
"#;
        let config = parse(content, ConfigFormat::Toml).unwrap();
        let output = &config.outputs[0];
        assert_eq!(output.metric_batch_size, 10);
        assert_eq!(output.metric_buffer_limit, 0);
        assert_eq!(output.filter.namepass, vec!["cpu*", "mem"]);
        assert_eq!(output.filter.tagpass["host"], vec!["web-*"]);
        assert_eq!(output.filter.tagexclude, vec!["secret"]);
        assert_eq!(output.params["path"], "/tmp/metrics.jsonl");
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "agent": { "quiet": true },
            "outputs": [
                { "name": "udp", "sink_type": "network", "params": { "addr": "127.0.0.1:8094" } }
            ]
        }"#;
        let result = parse(content, ConfigFormat::Json);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let config = result.unwrap();
        assert!(config.agent.quiet);
        assert_eq!(config.outputs[0].sink_type, SinkType::Network);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let content = "invalid toml [[[";
        let result = parse(content, ConfigFormat::Toml);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_parse_unknown_sink_type() {
        let content = r#"
[[outputs]]
name = "x"
sink_type = "kafka"
"#;
        assert!(matches!(
            parse(content, ConfigFormat::Toml),
            Err(ContractError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("conf/relay.JSON")).unwrap(),
            ConfigFormat::Json
        );
        let err = ConfigFormat::from_path(Path::new("relay")).unwrap_err();
        assert!(err.to_string().contains("no extension"));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
