//! NetworkSink - UDP datagram streaming
//!
//! Batches are encoded one metric per line and packed into datagrams no
//! larger than `max_packet_size`, splitting only on metric boundaries.

use contracts::{ContractError, FieldValue, Metric, MetricSink};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tracing::{debug, instrument, warn};

/// Serialization format for network transmission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetworkFormat {
    /// InfluxDB line protocol
    #[default]
    Line,
    /// JSON (one object per line)
    Json,
}

/// Configuration for NetworkSink
#[derive(Debug, Clone)]
pub struct NetworkSinkConfig {
    /// Target address
    pub addr: SocketAddr,
    /// Serialization format
    pub format: NetworkFormat,
    /// Max datagram size (UDP typically 65507 for IPv4)
    pub max_packet_size: usize,
}

impl NetworkSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, String> {
        let addr_str = params
            .get("addr")
            .ok_or_else(|| "missing 'addr' parameter".to_string())?;

        let addr: SocketAddr = addr_str
            .parse()
            .map_err(|e| format!("invalid address '{}': {}", addr_str, e))?;

        let format = match params.get("format").map(String::as_str) {
            Some("json") => NetworkFormat::Json,
            Some("line") | None => NetworkFormat::Line,
            Some(other) => return Err(format!("unknown format '{}'", other)),
        };

        let max_packet_size = params
            .get("max_packet_size")
            .and_then(|s| s.parse().ok())
            .unwrap_or(65000);

        Ok(Self {
            addr,
            format,
            max_packet_size,
        })
    }
}

/// Sink that sends metric batches over UDP
pub struct NetworkSink {
    name: String,
    config: NetworkSinkConfig,
    socket: Option<UdpSocket>,
}

impl NetworkSink {
    /// Create a new NetworkSink
    #[instrument(name = "network_sink_new", skip(name, config))]
    pub async fn new(name: impl Into<String>, config: NetworkSinkConfig) -> std::io::Result<Self> {
        let name = name.into();
        let bind_addr = if config.addr.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };
        let socket = UdpSocket::bind(bind_addr).await?;
        socket.connect(&config.addr).await?;

        debug!(
            sink = %name,
            target = %config.addr,
            "NetworkSink connected"
        );

        Ok(Self {
            name,
            config,
            socket: Some(socket),
        })
    }

    /// Create from params (for factory)
    #[instrument(name = "network_sink_from_params", skip(name, params))]
    pub async fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, ContractError> {
        let name = name.into();
        let config = NetworkSinkConfig::from_params(params)
            .map_err(|e| ContractError::sink_connection(&name, e))?;

        Self::new(&name, config)
            .await
            .map_err(|e| ContractError::sink_connection(&name, e.to_string()))
    }

    fn socket(&self) -> Result<&UdpSocket, ContractError> {
        self.socket
            .as_ref()
            .ok_or_else(|| ContractError::sink_write(&self.name, "socket not connected"))
    }

    fn encode(&self, metric: &Metric) -> Result<String, ContractError> {
        match self.config.format {
            NetworkFormat::Line => Ok(encode_line_protocol(metric)),
            NetworkFormat::Json => serde_json::to_string(metric)
                .map_err(|e| ContractError::sink_write(&self.name, format!("json error: {e}"))),
        }
    }

    /// Pack encoded metrics into datagrams
    fn prepare_payloads(&self, batch: &[Metric]) -> Result<Vec<Vec<u8>>, ContractError> {
        let max = self.config.max_packet_size;
        let mut packets = Vec::new();
        let mut current = Vec::with_capacity(max.min(65000));

        for metric in batch {
            let mut line = self.encode(metric)?;
            line.push('\n');

            if line.len() > max {
                warn!(
                    sink = %self.name,
                    metric = metric.name(),
                    size = line.len(),
                    max,
                    "Metric larger than max packet size, sent alone"
                );
            }
            if !current.is_empty() && current.len() + line.len() > max {
                packets.push(std::mem::take(&mut current));
            }
            current.extend_from_slice(line.as_bytes());
        }
        if !current.is_empty() {
            packets.push(current);
        }

        Ok(packets)
    }

    async fn transmit(&self, socket: &UdpSocket, data: &[u8]) -> Result<(), ContractError> {
        let sent = socket
            .send(data)
            .await
            .map_err(|e| ContractError::sink_write(&self.name, format!("udp send failed: {e}")))?;
        debug!(sink = %self.name, bytes = sent, "Sent");
        Ok(())
    }
}

impl MetricSink for NetworkSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "network_sink_write",
        skip(self, batch),
        fields(sink = %self.name, metrics = batch.len())
    )]
    async fn write(&mut self, batch: &[Metric]) -> Result<(), ContractError> {
        let socket = self.socket()?;
        for packet in self.prepare_payloads(batch)? {
            self.transmit(socket, &packet).await?;
        }
        Ok(())
    }

    #[instrument(name = "network_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.socket = None;
        debug!(sink = %self.name, "NetworkSink closed");
        Ok(())
    }
}

/// Encode a metric as one InfluxDB line protocol line (no newline)
pub fn encode_line_protocol(metric: &Metric) -> String {
    let mut line = escape(metric.name(), &[',', ' ']);

    for (key, value) in metric.tags() {
        let _ = write!(
            line,
            ",{}={}",
            escape(key, &[',', '=', ' ']),
            escape(value, &[',', '=', ' '])
        );
    }

    let fields: Vec<String> = metric
        .fields()
        .iter()
        .map(|(key, value)| {
            let value = match value {
                FieldValue::Integer(v) => format!("{v}i"),
                FieldValue::Float(v) => format!("{v}"),
                FieldValue::Boolean(v) => format!("{v}"),
                FieldValue::String(v) => format!("\"{}\"", escape(v, &['"', '\\'])),
            };
            format!("{}={}", escape(key, &[',', '=', ' ']), value)
        })
        .collect();
    line.push(' ');
    line.push_str(&fields.join(","));

    if let Some(nanos) = metric.timestamp().timestamp_nanos_opt() {
        let _ = write!(line, " {nanos}");
    }
    line
}

/// Backslash-escape `special`; line breaks are always escaped so one
/// metric stays on one line
fn escape(s: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c if special.contains(&c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}
