//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 配置 -> Agent -> Sink 的端到端测试
//! - 失败缓冲区的重试与溢出行为

#[cfg(test)]
mod contract_tests {
    use chrono::{TimeZone, Utc};
    use contracts::{FieldValue, Fields, Metric, Tags};

    #[test]
    fn test_metric_json_shape() {
        let metric = Metric::new(
            "cpu",
            Tags::from([("host".to_string(), "a".to_string())]),
            Fields::from([
                ("idle".to_string(), FieldValue::Float(97.5)),
                ("cores".to_string(), FieldValue::Integer(8)),
            ]),
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        )
        .unwrap();

        let value = serde_json::to_value(&metric).unwrap();
        assert_eq!(value["name"], "cpu");
        assert_eq!(value["tags"]["host"], "a");
        assert_eq!(value["fields"]["cores"], 8);
        assert_eq!(value["fields"]["idle"], 97.5);
        assert_eq!(value["timestamp"], "2023-11-14T22:13:20Z");
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::net::UdpSocket as StdUdpSocket;
    use std::time::Duration;

    use chrono::Utc;
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{FieldValue, Fields, Metric, Tags};
    use outputs::create_agent;
    use tokio::net::UdpSocket;
    use tokio::sync::mpsc;

    fn metric(name: &str, host: &str, value: i64) -> Metric {
        Metric::new(
            name,
            Tags::from([
                ("host".to_string(), host.to_string()),
                ("region".to_string(), "eu".to_string()),
            ]),
            Fields::from([("value".to_string(), FieldValue::Integer(value))]),
            Utc::now(),
        )
        .unwrap()
    }

    /// End-to-end test: TOML config -> Agent -> FileSink
    ///
    /// 验证：
    /// 1. namepass / tagdrop 过滤生效
    /// 2. tagexclude 改写标签
    /// 3. 输入关闭后的最终 flush 写出剩余数据
    #[tokio::test]
    async fn test_e2e_config_to_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.jsonl");

        let toml = format!(
            r#"
[agent]
flush_interval_ms = 60000
metric_batch_size = 3
metric_buffer_limit = 30
quiet = true

[[outputs]]
name = "archive"
sink_type = "file"
namepass = ["cpu*"]
tagexclude = ["host"]

[outputs.tagdrop]
host = ["canary-*"]

[outputs.params]
path = "{}"
"#,
            path.display()
        );
        let config = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();

        let (tx, rx) = mpsc::channel(16);
        let agent = create_agent(config, rx).await.unwrap();
        let handle = agent.spawn();

        for i in 0..5 {
            tx.send(metric("cpu_usage", "web-1", i)).await.unwrap();
        }
        tx.send(metric("mem", "web-1", 0)).await.unwrap();
        tx.send(metric("cpu_usage", "canary-1", 0)).await.unwrap();
        drop(tx);

        let report = handle.await.unwrap();
        let stats = report[0].1;
        assert_eq!(stats.metrics_added, 5);
        assert_eq!(stats.metrics_filtered, 2);
        assert_eq!(stats.metrics_written, 5);
        assert_eq!(stats.batches_written, 2);
        assert_eq!(stats.pending(), 0);

        let content = std::fs::read_to_string(&path).unwrap();
        let written: Vec<Metric> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(written.len(), 5);
        for (i, m) in written.iter().enumerate() {
            assert_eq!(m.name(), "cpu_usage");
            assert!(m.tags().get("host").is_none());
            assert_eq!(m.tags()["region"], "eu");
            assert_eq!(m.fields()["value"], FieldValue::Integer(i as i64));
        }
    }

    /// End-to-end test: Agent -> NetworkSink (UDP line protocol)
    #[tokio::test]
    async fn test_e2e_network_sink_line_protocol() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = receiver.local_addr().unwrap();

        let json = format!(
            r#"{{
                "agent": {{ "metric_batch_size": 2, "metric_buffer_limit": 10, "quiet": true }},
                "outputs": [
                    {{ "name": "udp", "sink_type": "network", "params": {{ "addr": "{addr}" }} }}
                ]
            }}"#
        );
        let config = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();

        let (tx, rx) = mpsc::channel(4);
        let handle = create_agent(config, rx).await.unwrap().spawn();
        tx.send(metric("cpu", "a", 1)).await.unwrap();
        tx.send(metric("cpu", "b", 2)).await.unwrap();

        let mut buf = vec![0u8; 65536];
        let n = tokio::time::timeout(Duration::from_secs(5), receiver.recv(&mut buf))
            .await
            .expect("no datagram received")
            .unwrap();
        let payload = String::from_utf8_lossy(&buf[..n]).to_string();
        let lines: Vec<&str> = payload.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("cpu,host=a,region=eu value=1i "));
        assert!(lines[1].starts_with("cpu,host=b,region=eu value=2i "));

        drop(tx);
        let report = handle.await.unwrap();
        assert_eq!(report[0].1.metrics_written, 2);
    }

    #[test]
    fn test_unreachable_port_is_still_a_valid_config() {
        // UDP has no handshake: a closed port only shows up at write time
        let socket = StdUdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = socket.local_addr().unwrap();
        drop(socket);

        let toml = format!(
            r#"
[[outputs]]
name = "udp"
sink_type = "network"
[outputs.params]
addr = "{addr}"
format = "json"
"#
        );
        assert!(ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).is_ok());
    }
}

#[cfg(test)]
mod retry_tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::Utc;
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{ContractError, FieldValue, Fields, Metric, MetricSink, Tags};
    use outputs::{Flusher, RunningOutput};
    use parking_lot::Mutex;

    /// Sink that records delivered values and fails while unhealthy
    #[derive(Clone, Default)]
    struct FlakySink {
        healthy: Arc<AtomicBool>,
        delivered: Arc<Mutex<Vec<Vec<i64>>>>,
        attempts: Arc<Mutex<usize>>,
    }

    impl MetricSink for FlakySink {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn write(&mut self, batch: &[Metric]) -> Result<(), ContractError> {
            *self.attempts.lock() += 1;
            if !self.healthy.load(Ordering::SeqCst) {
                return Err(ContractError::sink_write("flaky", "connection refused"));
            }
            let values = batch
                .iter()
                .map(|m| match m.fields()["seq"] {
                    FieldValue::Integer(v) => v,
                    _ => -1,
                })
                .collect();
            self.delivered.lock().push(values);
            Ok(())
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            Ok(())
        }
    }

    fn metric(seq: i64) -> Metric {
        Metric::new(
            "requests",
            Tags::new(),
            Fields::from([("seq".to_string(), FieldValue::Integer(seq))]),
            Utc::now(),
        )
        .unwrap()
    }

    fn output(batch_size: usize, buffer_limit: usize, sink: FlakySink) -> Arc<RunningOutput<FlakySink>> {
        let toml = format!(
            r#"
[agent]
metric_batch_size = {batch_size}
metric_buffer_limit = {buffer_limit}
quiet = true

[[outputs]]
name = "flaky"
sink_type = "log"
"#
        );
        let config = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
        Arc::new(RunningOutput::from_config(&config.outputs[0], &config.agent, sink).unwrap())
    }

    #[tokio::test]
    async fn test_outage_then_recovery_delivers_everything_in_order() {
        let sink = FlakySink::default();
        let out = output(4, 20, sink.clone());
        let flusher = Flusher::new(vec![Arc::clone(&out)], Duration::from_secs(60));

        // Two full batches fail on the add path
        for seq in 0..10 {
            out.add_metric(metric(seq)).await;
        }
        assert_eq!(out.fail_buffer().len(), 8);
        assert_eq!(out.buffer().len(), 2);

        // A flush during the outage keeps everything
        assert_eq!(flusher.flush_all().await, 1);
        assert_eq!(out.stats().pending(), 10);
        assert_eq!(out.stats().total_dropped(), 0);

        sink.healthy.store(true, Ordering::SeqCst);
        assert_eq!(flusher.flush_all().await, 0);

        let delivered = sink.delivered.lock().clone();
        assert_eq!(
            delivered,
            vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7], vec![8, 9]]
        );
        assert_eq!(out.stats().pending(), 0);
        assert_eq!(out.stats().metrics_written, 10);
    }

    #[tokio::test]
    async fn test_long_outage_keeps_newest_metrics() {
        let sink = FlakySink::default();
        let out = output(2, 4, sink.clone());

        for seq in 0..10 {
            out.add_metric(metric(seq)).await;
        }

        // Five failed batches of 2 into a fail buffer of 4
        let stats = out.stats();
        assert_eq!(stats.write_failures, 5);
        assert_eq!(stats.fail_buffer_len, 4);
        assert_eq!(stats.fail_buffer_drops, 6);
        assert_eq!(stats.buffer_drops, 0);

        sink.healthy.store(true, Ordering::SeqCst);
        out.write().await.unwrap();

        let delivered: Vec<i64> = sink.delivered.lock().iter().flatten().copied().collect();
        assert_eq!(delivered, vec![6, 7, 8, 9]);
        // Five failures plus two retries; the empty primary buffer is not written
        assert_eq!(*sink.attempts.lock(), 7);
    }
}
