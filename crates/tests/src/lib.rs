//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试（配置格式）
//! - 模拟 e2e 测试（无需 XMPP 服务器）：config → ConfigLoader → DispatcherBuilder
//!   → XmppLayer → MockTransport

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{FlushPolicy, Severity};

    #[test]
    fn test_flush_policy_wire_shape() {
        let json = serde_json::to_value(FlushPolicy::Count { threshold: 5 }).unwrap();
        assert_eq!(json, serde_json::json!({ "mode": "count", "threshold": 5 }));

        let json = serde_json::to_value(FlushPolicy::Immediate).unwrap();
        assert_eq!(json, serde_json::json!({ "mode": "immediate" }));
    }

    #[test]
    fn test_json_config_matches_toml() {
        let toml = r#"
name = "ops"
min_level = "error"
recipients = ["oncall@example.org"]

[credentials]
host = "jabber.example.org"
username = "logger"
password = "secret"

[flush]
mode = "manual"
"#;
        let json = r#"{
            "name": "ops",
            "min_level": "error",
            "recipients": ["oncall@example.org"],
            "credentials": {
                "host": "jabber.example.org",
                "username": "logger",
                "password": "secret"
            },
            "flush": { "mode": "manual" }
        }"#;

        let a = ConfigLoader::load_from_str(toml, ConfigFormat::Toml).unwrap();
        let b = ConfigLoader::load_from_str(json, ConfigFormat::Json).unwrap();

        assert_eq!(a.credentials, b.credentials);
        assert_eq!(a.recipients, b.recipients);
        assert_eq!(a.flush, b.flush);
        assert_eq!(a.min_level, Severity::Error);
        assert_eq!(b.min_level, Severity::Error);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use config_loader::ConfigLoader;
    use dispatcher::{
        DispatcherBuilder, FallbackReporter, MockHandle, MockTransport, SinkGuard, TransportCall,
        XmppLayer,
    };
    use observability::DeliverySummary;
    use tracing_subscriber::layer::SubscriberExt;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn config_file(flush: &str) -> tempfile::NamedTempFile {
        let content = format!(
            r#"
name = "ops"
min_level = "warn"
recipients = ["oncall@xmpp.test", "backup@xmpp.test"]

[credentials]
host = "xmpp.test"
port = 5223
username = "logger"
password = "secret"
resource = "e2e"

[flush]
{flush}

[format]
line_format = "<{{level}}> {{ident}}: {{message}}\n"
"#
        );
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    /// 从配置文件构建 layer + guard，fallback 输出写入 buffer
    fn setup(
        flush: &str,
    ) -> (
        XmppLayer<MockTransport>,
        SinkGuard<MockTransport>,
        MockHandle,
        SharedBuf,
    ) {
        let file = config_file(flush);
        let config = ConfigLoader::load_from_path(file.path()).unwrap();

        let transport = MockTransport::new();
        let mock = transport.handle();
        let fallback_buf = SharedBuf::default();
        let writer = fallback_buf.clone();

        let dispatcher = DispatcherBuilder::from_config(&config)
            .fallback(FallbackReporter::with_writer(move || writer.clone()))
            .build_with(transport)
            .unwrap();
        let (layer, guard) = XmppLayer::new(dispatcher);
        (layer, guard, mock, fallback_buf)
    }

    /// End-to-end: config file → dispatcher → tracing events → mock session
    ///
    /// 验证：
    /// 1. 低于 min_level 的事件被忽略
    /// 2. 达到阈值时 flush 一次，每个 recipient 收到相同的 body
    /// 3. 每次 flush 都是完整的 connect → auth → send → disconnect
    #[test]
    fn test_e2e_count_policy() {
        let (layer, guard, mock, fallback) = setup("mode = \"count\"\nthreshold = 2");
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "api", "request served");
            tracing::warn!(target: "api", "slow request");
            tracing::debug!(target: "db", "query plan");
            tracing::error!(target: "db", "connection lost");
        });

        let body = "<warn> api: slow request\n<error> db: connection lost\n";
        assert_eq!(
            mock.calls(),
            vec![
                TransportCall::Connect {
                    host: "xmpp.test".into(),
                    port: 5223,
                },
                TransportCall::Authenticate {
                    username: "logger".into(),
                    resource: "e2e".into(),
                },
                TransportCall::Send {
                    recipient: "oncall@xmpp.test".into(),
                    body: body.into(),
                },
                TransportCall::Send {
                    recipient: "backup@xmpp.test".into(),
                    body: body.into(),
                },
                TransportCall::Disconnect,
            ]
        );
        assert_eq!(guard.pending(), 0);
        assert!(fallback.contents().is_empty());
    }

    /// Residual records are delivered when the guard goes away
    #[test]
    fn test_e2e_residual_flushed_on_guard_drop() {
        let (layer, guard, mock, _) = setup("mode = \"count\"\nthreshold = 10");
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            for i in 0..25 {
                tracing::warn!("event {i}");
            }
        });

        assert_eq!(guard.metrics().flush_count(), 2);
        assert_eq!(guard.pending(), 5);
        let metrics = Arc::clone(guard.metrics());

        drop(guard);

        assert_eq!(metrics.flush_count(), 3);
        assert_eq!(mock.connect_count(), 3);
        assert_eq!(mock.send_count(), 6);
        assert!(!mock.is_connected());
        let last = mock.sent().pop().unwrap().1;
        assert!(last.starts_with("<warn> tests::e2e_tests: event 20\n"));
    }

    /// Connect failure drops the batch, is reported on the fallback channel,
    /// and the next flush reconnects from scratch.
    #[test]
    fn test_e2e_connect_failure_then_recovery() {
        let (layer, guard, mock, fallback) = setup("mode = \"immediate\"");
        let dispatch = tracing::Dispatch::new(tracing_subscriber::registry().with(layer));

        mock.configure(|c| c.fail_connect = true);
        tracing::dispatcher::with_default(&dispatch, || tracing::error!("first"));

        assert_eq!(guard.pending(), 0);
        assert_eq!(mock.send_count(), 0);
        let report = fallback.contents();
        assert!(report.contains("failed to connect to xmpp.test:5223: mock failure"));
        assert!(report.contains("sink=ops"));

        mock.configure(|c| c.fail_connect = false);
        tracing::dispatcher::with_default(&dispatch, || tracing::error!("second"));

        assert_eq!(mock.connect_count(), 2);
        assert_eq!(mock.send_count(), 2);
        assert!(mock.sent().iter().all(|(_, body)| body.ends_with("second\n")));

        let snapshot = guard.metrics().snapshot();
        assert_eq!(snapshot.flush_count, 2);
        assert_eq!(snapshot.delivered_count, 1);
        assert_eq!(snapshot.connect_failures, 1);
        assert_eq!(snapshot.dropped_messages, 1);
    }

    /// Manual policy: nothing happens until finalize
    #[test]
    fn test_e2e_manual_and_summary() {
        let (layer, guard, mock, _) = setup("mode = \"manual\"");
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("a");
            tracing::warn!("b");
            tracing::warn!("c");
        });
        assert!(mock.calls().is_empty());

        let metrics = Arc::clone(guard.metrics());
        guard.finalize();

        assert_eq!(mock.connect_count(), 1);
        assert_eq!(mock.disconnect_count(), 1);

        let summary = DeliverySummary::new("ops", metrics.snapshot(), Duration::from_secs(1));
        assert!(!summary.has_losses());
        assert!(summary.to_string().contains("Records submitted: 3"));
        assert!(summary.to_string().contains("Sends: 2 (0 failed)"));
    }

    /// Auth rejection closes the session it opened
    #[test]
    fn test_e2e_auth_rejected() {
        let (layer, guard, mock, fallback) = setup("mode = \"immediate\"");
        mock.configure(|c| {
            c.reject_auth = Some(contracts::AuthResponse::rejected(
                "not-authorized",
                "bad password",
            ))
        });
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || tracing::error!("lost"));

        assert_eq!(mock.disconnect_count(), 1);
        assert_eq!(mock.send_count(), 0);
        assert!(fallback.contents().contains("authentication rejected (not-authorized)"));
        assert_eq!(guard.metrics().auth_failures(), 1);
    }
}
