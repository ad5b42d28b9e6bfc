//! 以全局订阅器安装 XmppLayer（独立测试二进制，全局订阅器只能设置一次）

use dispatcher::{
    Credentials, DispatcherBuilder, FallbackReporter, FlushPolicy, MockTransport, Severity,
    XmppLayer,
};
use observability::{init_with_layer, LogFormat, ObservabilityConfig};

#[test]
fn test_init_with_xmpp_layer() {
    let transport = MockTransport::new();
    let mock = transport.handle();
    let dispatcher = DispatcherBuilder::new("global")
        .credentials(Credentials::new("xmpp.test", "logger", "secret"))
        .recipient("ops@xmpp.test")
        .min_level(Severity::Error)
        .flush_policy(FlushPolicy::Count { threshold: 2 })
        .fallback(FallbackReporter::with_writer(std::io::sink))
        .build_with(transport)
        .unwrap();
    let (layer, guard) = XmppLayer::new(dispatcher);

    init_with_layer(
        ObservabilityConfig {
            log_format: LogFormat::Compact,
            metrics_port: None,
            default_log_level: "warn".to_string(),
        },
        layer,
    )
    .unwrap();

    tracing::warn!("below sink level");
    tracing::error!("replica lag 30s");
    tracing::error!(code = 7, "failover started");

    assert_eq!(guard.metrics().submitted(), 2);
    assert_eq!(
        mock.sent(),
        vec![(
            "ops@xmpp.test".to_string(),
            "replica lag 30sfailover started".to_string()
        )]
    );

    // 全局订阅器已存在，再次初始化失败
    assert!(observability::init().is_err());

    tracing::error!("left in buffer");
    assert_eq!(guard.pending(), 1);
    drop(guard);
    assert_eq!(mock.connect_count(), 2);
}
