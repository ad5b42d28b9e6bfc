//! Delivery 指标导出模块
//!
//! 将 dispatcher 的 `MetricsSnapshot` 发布到 `metrics` facade，并生成运行结束时的摘要。

use std::time::Duration;

use dispatcher::MetricsSnapshot;
use metrics::{counter, gauge};

/// 发布 dispatcher 指标快照
///
/// 快照里的值是累计值，因此 counter 使用 `absolute`，可以重复调用。
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_snapshot;
///
/// record_snapshot(guard_name, &guard.metrics().snapshot());
/// ```
pub fn record_snapshot(sink: &str, snapshot: &MetricsSnapshot) {
    let sink = sink.to_string();

    counter!("xmpp_sink_records_submitted_total", "sink" => sink.clone())
        .absolute(snapshot.submitted);
    counter!("xmpp_sink_flushes_total", "sink" => sink.clone()).absolute(snapshot.flush_count);
    counter!("xmpp_sink_flushes_delivered_total", "sink" => sink.clone())
        .absolute(snapshot.delivered_count);

    // 失败的 flush 按阶段区分
    counter!(
        "xmpp_sink_flush_failures_total",
        "sink" => sink.clone(),
        "stage" => "connect"
    )
    .absolute(snapshot.connect_failures);
    counter!(
        "xmpp_sink_flush_failures_total",
        "sink" => sink.clone(),
        "stage" => "auth"
    )
    .absolute(snapshot.auth_failures);

    counter!("xmpp_sink_records_dropped_total", "sink" => sink.clone())
        .absolute(snapshot.dropped_messages);
    counter!(
        "xmpp_sink_sends_total",
        "sink" => sink.clone(),
        "status" => "success"
    )
    .absolute(snapshot.sends.saturating_sub(snapshot.send_failures));
    counter!(
        "xmpp_sink_sends_total",
        "sink" => sink.clone(),
        "status" => "failure"
    )
    .absolute(snapshot.send_failures);
    counter!("xmpp_sink_fallback_reports_total", "sink" => sink.clone())
        .absolute(snapshot.reports);

    gauge!("xmpp_sink_delivery_ratio", "sink" => sink).set(delivery_ratio(snapshot));
}

/// 成功 flush 占比，没有 flush 时为 1.0
pub fn delivery_ratio(snapshot: &MetricsSnapshot) -> f64 {
    if snapshot.flush_count == 0 {
        1.0
    } else {
        snapshot.delivered_count as f64 / snapshot.flush_count as f64
    }
}

/// 运行结束摘要
#[derive(Debug, Clone)]
pub struct DeliverySummary {
    pub sink: String,
    pub snapshot: MetricsSnapshot,
    pub elapsed: Duration,
}

impl DeliverySummary {
    pub fn new(sink: impl Into<String>, snapshot: MetricsSnapshot, elapsed: Duration) -> Self {
        Self {
            sink: sink.into(),
            snapshot,
            elapsed,
        }
    }

    /// 是否有记录因 flush 失败被丢弃
    pub fn has_losses(&self) -> bool {
        self.snapshot.dropped_messages > 0 || self.snapshot.send_failures > 0
    }

    /// 每秒提交的记录数
    pub fn records_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.snapshot.submitted as f64 / secs
        } else {
            0.0
        }
    }
}

impl std::fmt::Display for DeliverySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = &self.snapshot;
        writeln!(f, "=== Delivery Summary ({}) ===", self.sink)?;
        writeln!(
            f,
            "Records submitted: {} ({:.1}/s over {:.2}s)",
            s.submitted,
            self.records_per_sec(),
            self.elapsed.as_secs_f64()
        )?;
        writeln!(
            f,
            "Flushes: {} ({} delivered, {:.2}%)",
            s.flush_count,
            s.delivered_count,
            delivery_ratio(s) * 100.0
        )?;
        writeln!(
            f,
            "Failed flushes: {} (connect {}, auth {})",
            s.failed_flushes(),
            s.connect_failures,
            s.auth_failures
        )?;
        writeln!(f, "Records dropped: {}", s.dropped_messages)?;
        writeln!(f, "Sends: {} ({} failed)", s.sends, s.send_failures)?;
        write!(f, "Fallback reports: {}", s.reports)
    }
}
