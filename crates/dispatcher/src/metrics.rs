//! Delivery metrics for observability

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for a single dispatcher
#[derive(Debug, Default)]
pub struct DispatcherMetrics {
    /// Records accepted by submit
    submitted: AtomicU64,
    /// Flush cycles started
    flush_count: AtomicU64,
    /// Flush cycles that authenticated and sent
    delivered_count: AtomicU64,
    /// Flushes aborted at connect
    connect_failures: AtomicU64,
    /// Flushes aborted at authenticate
    auth_failures: AtomicU64,
    /// Buffered records discarded by failed flushes
    dropped_messages: AtomicU64,
    /// Per-recipient sends handed to the transport
    sends: AtomicU64,
    /// Per-recipient sends the transport reported as failed
    send_failures: AtomicU64,
    /// Errors written to the fallback reporter
    reports: AtomicU64,
}

impl DispatcherMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    pub fn inc_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn flush_count(&self) -> u64 {
        self.flush_count.load(Ordering::Relaxed)
    }

    pub fn inc_flush_count(&self) {
        self.flush_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn delivered_count(&self) -> u64 {
        self.delivered_count.load(Ordering::Relaxed)
    }

    pub fn inc_delivered_count(&self) {
        self.delivered_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connect_failures(&self) -> u64 {
        self.connect_failures.load(Ordering::Relaxed)
    }

    pub fn inc_connect_failures(&self) {
        self.connect_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn auth_failures(&self) -> u64 {
        self.auth_failures.load(Ordering::Relaxed)
    }

    pub fn inc_auth_failures(&self) {
        self.auth_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dropped_messages(&self) -> u64 {
        self.dropped_messages.load(Ordering::Relaxed)
    }

    pub fn add_dropped_messages(&self, count: u64) {
        self.dropped_messages.fetch_add(count, Ordering::Relaxed);
    }

    pub fn sends(&self) -> u64 {
        self.sends.load(Ordering::Relaxed)
    }

    pub fn inc_sends(&self) {
        self.sends.fetch_add(1, Ordering::Relaxed);
    }

    pub fn send_failures(&self) -> u64 {
        self.send_failures.load(Ordering::Relaxed)
    }

    pub fn inc_send_failures(&self) {
        self.send_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reports(&self) -> u64 {
        self.reports.load(Ordering::Relaxed)
    }

    pub fn inc_reports(&self) {
        self.reports.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            submitted: self.submitted(),
            flush_count: self.flush_count(),
            delivered_count: self.delivered_count(),
            connect_failures: self.connect_failures(),
            auth_failures: self.auth_failures(),
            dropped_messages: self.dropped_messages(),
            sends: self.sends(),
            send_failures: self.send_failures(),
            reports: self.reports(),
        }
    }
}

/// Snapshot of dispatcher metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub submitted: u64,
    pub flush_count: u64,
    pub delivered_count: u64,
    pub connect_failures: u64,
    pub auth_failures: u64,
    pub dropped_messages: u64,
    pub sends: u64,
    pub send_failures: u64,
    pub reports: u64,
}

impl MetricsSnapshot {
    /// Flushes that ended in connect or auth failure
    pub fn failed_flushes(&self) -> u64 {
        self.connect_failures + self.auth_failures
    }
}
