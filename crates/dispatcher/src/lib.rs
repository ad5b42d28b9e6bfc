//! # Dispatcher
//!
//! XMPP 日志投递模块。
//!
//! 负责：
//! - 按 flush policy 缓冲格式化后的日志记录
//! - 每次 flush 走一遍 connect → authenticate → send → disconnect
//! - 失败时丢弃缓冲并通过 fallback reporter 报告，不向调用方传播
//! - 以 tracing `Layer` 形式接入应用日志

pub mod buffer;
pub mod dispatcher;
pub mod error;
pub mod fallback;
pub mod format;
pub mod layer;
pub mod metrics;
pub mod transports;

pub use contracts::{Credentials, FlushPolicy, LogRecord, SessionTransport, Severity, SinkConfig};
pub use dispatcher::{Dispatcher, DispatcherBuilder, FlushReport, FlushState};
pub use error::DispatcherError;
pub use fallback::FallbackReporter;
pub use format::LineFormat;
pub use layer::{SinkGuard, XmppLayer};
pub use metrics::{DispatcherMetrics, MetricsSnapshot};
pub use transports::{LogTransport, MockConfig, MockHandle, MockTransport, TransportCall};
