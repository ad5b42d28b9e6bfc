//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
///
/// `Configuration` and `TransportInit` abort construction. The others occur
/// during a flush, are routed to the fallback reporter and never reach the
/// caller of `submit`.
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Required construction input missing or invalid
    #[error("invalid sink configuration at '{field}': {message}")]
    Configuration { field: String, message: String },

    /// Transport could not be built
    #[error("failed to create transport for sink '{sink}': {message}")]
    TransportInit { sink: String, message: String },

    /// Connecting to the server failed
    #[error("failed to connect to {host}:{port}: {message}")]
    Connect {
        host: String,
        port: u16,
        message: String,
    },

    /// Server rejected authentication
    #[error("authentication rejected ({code}): {detail}")]
    Auth { code: String, detail: String },

    /// Transport reported a failed send for one recipient
    #[error("send to '{recipient}' failed: {reason}")]
    Send { recipient: String, reason: String },
}

impl DispatcherError {
    /// Create a configuration error
    pub fn configuration(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a transport init error
    pub fn transport_init(sink: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TransportInit {
            sink: sink.into(),
            message: message.into(),
        }
    }

    /// Whether the error aborts construction
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration { .. } | Self::TransportInit { .. })
    }
}
