//! Layered error definitions
//!
//! Categorized by source: config / session / io

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Session Errors =====
    /// Connecting to the XMPP server failed
    #[error("session connect error for {host}:{port}: {message}")]
    SessionConnect {
        host: String,
        port: u16,
        message: String,
    },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create session connect error
    pub fn session_connect(host: impl Into<String>, port: u16, message: impl Into<String>) -> Self {
        Self::SessionConnect {
            host: host.into(),
            port,
            message: message.into(),
        }
    }
}
