//! LogRecord - sink input
//!
//! The structured record handed over by the logging framework.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Record severity
///
/// Ordered from most to least severe; a more verbose level compares greater.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl Severity {
    /// Lowercase name, as used in configuration files
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" | "err" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            other => Err(format!("unknown severity '{other}'")),
        }
    }
}

/// A single log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Severity
    pub level: Severity,

    /// Message text, the only field buffered by default
    pub message: String,

    /// Emitting component (tracing target, logger ident)
    #[serde(default)]
    pub ident: String,

    /// Creation time
    pub timestamp: DateTime<Utc>,
}

impl LogRecord {
    /// Create a record stamped with the current time
    pub fn new(level: Severity, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            ident: String::new(),
            timestamp: Utc::now(),
        }
    }

    /// Set the emitting component
    pub fn with_ident(mut self, ident: impl Into<String>) -> Self {
        self.ident = ident.into();
        self
    }
}
