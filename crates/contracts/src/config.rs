//! SinkConfig - Config Loader output
//!
//! Complete description of one XMPP sink, as read from a TOML/JSON file.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{Credentials, DebugConfig, FlushPolicy, Severity};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    #[serde(rename = "1")]
    V1,
}

/// Sink configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SinkConfig {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Sink name (used for logging/metrics)
    #[validate(length(min = 1, message = "sink name cannot be empty"))]
    pub name: String,

    /// Least severe level forwarded to the sink
    #[serde(default)]
    pub min_level: Severity,

    /// Recipient JIDs, in send order
    #[validate(length(min = 1, message = "at least one recipient is required"))]
    pub recipients: Vec<String>,

    /// Session credentials
    #[validate(nested)]
    pub credentials: Credentials,

    /// Flush policy
    #[serde(default)]
    pub flush: FlushPolicy,

    /// Transport debug settings
    #[serde(default)]
    pub debug: DebugConfig,

    /// Message formatting
    #[serde(default)]
    pub format: FormatConfig,
}

/// Message line formatting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatConfig {
    /// Template with `{message}`, `{level}`, `{ident}` and `{timestamp}`
    /// placeholders. Unset means the raw message is buffered.
    #[serde(default)]
    pub line_format: Option<String>,

    /// strftime pattern for `{timestamp}`
    #[serde(default = "default_time_format")]
    pub time_format: String,
}

/// Default `{timestamp}` pattern
pub const DEFAULT_TIME_FORMAT: &str = "%b %d %H:%M:%S";

fn default_time_format() -> String {
    DEFAULT_TIME_FORMAT.to_string()
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            line_format: None,
            time_format: default_time_format(),
        }
    }
}
