//! Session parameters
//!
//! Credentials and transport debug settings handed to a `SessionTransport`.

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Default XMPP client port
pub const DEFAULT_PORT: u16 = 5222;

/// Resource used when the configuration does not name one
pub const DEFAULT_RESOURCE: &str = "log-sink";

/// Connection and authentication parameters
///
/// Passed whole to the transport; the dispatcher never interprets them.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Credentials {
    /// XMPP server host
    #[validate(length(min = 1, message = "host cannot be empty"))]
    pub host: String,

    /// XMPP server port
    #[serde(default = "default_port")]
    #[validate(range(min = 1, message = "port must be > 0"))]
    pub port: u16,

    /// Account user name (node part of the JID)
    #[validate(length(min = 1, message = "username cannot be empty"))]
    pub username: String,

    /// Account password
    #[validate(length(min = 1, message = "password cannot be empty"))]
    pub password: String,

    /// Resource identifier bound for the session
    #[serde(default = "default_resource")]
    pub resource: String,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_resource() -> String {
    DEFAULT_RESOURCE.to_string()
}

impl Credentials {
    /// Create credentials with the default port and resource
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            username: username.into(),
            password: password.into(),
            resource: default_resource(),
        }
    }

    /// Override the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Override the resource
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = resource.into();
        self
    }

    /// First required field that is empty, if any
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.host.is_empty() {
            Some("host")
        } else if self.username.is_empty() {
            Some("username")
        } else if self.password.is_empty() {
            Some("password")
        } else {
            None
        }
    }
}

// Password stays out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("resource", &self.resource)
            .finish()
    }
}

/// Transport diagnostic verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportVerbosity {
    /// Failures only
    Error,
    /// Session lifecycle
    #[default]
    Info,
    /// Lifecycle plus message bodies
    Verbose,
}

/// Transport debug configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DebugConfig {
    /// Emit protocol diagnostics
    #[serde(default)]
    pub enabled: bool,

    /// Diagnostic detail when enabled
    #[serde(default)]
    pub verbosity: TransportVerbosity,
}

impl DebugConfig {
    /// Whether diagnostics at `verbosity` should be emitted
    pub fn allows(&self, verbosity: TransportVerbosity) -> bool {
        self.enabled && verbosity <= self.verbosity
    }
}
