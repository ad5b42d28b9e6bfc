//! SessionTransport trait - Dispatcher output interface
//!
//! Defines the abstract capability set of an XMPP client.

use crate::ContractError;

/// Server answer to an authentication attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthResponse {
    /// Status code, `"ok"` on success
    pub code: String,
    /// Server supplied detail
    pub detail: String,
}

impl AuthResponse {
    pub const OK: &'static str = "ok";

    /// Successful authentication
    pub fn ok() -> Self {
        Self {
            code: Self::OK.to_string(),
            detail: String::new(),
        }
    }

    /// Rejected authentication
    pub fn rejected(code: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            detail: detail.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == Self::OK
    }
}

/// Result of handing a message to the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendStatus {
    /// Handed off; no delivery confirmation is implied
    Dispatched,
    /// The transport detected a failure for this recipient
    Failed(String),
}

/// XMPP session transport
///
/// One instance is owned by one dispatcher and drives one session at a time.
/// All operations block the calling thread.
pub trait SessionTransport: Send {
    /// Open a connection to `host:port`
    ///
    /// # Errors
    /// Returns connect error (should include context)
    fn connect(&mut self, host: &str, port: u16) -> Result<(), ContractError>;

    /// Authenticate the open connection and bind `resource`
    fn authenticate(&mut self, username: &str, password: &str, resource: &str) -> AuthResponse;

    /// Send a chat message to `recipient`
    fn send_message(&mut self, recipient: &str, body: &str) -> SendStatus;

    /// Whether a connection is currently open
    fn is_connected(&self) -> bool;

    /// Close the connection
    fn disconnect(&mut self);
}
