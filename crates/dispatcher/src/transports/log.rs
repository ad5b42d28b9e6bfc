//! LogTransport - dry-run session that logs operations via tracing

use contracts::{
    AuthResponse, ContractError, DebugConfig, SendStatus, SessionTransport, TransportVerbosity,
};
use tracing::{debug, info, instrument, warn};

/// Transport that performs no network I/O
///
/// Every session step succeeds and is logged, so a sink configuration can be
/// exercised without an XMPP server.
pub struct LogTransport {
    name: String,
    debug: DebugConfig,
    connected: bool,
    sent: u64,
}

impl LogTransport {
    /// Create a new LogTransport with the given name
    pub fn new(name: impl Into<String>, debug: DebugConfig) -> Self {
        Self {
            name: name.into(),
            debug,
            connected: false,
            sent: 0,
        }
    }

    /// Messages handed over so far
    pub fn sent(&self) -> u64 {
        self.sent
    }
}

impl SessionTransport for LogTransport {
    #[instrument(name = "log_transport_connect", skip(self), fields(transport = %self.name))]
    fn connect(&mut self, host: &str, port: u16) -> Result<(), ContractError> {
        if self.connected {
            warn!(transport = %self.name, "Connect while already connected");
        }
        self.connected = true;
        if self.debug.allows(TransportVerbosity::Info) {
            debug!(transport = %self.name, host, port, "Session opened");
        }
        Ok(())
    }

    #[instrument(
        name = "log_transport_authenticate",
        skip(self, _password),
        fields(transport = %self.name)
    )]
    fn authenticate(&mut self, username: &str, _password: &str, resource: &str) -> AuthResponse {
        if !self.connected {
            return AuthResponse::rejected("not-connected", "authenticate before connect");
        }
        if self.debug.allows(TransportVerbosity::Info) {
            debug!(transport = %self.name, username, resource, "Session authenticated");
        }
        AuthResponse::ok()
    }

    fn send_message(&mut self, recipient: &str, body: &str) -> SendStatus {
        if !self.connected {
            return SendStatus::Failed("not connected".into());
        }
        self.sent += 1;
        info!(
            transport = %self.name,
            recipient,
            bytes = body.len(),
            "Message delivered"
        );
        if self.debug.allows(TransportVerbosity::Verbose) {
            debug!(transport = %self.name, recipient, body, "Message body");
        }
        SendStatus::Dispatched
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    #[instrument(name = "log_transport_disconnect", skip(self), fields(transport = %self.name))]
    fn disconnect(&mut self) {
        self.connected = false;
        if self.debug.allows(TransportVerbosity::Info) {
            debug!(transport = %self.name, "Session closed");
        }
    }
}
