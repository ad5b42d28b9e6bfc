//! Dispatcher - buffered delivery engine
//!
//! Accumulates record bodies and, when the flush policy fires, runs one full
//! connect → authenticate → send → disconnect cycle over its transport.

use std::fmt;
use std::sync::Arc;

use contracts::{
    ContractError, Credentials, DebugConfig, FlushPolicy, LogRecord, SendStatus,
    SessionTransport, Severity, SinkConfig,
};
use tracing::{debug, info, instrument, trace, warn};

use crate::buffer::PendingBuffer;
use crate::error::DispatcherError;
use crate::fallback::FallbackReporter;
use crate::format::LineFormat;
use crate::metrics::DispatcherMetrics;

/// Position within a flush cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushState {
    #[default]
    Idle,
    Connecting,
    Authenticating,
    Sending,
    Disconnecting,
}

/// Result of a flush that got past authentication
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Records concatenated into the body
    pub messages: usize,
    /// Body length in bytes
    pub body_len: usize,
    /// Recipients the transport accepted
    pub dispatched: usize,
    /// Recipients the transport reported as failed, with reason
    pub failed: Vec<(String, String)>,
}

impl FlushReport {
    /// Nothing was pending
    pub fn is_empty(&self) -> bool {
        self.messages == 0
    }

    /// At least one recipient failed
    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Builder for creating a Dispatcher
pub struct DispatcherBuilder {
    name: String,
    min_level: Severity,
    credentials: Option<Credentials>,
    recipients: Vec<String>,
    policy: FlushPolicy,
    debug: DebugConfig,
    format: LineFormat,
    fallback: Option<FallbackReporter>,
}

impl DispatcherBuilder {
    /// Create a new DispatcherBuilder
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min_level: Severity::default(),
            credentials: None,
            recipients: Vec::new(),
            policy: FlushPolicy::default(),
            debug: DebugConfig::default(),
            format: LineFormat::raw(),
            fallback: None,
        }
    }

    /// Start from a loaded sink configuration
    pub fn from_config(config: &SinkConfig) -> Self {
        Self::new(&config.name)
            .min_level(config.min_level)
            .credentials(config.credentials.clone())
            .recipients(config.recipients.iter().cloned())
            .flush_policy(config.flush)
            .debug(config.debug)
            .line_format(LineFormat::from_config(&config.format))
    }

    pub fn min_level(mut self, level: Severity) -> Self {
        self.min_level = level;
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Append one recipient
    pub fn recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipients.push(recipient.into());
        self
    }

    /// Append recipients, keeping order and duplicates
    pub fn recipients<I, S>(mut self, recipients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.recipients.extend(recipients.into_iter().map(Into::into));
        self
    }

    pub fn flush_policy(mut self, policy: FlushPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn debug(mut self, debug: DebugConfig) -> Self {
        self.debug = debug;
        self
    }

    pub fn line_format(mut self, format: LineFormat) -> Self {
        self.format = format;
        self
    }

    /// Replace the stderr fallback reporter
    pub fn fallback(mut self, fallback: FallbackReporter) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Validate inputs and build the dispatcher
    ///
    /// `make_transport` is called once with the debug configuration. The
    /// transport is created but not connected.
    ///
    /// # Errors
    /// - `Configuration` for missing credentials or recipients
    /// - `TransportInit` when `make_transport` fails
    #[instrument(
        name = "dispatcher_builder_build",
        skip(self, make_transport),
        fields(sink = %self.name, recipients = self.recipients.len())
    )]
    pub fn build<T, F, E>(self, make_transport: F) -> Result<Dispatcher<T>, DispatcherError>
    where
        T: SessionTransport,
        F: FnOnce(&DebugConfig) -> Result<T, E>,
        E: fmt::Display,
    {
        let Self {
            name,
            min_level,
            credentials,
            recipients,
            policy,
            debug,
            format,
            fallback,
        } = self;

        let credentials = validate_inputs(credentials, &recipients, policy)?;
        let transport = make_transport(&debug)
            .map_err(|e| DispatcherError::transport_init(&name, e.to_string()))?;

        info!(
            sink = %name,
            host = %credentials.host,
            port = credentials.port,
            recipients = recipients.len(),
            policy = ?policy,
            "Dispatcher created"
        );

        Ok(Dispatcher {
            name,
            min_level,
            credentials,
            recipients,
            policy,
            format,
            buffer: PendingBuffer::new(),
            state: FlushState::Idle,
            transport,
            fallback: fallback.unwrap_or_default(),
            metrics: Arc::new(DispatcherMetrics::new()),
        })
    }

    /// Build around an already constructed transport
    pub fn build_with<T: SessionTransport>(
        self,
        transport: T,
    ) -> Result<Dispatcher<T>, DispatcherError> {
        self.build(|_| Ok::<_, std::convert::Infallible>(transport))
    }
}

fn validate_inputs(
    credentials: Option<Credentials>,
    recipients: &[String],
    policy: FlushPolicy,
) -> Result<Credentials, DispatcherError> {
    let credentials = credentials
        .ok_or_else(|| DispatcherError::configuration("credentials", "credentials are required"))?;
    if let Some(field) = credentials.missing_field() {
        return Err(DispatcherError::configuration(
            format!("credentials.{field}"),
            format!("{field} is required"),
        ));
    }
    if recipients.is_empty() {
        return Err(DispatcherError::configuration(
            "recipients",
            "at least one recipient is required",
        ));
    }
    if let Some(idx) = recipients.iter().position(|r| r.trim().is_empty()) {
        return Err(DispatcherError::configuration(
            format!("recipients[{idx}]"),
            "recipient cannot be empty",
        ));
    }
    if policy == (FlushPolicy::Count { threshold: 0 }) {
        return Err(DispatcherError::configuration(
            "flush.threshold",
            "threshold must be >= 1",
        ));
    }
    Ok(credentials)
}

/// Buffered XMPP dispatcher
///
/// Single-threaded: wrap in a `Mutex` when shared (see `XmppLayer`).
pub struct Dispatcher<T> {
    name: String,
    min_level: Severity,
    credentials: Credentials,
    recipients: Vec<String>,
    policy: FlushPolicy,
    format: LineFormat,
    buffer: PendingBuffer,
    state: FlushState,
    transport: T,
    fallback: FallbackReporter,
    metrics: Arc<DispatcherMetrics>,
}

impl<T: SessionTransport> Dispatcher<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min_level(&self) -> Severity {
        self.min_level
    }

    /// Whether a record at `level` should be submitted
    pub fn accepts(&self, level: Severity) -> bool {
        level <= self.min_level
    }

    pub fn policy(&self) -> FlushPolicy {
        self.policy
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    /// Records waiting for the next flush
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub fn state(&self) -> FlushState {
        self.state
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn metrics(&self) -> &Arc<DispatcherMetrics> {
        &self.metrics
    }

    /// Buffer a record and flush if the policy says so
    ///
    /// Never fails: flush errors go to the fallback reporter.
    #[instrument(
        name = "dispatcher_submit",
        level = "trace",
        skip(self, record),
        fields(sink = %self.name, severity = %record.level)
    )]
    pub fn submit(&mut self, record: &LogRecord) {
        let body = self.format.render(record);
        let len = self.buffer.push(body);
        self.metrics.inc_submitted();

        if self.policy.triggers_at(len) {
            // Already reported by flush.
            let _ = self.flush();
        }
    }

    /// Run one protocol cycle over everything pending
    ///
    /// The buffer is empty afterwards whatever the outcome. An empty buffer
    /// opens no session.
    ///
    /// # Errors
    /// `Connect` or `Auth` when the cycle aborted; the buffered records were
    /// dropped and the error has been reported.
    #[instrument(
        name = "dispatcher_flush",
        skip(self),
        fields(sink = %self.name, pending = self.buffer.len())
    )]
    pub fn flush(&mut self) -> Result<FlushReport, DispatcherError> {
        if self.buffer.is_empty() {
            return Ok(FlushReport::default());
        }

        self.metrics.inc_flush_count();
        let result = self.run_cycle();
        self.transition(FlushState::Idle);
        let held = self.buffer.clear();

        match result {
            Ok(report) => {
                self.metrics.inc_delivered_count();
                for (recipient, reason) in &report.failed {
                    self.report(&DispatcherError::Send {
                        recipient: recipient.clone(),
                        reason: reason.clone(),
                    });
                }
                debug!(
                    sink = %self.name,
                    messages = report.messages,
                    bytes = report.body_len,
                    dispatched = report.dispatched,
                    failed = report.failed.len(),
                    "Flush complete"
                );
                Ok(report)
            }
            Err(e) => {
                match e {
                    DispatcherError::Connect { .. } => self.metrics.inc_connect_failures(),
                    DispatcherError::Auth { .. } => self.metrics.inc_auth_failures(),
                    _ => {}
                }
                self.metrics.add_dropped_messages(held as u64);
                warn!(
                    sink = %self.name,
                    dropped = held,
                    error = %e,
                    "Flush failed, buffered messages dropped"
                );
                self.report(&e);
                Err(e)
            }
        }
    }

    /// Flush anything left and make sure no session stays open
    ///
    /// Safe to call more than once.
    #[instrument(name = "dispatcher_finalize", skip(self), fields(sink = %self.name))]
    pub fn finalize(&mut self) {
        if !self.buffer.is_empty() {
            let _ = self.flush();
        }
        if self.transport.is_connected() {
            warn!(sink = %self.name, "Session still open at finalize, disconnecting");
            self.transport.disconnect();
        }
    }

    fn run_cycle(&mut self) -> Result<FlushReport, DispatcherError> {
        self.transition(FlushState::Connecting);
        self.transport
            .connect(&self.credentials.host, self.credentials.port)
            .map_err(|e| DispatcherError::Connect {
                host: self.credentials.host.clone(),
                port: self.credentials.port,
                message: connect_message(e),
            })?;

        self.transition(FlushState::Authenticating);
        let auth = self.transport.authenticate(
            &self.credentials.username,
            &self.credentials.password,
            &self.credentials.resource,
        );
        if !auth.is_ok() {
            // The connection is open even though auth failed.
            self.transition(FlushState::Disconnecting);
            self.transport.disconnect();
            return Err(DispatcherError::Auth {
                code: auth.code,
                detail: auth.detail,
            });
        }

        self.transition(FlushState::Sending);
        let body = self.buffer.concat();
        let mut report = FlushReport {
            messages: self.buffer.len(),
            body_len: body.len(),
            ..FlushReport::default()
        };
        for recipient in &self.recipients {
            self.metrics.inc_sends();
            match self.transport.send_message(recipient, &body) {
                SendStatus::Dispatched => report.dispatched += 1,
                SendStatus::Failed(reason) => {
                    self.metrics.inc_send_failures();
                    report.failed.push((recipient.clone(), reason));
                }
            }
        }

        self.transition(FlushState::Disconnecting);
        self.transport.disconnect();
        Ok(report)
    }

    fn transition(&mut self, next: FlushState) {
        trace!(sink = %self.name, from = ?self.state, to = ?next, "Flush state");
        self.state = next;
    }

    fn report(&mut self, error: &DispatcherError) {
        self.metrics.inc_reports();
        self.fallback.report(&self.name, error);
    }
}

fn connect_message(error: ContractError) -> String {
    match error {
        ContractError::SessionConnect { message, .. } => message,
        other => other.to_string(),
    }
}
