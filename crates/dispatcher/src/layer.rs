//! XmppLayer - tracing-subscriber layer feeding a dispatcher
//!
//! Events at or above the dispatcher's minimum level are turned into
//! `LogRecord`s and submitted under a per-dispatcher lock. The returned
//! `SinkGuard` finalizes the dispatcher when dropped.

use std::cell::Cell;
use std::fmt::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use contracts::{LogRecord, SessionTransport, Severity};
use tracing::field::{Field, Visit};
use tracing::{debug, Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::dispatcher::{Dispatcher, FlushReport};
use crate::error::DispatcherError;
use crate::metrics::DispatcherMetrics;

thread_local! {
    static IN_SINK: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as running sink code
///
/// Events emitted while it is held (transport diagnostics, flush warnings)
/// are not fed back into any sink.
struct ReentryGuard;

impl ReentryGuard {
    fn enter() -> Option<Self> {
        IN_SINK.with(|flag| {
            if flag.get() {
                None
            } else {
                flag.set(true);
                Some(ReentryGuard)
            }
        })
    }
}

impl Drop for ReentryGuard {
    fn drop(&mut self) {
        IN_SINK.with(|flag| flag.set(false));
    }
}

type Shared<T> = Arc<Mutex<Dispatcher<T>>>;

fn lock<T>(dispatcher: &Shared<T>) -> MutexGuard<'_, Dispatcher<T>> {
    dispatcher.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Layer that forwards tracing events to a buffered XMPP dispatcher
pub struct XmppLayer<T> {
    dispatcher: Shared<T>,
    min_level: Severity,
}

impl<T: SessionTransport + 'static> XmppLayer<T> {
    /// Wrap a dispatcher, returning the layer and its shutdown guard
    pub fn new(dispatcher: Dispatcher<T>) -> (Self, SinkGuard<T>) {
        let min_level = dispatcher.min_level();
        let metrics = Arc::clone(dispatcher.metrics());
        let shared = Arc::new(Mutex::new(dispatcher));

        let layer = Self {
            dispatcher: Arc::clone(&shared),
            min_level,
        };
        let guard = SinkGuard {
            dispatcher: shared,
            metrics,
            finalized: false,
        };
        (layer, guard)
    }

    pub fn min_level(&self) -> Severity {
        self.min_level
    }
}

impl<S, T> Layer<S> for XmppLayer<T>
where
    S: Subscriber,
    T: SessionTransport + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let level = severity_of(metadata.level());
        if level > self.min_level {
            return;
        }
        let Some(_reentry) = ReentryGuard::enter() else {
            return;
        };

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let Some(message) = visitor.into_message() else {
            return;
        };

        let record = LogRecord {
            level,
            message,
            ident: metadata.target().to_string(),
            timestamp: Utc::now(),
        };
        lock(&self.dispatcher).submit(&record);
    }
}

/// Map a tracing level to a record severity
pub fn severity_of(level: &Level) -> Severity {
    match *level {
        Level::ERROR => Severity::Error,
        Level::WARN => Severity::Warn,
        Level::INFO => Severity::Info,
        Level::DEBUG => Severity::Debug,
        Level::TRACE => Severity::Trace,
    }
}

/// Owner-side handle of a layered dispatcher
///
/// Dropping the guard finalizes the dispatcher: residual records are flushed
/// and any open session is closed.
pub struct SinkGuard<T: SessionTransport> {
    dispatcher: Shared<T>,
    metrics: Arc<DispatcherMetrics>,
    finalized: bool,
}

impl<T: SessionTransport> SinkGuard<T> {
    pub fn metrics(&self) -> &Arc<DispatcherMetrics> {
        &self.metrics
    }

    /// Records waiting for the next flush
    pub fn pending(&self) -> usize {
        lock(&self.dispatcher).pending()
    }

    /// Flush now, outside the policy
    pub fn flush(&self) -> Result<FlushReport, DispatcherError> {
        let _reentry = ReentryGuard::enter();
        lock(&self.dispatcher).flush()
    }

    /// Finalize explicitly
    pub fn finalize(mut self) {
        self.finalize_once();
    }

    fn finalize_once(&mut self) {
        if self.finalized {
            return;
        }
        self.finalized = true;

        let _reentry = ReentryGuard::enter();
        let mut dispatcher = lock(&self.dispatcher);
        dispatcher.finalize();
        debug!(sink = %dispatcher.name(), "Sink finalized");
    }
}

impl<T: SessionTransport> Drop for SinkGuard<T> {
    fn drop(&mut self) {
        self.finalize_once();
    }
}

impl<T: SessionTransport> fmt::Debug for SinkGuard<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkGuard")
            .field("finalized", &self.finalized)
            .field("metrics", &self.metrics.snapshot())
            .finish()
    }
}

/// Visitor to extract message from tracing event.
///
/// Events without a `message` field fall back to their other fields,
/// rendered as `name=value` the way the fmt layer prints them.
#[derive(Default)]
struct MessageVisitor {
    message: Option<String>,
    fields: String,
}

impl MessageVisitor {
    fn into_message(self) -> Option<String> {
        match self.message {
            Some(message) => Some(message),
            None if !self.fields.is_empty() => Some(self.fields),
            None => None,
        }
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.record_debug(field, &value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{value:?}"));
            return;
        }
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{}={value:?}", field.name());
    }
}
