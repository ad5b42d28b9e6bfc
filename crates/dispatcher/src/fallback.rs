//! Fallback failure reporting
//!
//! Flush-time errors cannot go through the sink that failed. They may also be
//! raised while a tracing event is being dispatched, where nested events are
//! discarded, so the reporter writes its lines straight to a `MakeWriter`
//! (stderr by default) instead of emitting events.

use std::fmt;
use std::io::Write;

use chrono::{SecondsFormat, Utc};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;

use crate::error::DispatcherError;

/// Per-dispatcher error reporter
pub struct FallbackReporter {
    writer: BoxMakeWriter,
    reported: u64,
}

impl FallbackReporter {
    /// Report to stderr
    pub fn stderr() -> Self {
        Self::with_writer(std::io::stderr)
    }

    /// Report to a custom writer
    pub fn with_writer<W>(make_writer: W) -> Self
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        Self {
            writer: BoxMakeWriter::new(make_writer),
            reported: 0,
        }
    }

    /// Reports written so far
    pub fn reported(&self) -> u64 {
        self.reported
    }

    /// Write one error line describing `error`
    pub fn report(&mut self, sink: &str, error: &DispatcherError) {
        self.reported += 1;
        let line = format!(
            "{} ERROR xmpp_sink: {error} sink={sink}\n",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
        );
        // Nowhere left to report a failed write.
        let _ = self.writer.make_writer().write_all(line.as_bytes());
    }
}

impl Default for FallbackReporter {
    fn default() -> Self {
        Self::stderr()
    }
}

impl fmt::Debug for FallbackReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackReporter")
            .field("reported", &self.reported)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl io::Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[test]
    fn test_report_line() {
        let buf = SharedBuf::default();
        let writer = buf.clone();
        let mut reporter = FallbackReporter::with_writer(move || writer.clone());
        assert!(buf.contents().is_empty());

        reporter.report(
            "ops",
            &DispatcherError::Auth {
                code: "not-authorized".into(),
                detail: "bad password".into(),
            },
        );

        assert_eq!(reporter.reported(), 1);
        let output = buf.contents();
        assert!(output.ends_with(
            " ERROR xmpp_sink: authentication rejected (not-authorized): bad password sink=ops\n"
        ));
    }

    #[test]
    fn test_one_line_per_report() {
        let buf = SharedBuf::default();
        let writer = buf.clone();
        let mut reporter = FallbackReporter::with_writer(move || writer.clone());

        reporter.report(
            "ops",
            &DispatcherError::Connect {
                host: "xmpp.invalid".into(),
                port: 5222,
                message: "connection refused".into(),
            },
        );
        reporter.report(
            "ops",
            &DispatcherError::Connect {
                host: "xmpp.invalid".into(),
                port: 5222,
                message: "connection refused".into(),
            },
        );

        assert_eq!(buf.contents().lines().count(), 2);
        assert_eq!(buf.contents().matches("connection refused").count(), 2);
    }

    #[test]
    fn test_reports_inside_event_dispatch() {
        use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

        struct ReportingLayer(Mutex<FallbackReporter>);

        impl<S: tracing::Subscriber> Layer<S> for ReportingLayer {
            fn on_event(&self, _event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
                self.0.lock().unwrap().report(
                    "ops",
                    &DispatcherError::Send {
                        recipient: "a@xmpp.test".into(),
                        reason: "rejected".into(),
                    },
                );
            }
        }

        let buf = SharedBuf::default();
        let writer = buf.clone();
        let layer = ReportingLayer(Mutex::new(FallbackReporter::with_writer(move || {
            writer.clone()
        })));
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || tracing::error!("trigger"));

        assert!(buf.contents().contains("send to 'a@xmpp.test' failed: rejected"));
    }
}
