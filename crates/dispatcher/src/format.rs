//! Record to message-body rendering

use std::fmt::Write;

use chrono::{DateTime, Utc};
use contracts::{FormatConfig, LogRecord, DEFAULT_TIME_FORMAT};

/// Renders a `LogRecord` into the text that is buffered
#[derive(Debug, Clone)]
pub struct LineFormat {
    template: Option<String>,
    time_format: String,
}

impl Default for LineFormat {
    fn default() -> Self {
        Self::raw()
    }
}

impl LineFormat {
    /// Message text only
    pub fn raw() -> Self {
        Self {
            template: None,
            time_format: DEFAULT_TIME_FORMAT.to_string(),
        }
    }

    /// Template with `{message}`, `{level}`, `{ident}`, `{timestamp}`
    pub fn template(template: impl Into<String>) -> Self {
        Self {
            template: Some(template.into()),
            time_format: DEFAULT_TIME_FORMAT.to_string(),
        }
    }

    pub fn with_time_format(mut self, time_format: impl Into<String>) -> Self {
        self.time_format = time_format.into();
        self
    }

    pub fn from_config(config: &FormatConfig) -> Self {
        Self {
            template: config.line_format.clone(),
            time_format: config.time_format.clone(),
        }
    }

    pub fn render(&self, record: &LogRecord) -> String {
        let Some(template) = self.template.as_deref() else {
            return record.message.clone();
        };

        // Single pass: substituted values are never scanned again.
        let mut line = String::with_capacity(template.len() + record.message.len());
        let mut rest = template;
        while let Some(start) = rest.find('{') {
            line.push_str(&rest[..start]);
            let tail = &rest[start..];
            let Some(end) = tail.find('}') else {
                rest = tail;
                break;
            };
            match &tail[1..end] {
                "message" => line.push_str(&record.message),
                "level" => line.push_str(record.level.as_str()),
                "ident" => line.push_str(&record.ident),
                "timestamp" => line.push_str(&self.timestamp(&record.timestamp)),
                _ => {
                    // Not a placeholder, keep the brace and rescan after it.
                    line.push('{');
                    rest = &tail[1..];
                    continue;
                }
            }
            rest = &tail[end + 1..];
        }
        line.push_str(rest);
        line
    }

    fn timestamp(&self, ts: &DateTime<Utc>) -> String {
        let mut out = String::new();
        if write!(out, "{}", ts.format(&self.time_format)).is_err() {
            return ts.to_rfc3339();
        }
        out
    }
}
