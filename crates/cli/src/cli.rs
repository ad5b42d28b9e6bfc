//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use contracts::Severity;
use std::path::PathBuf;

/// XMPP Log Sink - buffered delivery of log records to XMPP recipients
#[derive(Parser, Debug)]
#[command(
    name = "xmpp-log-sink",
    author,
    version,
    about = "Buffered XMPP log sink",
    long_about = "Buffers log records and delivers them to XMPP recipients.\n\n\
                  Each flush opens a session, authenticates, sends the buffered \n\
                  records as one message to every recipient and disconnects."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "XMPP_SINK_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "XMPP_SINK_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit stdin lines as log records
    Send(SendArgs),

    /// Validate configuration file without sending
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `send` command
#[derive(Parser, Debug, Clone)]
pub struct SendArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "sink.toml", env = "XMPP_SINK_CONFIG")]
    pub config: PathBuf,

    /// Override XMPP server host from configuration
    #[arg(long, env = "XMPP_HOST")]
    pub host: Option<String>,

    /// Override XMPP server port from configuration
    #[arg(long, env = "XMPP_PORT")]
    pub port: Option<u16>,

    /// Override account password from configuration
    #[arg(long, env = "XMPP_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Replace configured recipients (repeatable)
    #[arg(short, long = "recipient", value_name = "JID")]
    pub recipients: Vec<String>,

    /// Severity assigned to every submitted line
    #[arg(short, long, default_value = "info")]
    pub level: Severity,

    /// Identifier attached to every record
    #[arg(long, default_value = "stdin")]
    pub ident: String,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "XMPP_SINK_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "sink.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "sink.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_overrides() {
        let cli = Cli::try_parse_from([
            "xmpp-log-sink",
            "send",
            "-c",
            "ops.toml",
            "--host",
            "xmpp.internal",
            "-r",
            "a@xmpp.internal",
            "-r",
            "b@xmpp.internal",
            "--level",
            "warning",
        ])
        .unwrap();

        let Commands::Send(args) = cli.command else {
            panic!("expected send");
        };
        assert_eq!(args.config, PathBuf::from("ops.toml"));
        assert_eq!(args.host.as_deref(), Some("xmpp.internal"));
        assert_eq!(args.recipients.len(), 2);
        assert_eq!(args.level, Severity::Warn);
    }

    #[test]
    fn test_unknown_level_rejected() {
        let result = Cli::try_parse_from(["xmpp-log-sink", "send", "--level", "loud"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["xmpp-log-sink", "-q", "-v", "info"]);
        assert!(result.is_err());
    }
}
