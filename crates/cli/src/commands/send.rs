//! `send` command implementation.

use std::convert::Infallible;
use std::time::Instant;

use anyhow::{Context, Result};
use contracts::{LogRecord, SinkConfig};
use dispatcher::{DispatcherBuilder, LogTransport};
use observability::DeliverySummary;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::cli::SendArgs;
use crate::commands::describe_policy;

/// Execute the `send` command
pub async fn run_send(args: &SendArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let mut config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    apply_overrides(&mut config, args);
    config_loader::ConfigLoader::validate(&config)
        .context("Configuration invalid after applying CLI overrides")?;

    info!(
        sink = %config.name,
        host = %config.credentials.host,
        port = config.credentials.port,
        recipients = config.recipients.len(),
        policy = %describe_policy(&config.flush),
        "Configuration loaded"
    );

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let mut dispatcher = DispatcherBuilder::from_config(&config)
        .build(|debug| Ok::<_, Infallible>(LogTransport::new(&config.name, *debug)))
        .context("Failed to create dispatcher")?;

    if !dispatcher.accepts(args.level) {
        warn!(
            level = %args.level,
            min_level = %dispatcher.min_level(),
            "Submit level is below the sink's minimum, lines will be ignored"
        );
    }

    let started = Instant::now();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut skipped = 0u64;

    info!("Reading records from stdin...");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line.context("Failed to read stdin")? {
                    Some(line) if line.trim().is_empty() => {}
                    Some(line) => {
                        if !dispatcher.accepts(args.level) {
                            skipped += 1;
                            continue;
                        }
                        let record = LogRecord::new(args.level, line).with_ident(&args.ident);
                        dispatcher.submit(&record);
                    }
                    None => {
                        info!("End of input");
                        break;
                    }
                }
            }
            _ = &mut shutdown => {
                warn!("Received shutdown signal, finalizing sink...");
                break;
            }
        }
    }

    dispatcher.finalize();

    let snapshot = dispatcher.metrics().snapshot();
    if args.metrics_port != 0 {
        observability::record_snapshot(dispatcher.name(), &snapshot);
    }

    let summary = DeliverySummary::new(dispatcher.name(), snapshot, started.elapsed());
    info!(
        submitted = snapshot.submitted,
        flushes = snapshot.flush_count,
        dropped = snapshot.dropped_messages,
        skipped,
        "Send finished"
    );
    println!("{summary}");

    if summary.has_losses() {
        warn!("Some records were not delivered, see fallback reports on stderr");
    }

    Ok(())
}

/// Apply CLI overrides on top of the loaded configuration
fn apply_overrides(config: &mut SinkConfig, args: &SendArgs) {
    if let Some(ref host) = args.host {
        info!(host = %host, "Overriding XMPP host from CLI");
        config.credentials.host = host.clone();
    }
    if let Some(port) = args.port {
        info!(port = %port, "Overriding XMPP port from CLI");
        config.credentials.port = port;
    }
    if let Some(ref password) = args.password {
        info!("Overriding XMPP password from CLI");
        config.credentials.password = password.clone();
    }
    if !args.recipients.is_empty() {
        info!(recipients = args.recipients.len(), "Overriding recipients from CLI");
        config.recipients = args.recipients.clone();
    }
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use config_loader::{ConfigFormat, ConfigLoader};

    const CONFIG: &str = r#"
name = "ops"
recipients = ["oncall@example.org"]

[credentials]
host = "jabber.example.org"
username = "logger"
password = "secret"
"#;

    fn send_args(extra: &[&str]) -> SendArgs {
        let mut argv = vec!["xmpp-log-sink", "send"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Send(args) => args,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_no_overrides_keeps_config() {
        let mut config = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();
        apply_overrides(&mut config, &send_args(&[]));

        assert_eq!(config.credentials.host, "jabber.example.org");
        assert_eq!(config.recipients, vec!["oncall@example.org"]);
    }

    #[test]
    fn test_overrides_replace_fields() {
        let mut config = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();
        apply_overrides(
            &mut config,
            &send_args(&[
                "--host",
                "xmpp.internal",
                "--port",
                "5223",
                "--password",
                "rotated",
                "-r",
                "a@xmpp.internal",
            ]),
        );

        assert_eq!(config.credentials.host, "xmpp.internal");
        assert_eq!(config.credentials.port, 5223);
        assert_eq!(config.credentials.password, "rotated");
        assert_eq!(config.recipients, vec!["a@xmpp.internal"]);
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_empty_host_override_fails_validation() {
        let mut config = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();
        apply_overrides(&mut config, &send_args(&["--host", ""]));

        assert!(ConfigLoader::validate(&config).is_err());
    }
}
