//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::SinkConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::commands::describe_policy;

const REDACTED: &str = "********";

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    name: String,
    min_level: String,
    server: ServerInfo,
    recipients: Vec<String>,
    flush: FlushInfo,
    format: FormatInfo,
    debug: DebugInfo,
}

#[derive(Serialize)]
struct ServerInfo {
    host: String,
    port: u16,
    username: String,
    password: &'static str,
    resource: String,
}

#[derive(Serialize)]
struct FlushInfo {
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    threshold: Option<usize>,
}

#[derive(Serialize)]
struct FormatInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    line_format: Option<String>,
    time_format: String,
}

#[derive(Serialize)]
struct DebugInfo {
    enabled: bool,
    verbosity: String,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&config);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&config);
    }

    Ok(())
}

fn build_config_info(config: &SinkConfig) -> ConfigInfo {
    let credentials = &config.credentials;

    ConfigInfo {
        version: format!("{:?}", config.version),
        name: config.name.clone(),
        min_level: config.min_level.to_string(),
        server: ServerInfo {
            host: credentials.host.clone(),
            port: credentials.port,
            username: credentials.username.clone(),
            password: REDACTED,
            resource: credentials.resource.clone(),
        },
        recipients: config.recipients.clone(),
        flush: FlushInfo {
            description: describe_policy(&config.flush),
            threshold: config.flush.threshold(),
        },
        format: FormatInfo {
            line_format: config.format.line_format.clone(),
            time_format: config.format.time_format.clone(),
        },
        debug: DebugInfo {
            enabled: config.debug.enabled,
            verbosity: format!("{:?}", config.debug.verbosity).to_lowercase(),
        },
    }
}

fn print_config_info(config: &SinkConfig) {
    let credentials = &config.credentials;

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               XMPP Log Sink Configuration                    ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📍 Sink");
    println!("   ├─ Version: {:?}", config.version);
    println!("   ├─ Name: {}", config.name);
    println!("   └─ Min level: {}", config.min_level);

    println!("\n🔐 Session");
    println!("   ├─ Server: {}:{}", credentials.host, credentials.port);
    println!("   ├─ Account: {}/{}", credentials.username, credentials.resource);
    println!("   └─ Password: {}", REDACTED);

    println!("\n📤 Recipients ({})", config.recipients.len());
    for (i, recipient) in config.recipients.iter().enumerate() {
        let is_last = i == config.recipients.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        println!("   {} {}", prefix, recipient);
    }

    println!("\n⚙️  Delivery");
    println!("   ├─ Flush: {}", describe_policy(&config.flush));
    match &config.format.line_format {
        Some(template) => println!("   ├─ Line format: {:?}", template),
        None => println!("   ├─ Line format: (raw message)"),
    }
    println!("   ├─ Time format: {}", config.format.time_format);
    if config.debug.enabled {
        println!("   └─ Debug: {:?}", config.debug.verbosity);
    } else {
        println!("   └─ Debug: off");
    }

    println!();
}
