//! `validate` command implementation.

use std::collections::HashSet;

use anyhow::{Context, Result};
use contracts::{FlushPolicy, SinkConfig, TransportVerbosity};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;
use crate::commands::describe_policy;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    name: String,
    server: String,
    min_level: String,
    recipient_count: usize,
    flush_policy: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    name: config.name.clone(),
                    server: format!("{}:{}", config.credentials.host, config.credentials.port),
                    min_level: config.min_level.to_string(),
                    recipient_count: config.recipients.len(),
                    flush_policy: describe_policy(&config.flush),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &SinkConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.flush == FlushPolicy::Manual {
        warnings.push(
            "flush.mode is manual - records are only delivered on explicit flush or at exit"
                .to_string(),
        );
    }

    // Duplicates are kept and each receives its own copy
    let mut seen = HashSet::new();
    for recipient in &config.recipients {
        if !seen.insert(recipient.as_str()) {
            warnings.push(format!(
                "Recipient '{}' is listed more than once and will receive duplicate messages",
                recipient
            ));
        }
    }

    if config.debug.allows(TransportVerbosity::Verbose) {
        warnings.push("debug.verbosity is verbose - message bodies will be logged".to_string());
    }

    if let Some(ref template) = config.format.line_format {
        if !template.contains("{message}") {
            warnings.push("format.line_format has no {message} placeholder".to_string());
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Sink: {}", summary.name);
            println!("  Server: {}", summary.server);
            println!("  Min level: {}", summary.min_level);
            println!("  Recipients: {}", summary.recipient_count);
            println!("  Flush: {}", summary.flush_policy);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
