//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON sink configuration files
//! - Validate configuration legality
//! - Generate `SinkConfig`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("sink.toml")).unwrap();
//! println!("Recipients: {:?}", config.recipients);
//! ```

mod parser;
mod validator;

pub use contracts::SinkConfig;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;
use tracing::{debug, instrument};

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    #[instrument(name = "config_load_from_path", fields(path = %path.display()))]
    pub fn load_from_path(path: &Path) -> Result<SinkConfig, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<SinkConfig, ContractError> {
        Self::parse_and_validate(content, format)
    }

    /// Run validation rules against an already built config
    ///
    /// Used after CLI overrides are applied on top of a loaded file.
    pub fn validate(config: &SinkConfig) -> Result<(), ContractError> {
        validator::validate(config)
    }

    /// Serialize SinkConfig to TOML string
    pub fn to_toml(config: &SinkConfig) -> Result<String, ContractError> {
        toml::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize SinkConfig to JSON string
    pub fn to_json(config: &SinkConfig) -> Result<String, ContractError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration content
    fn parse_and_validate(content: &str, format: ConfigFormat) -> Result<SinkConfig, ContractError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        debug!(
            sink = %config.name,
            recipients = config.recipients.len(),
            "Sink configuration loaded"
        );
        Ok(config)
    }
}
