//! 配置校验模块
//!
//! 校验规则：
//! - derive 规则 (name / credentials / recipients 非空, port > 0)
//! - recipient 不能为空串或包含空白
//! - count 模式的 threshold >= 1
//! - line_format 设置时不能为空

use contracts::{ContractError, FlushPolicy, SinkConfig};
use validator::Validate;

/// 校验 SinkConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &SinkConfig) -> Result<(), ContractError> {
    validate_fields(config)?;
    validate_recipients(config)?;
    validate_flush_policy(config)?;
    validate_format(config)?;
    Ok(())
}

/// 执行 derive 规则
fn validate_fields(config: &SinkConfig) -> Result<(), ContractError> {
    config
        .validate()
        .map_err(|e| ContractError::config_validation(config.name.as_str(), e.to_string()))
}

/// 校验 recipient 列表 (允许重复)
fn validate_recipients(config: &SinkConfig) -> Result<(), ContractError> {
    for (idx, recipient) in config.recipients.iter().enumerate() {
        if recipient.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("recipients[{}]", idx),
                "recipient cannot be empty",
            ));
        }
        if recipient.chars().any(char::is_whitespace) {
            return Err(ContractError::config_validation(
                format!("recipients[{}]", idx),
                format!("recipient '{}' contains whitespace", recipient),
            ));
        }
    }
    Ok(())
}

/// 校验 flush 策略
fn validate_flush_policy(config: &SinkConfig) -> Result<(), ContractError> {
    if let FlushPolicy::Count { threshold: 0 } = config.flush {
        return Err(ContractError::config_validation(
            "flush.threshold",
            "threshold must be >= 1",
        ));
    }
    Ok(())
}

/// 校验格式配置
fn validate_format(config: &SinkConfig) -> Result<(), ContractError> {
    if let Some(ref line_format) = config.format.line_format {
        if line_format.is_empty() {
            return Err(ContractError::config_validation(
                "format.line_format",
                "line_format cannot be empty when set",
            ));
        }
    }
    if config.format.time_format.is_empty() {
        return Err(ContractError::config_validation(
            "format.time_format",
            "time_format cannot be empty",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ConfigVersion, Credentials, DebugConfig, FormatConfig, Severity};

    fn minimal_config() -> SinkConfig {
        SinkConfig {
            version: ConfigVersion::V1,
            name: "ops".into(),
            min_level: Severity::Info,
            credentials: Credentials::new("jabber.example.org", "logger", "secret"),
            recipients: vec!["oncall@example.org".into()],
            flush: FlushPolicy::Immediate,
            debug: DebugConfig::default(),
            format: FormatConfig::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&minimal_config()).is_ok());
    }

    #[test]
    fn test_duplicate_recipients_allowed() {
        let mut config = minimal_config();
        config.recipients.push("oncall@example.org".into());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_empty_recipient_entry() {
        let mut config = minimal_config();
        config.recipients.push("  ".into());
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("recipients[1]"));
    }

    #[test]
    fn test_missing_recipients() {
        let mut config = minimal_config();
        config.recipients.clear();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("recipient"));
    }

    #[test]
    fn test_empty_password() {
        let mut config = minimal_config();
        config.credentials.password.clear();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("password"));
    }

    #[test]
    fn test_zero_threshold() {
        let mut config = minimal_config();
        config.flush = FlushPolicy::Count { threshold: 0 };
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("flush.threshold"));
    }

    #[test]
    fn test_empty_line_format() {
        let mut config = minimal_config();
        config.format.line_format = Some(String::new());
        assert!(validate(&config).is_err());
    }
}
