// 基础配置验证

use crate::{ConfigError, ConfigResult};

pub trait ConfigValidator {
    fn validate(&self) -> ConfigResult<()>;
}

/// 验证工具函数
pub struct ValidationUtils;

impl ValidationUtils {
    /// 验证字符串非空
    pub fn validate_not_empty(value: &str, field_name: &str) -> ConfigResult<()> {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "{field_name} cannot be empty"
            )));
        }
        Ok(())
    }

    /// 验证超时值
    pub fn validate_timeout(timeout_seconds: u64, field_name: &str) -> ConfigResult<()> {
        if timeout_seconds == 0 {
            return Err(ConfigError::Validation(format!(
                "{field_name} must be greater than 0"
            )));
        }
        if timeout_seconds > 3600 {
            return Err(ConfigError::Validation(format!(
                "{field_name} must be less than or equal to 3600 seconds"
            )));
        }
        Ok(())
    }

    /// 验证计数值
    pub fn validate_count(count: usize, field_name: &str, max_value: usize) -> ConfigResult<()> {
        if count == 0 {
            return Err(ConfigError::Validation(format!(
                "{field_name} must be greater than 0"
            )));
        }
        if count > max_value {
            return Err(ConfigError::Validation(format!(
                "{field_name} must be less than or equal to {max_value}"
            )));
        }
        Ok(())
    }

    /// 验证监听地址，格式为 host:port
    pub fn validate_bind_address(address: &str, field_name: &str) -> ConfigResult<()> {
        Self::validate_not_empty(address, field_name)?;
        let port = address
            .rsplit_once(':')
            .and_then(|(_, port)| port.parse::<u16>().ok());
        match port {
            Some(0) | None => Err(ConfigError::Validation(format!(
                "{field_name} must be in host:port form with a non-zero port"
            ))),
            Some(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_not_empty() {
        assert!(ValidationUtils::validate_not_empty("x", "f").is_ok());
        assert!(ValidationUtils::validate_not_empty("   ", "f").is_err());
    }

    #[test]
    fn test_validate_timeout_and_count() {
        assert!(ValidationUtils::validate_timeout(30, "t").is_ok());
        assert!(ValidationUtils::validate_timeout(0, "t").is_err());
        assert!(ValidationUtils::validate_timeout(3601, "t").is_err());

        assert!(ValidationUtils::validate_count(5, "c", 10).is_ok());
        assert!(ValidationUtils::validate_count(0, "c", 10).is_err());
        assert!(ValidationUtils::validate_count(11, "c", 10).is_err());
    }

    #[test]
    fn test_validate_bind_address() {
        assert!(ValidationUtils::validate_bind_address("0.0.0.0:8080", "a").is_ok());
        assert!(ValidationUtils::validate_bind_address("localhost", "a").is_err());
        assert!(ValidationUtils::validate_bind_address("127.0.0.1:0", "a").is_err());
    }
}
