use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{
    api_observability::{ApiConfig, ObservabilityConfig},
    database::DatabaseConfig,
    scheduler::SchedulerConfig,
};
use crate::validation::ConfigValidator;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub scheduler: SchedulerConfig,
    pub api: ApiConfig,
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// 按 默认值 -> 配置文件 -> 环境变量 的顺序加载配置
    ///
    /// 环境变量形如 `SCHEDULER_DATABASE__URL`，段与字段之间使用双下划线。
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let defaults = AppConfig::default();
        let mut builder = ConfigBuilder::builder()
            .set_default("database.backend", "sqlite")?
            .set_default("database.url", defaults.database.url.as_str())?
            .set_default("database.max_connections", defaults.database.max_connections)?
            .set_default("database.min_connections", defaults.database.min_connections)?
            .set_default(
                "database.connection_timeout_seconds",
                defaults.database.connection_timeout_seconds,
            )?
            .set_default("scheduler.tick_interval_ms", defaults.scheduler.tick_interval_ms)?
            .set_default("api.enabled", defaults.api.enabled)?
            .set_default("api.bind_address", defaults.api.bind_address.as_str())?
            .set_default("api.cors_enabled", defaults.api.cors_enabled)?
            .set_default(
                "api.request_timeout_seconds",
                defaults.api.request_timeout_seconds,
            )?
            .set_default("observability.log_level", defaults.observability.log_level.as_str())?
            .set_default("observability.log_format", "pretty")?
            .set_default(
                "observability.metrics_enabled",
                defaults.observability.metrics_enabled,
            )?;

        if let Some(path) = config_path {
            if Path::new(path).exists() {
                builder = builder.add_source(File::new(path, FileFormat::Toml));
            } else {
                return Err(anyhow::anyhow!("配置文件不存在: {}", path));
            }
        } else {
            let default_paths = ["config/scheduler.toml", "scheduler.toml"];
            if let Some(path) = default_paths.iter().find(|p| Path::new(p).exists()) {
                builder = builder.add_source(File::new(path, FileFormat::Toml));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("SCHEDULER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder
            .build()
            .context("构建配置失败")?
            .try_deserialize()
            .context("反序列化配置失败")?;

        config.validate()?;

        Ok(config)
    }

    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(toml_str).context("解析TOML配置失败")?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("序列化配置为TOML失败")
    }
}

impl ConfigValidator for AppConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        self.database.validate()?;
        self.scheduler.validate()?;
        self.api.validate()?;
        self.observability.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DatabaseBackend, LogFormat};
    use std::io::Write;

    const SAMPLE: &str = r#"
[database]
backend = "memory"
url = ""
max_connections = 5
min_connections = 1
connection_timeout_seconds = 30

[scheduler]
tick_interval_ms = 250

[api]
enabled = true
bind_address = "127.0.0.1:9000"
cors_enabled = false
request_timeout_seconds = 10

[observability]
log_level = "debug"
log_format = "json"
metrics_enabled = false
"#;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.database.backend, DatabaseBackend::Sqlite);
        assert_eq!(config.scheduler.tick_interval_ms, 1000);
        assert_eq!(config.api.bind_address, "0.0.0.0:8080");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_app_config_from_toml() {
        let config = AppConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.database.backend, DatabaseBackend::Memory);
        assert_eq!(config.scheduler.tick_interval_ms, 250);
        assert_eq!(config.api.bind_address, "127.0.0.1:9000");
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn test_app_config_toml_roundtrip_keeps_values() {
        let config = AppConfig::from_toml(SAMPLE).unwrap();
        let rendered = config.to_toml().unwrap();
        let reparsed = AppConfig::from_toml(&rendered).unwrap();
        assert_eq!(reparsed.api.bind_address, config.api.bind_address);
        assert_eq!(
            reparsed.scheduler.tick_interval_ms,
            config.scheduler.tick_interval_ms
        );
    }

    #[test]
    fn test_invalid_toml_rejected() {
        let invalid = SAMPLE.replace("tick_interval_ms = 250", "tick_interval_ms = 0");
        assert!(AppConfig::from_toml(&invalid).is_err());
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(AppConfig::load(Some("/definitely/not/here.toml")).is_err());
    }

    #[test]
    fn test_load_file_then_environment() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.scheduler.tick_interval_ms, 250);
        assert_eq!(config.observability.log_level, "debug");

        std::env::set_var("SCHEDULER_API__BIND_ADDRESS", "127.0.0.1:9555");
        let config = AppConfig::load(Some(&path)).unwrap();
        std::env::remove_var("SCHEDULER_API__BIND_ADDRESS");
        assert_eq!(config.api.bind_address, "127.0.0.1:9555");
    }
}
