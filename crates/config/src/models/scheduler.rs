use crate::validation::ConfigValidator;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// 触发器检查到期作业的间隔
    pub tick_interval_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
        }
    }
}

impl ConfigValidator for SchedulerConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        if !(10..=60_000).contains(&self.tick_interval_ms) {
            return Err(crate::ConfigError::Validation(
                "scheduler.tick_interval_ms must be between 10 and 60000".to_string(),
            ));
        }
        Ok(())
    }
}
