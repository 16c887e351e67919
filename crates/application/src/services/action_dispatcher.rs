use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use scheduler_domain::entities::{Action, Task};
use scheduler_domain::value_objects::ActionType;
use scheduler_errors::{SchedulerError, SchedulerResult};

use crate::ports::ActionRunner;

/// 按动作类型选择执行器
///
/// 在启动时一次性构建，每种动作类型只能由一个执行器处理。
pub struct ActionDispatcher {
    runners: HashMap<ActionType, Arc<dyn ActionRunner>>,
}

impl std::fmt::Debug for ActionDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionDispatcher")
            .field("supported_types", &self.supported_types())
            .finish()
    }
}

impl ActionDispatcher {
    /// 两个执行器声明了相同的动作类型时返回配置错误
    pub fn new(runners: Vec<Arc<dyn ActionRunner>>) -> SchedulerResult<Self> {
        let mut registry: HashMap<ActionType, Arc<dyn ActionRunner>> = HashMap::new();

        for runner in runners {
            for action_type in runner.supported_action_types() {
                if let Some(existing) = registry.get(&action_type) {
                    return Err(SchedulerError::config_error(format!(
                        "动作类型 {} 同时由执行器 {} 和 {} 声明",
                        action_type,
                        existing.name(),
                        runner.name()
                    )));
                }
                debug!("注册动作执行器: {} -> {}", action_type, runner.name());
                registry.insert(action_type, Arc::clone(&runner));
            }
        }

        let dispatcher = Self { runners: registry };
        info!(
            "动作分发器已就绪, 支持的动作类型: {:?}",
            dispatcher.supported_types()
        );
        Ok(dispatcher)
    }

    pub fn supported_types(&self) -> Vec<ActionType> {
        let mut types: Vec<ActionType> = self.runners.keys().copied().collect();
        types.sort();
        types
    }

    pub async fn dispatch(&self, action: &Action, task: &Task) -> SchedulerResult<()> {
        let action_type = action.action_type();
        let runner = self.runners.get(&action_type).ok_or_else(|| {
            SchedulerError::internal(format!("没有执行器处理动作类型 {action_type}"))
        })?;

        runner.trigger(action, task).await
    }
}
