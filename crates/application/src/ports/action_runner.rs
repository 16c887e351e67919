use async_trait::async_trait;

use scheduler_domain::entities::{Action, Task};
use scheduler_domain::value_objects::ActionType;
use scheduler_errors::SchedulerResult;

/// Interface for executing one kind of action
///
/// Each runner declares the action types it handles. A runner receiving an
/// action whose payload it cannot interpret returns `SchedulerError::Internal`.
#[async_trait]
pub trait ActionRunner: Send + Sync {
    fn name(&self) -> &str;
    fn supported_action_types(&self) -> Vec<ActionType>;
    /// `task` is the task whose status change matched the action's condition
    async fn trigger(&self, action: &Action, task: &Task) -> SchedulerResult<()>;
}
