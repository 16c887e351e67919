use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use scheduler_domain::entities::{Action, ActionPayload, Task};
use scheduler_domain::value_objects::ActionType;
use scheduler_errors::SchedulerResult;

use crate::ports::{ActionRunner, JobTrigger};

/// 执行 `RUN_JOB` 动作：请求目标作业执行一次，不等待其完成
pub struct RunJobActionRunner {
    job_trigger: Arc<dyn JobTrigger>,
}

impl RunJobActionRunner {
    pub fn new(job_trigger: Arc<dyn JobTrigger>) -> Self {
        Self { job_trigger }
    }
}

#[async_trait]
impl ActionRunner for RunJobActionRunner {
    fn name(&self) -> &str {
        "run-job"
    }

    fn supported_action_types(&self) -> Vec<ActionType> {
        vec![ActionType::RunJob]
    }

    async fn trigger(&self, action: &Action, task: &Task) -> SchedulerResult<()> {
        let ActionPayload::RunJob { target_job_key } = &action.payload;
        debug!(
            "任务 {} (作业 {}) 触发作业 {}",
            task.id, task.job_key, target_job_key
        );
        self.job_trigger.execute_job(target_job_key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use mockall::predicate::eq;
    use scheduler_domain::value_objects::ConditionType;
    use scheduler_errors::SchedulerError;

    mock! {
        pub Trigger {}

        #[async_trait]
        impl JobTrigger for Trigger {
            async fn execute_job(&self, job_key: &str) -> SchedulerResult<()>;
        }
    }

    #[tokio::test]
    async fn test_trigger_executes_target_job_once() {
        let mut trigger = MockTrigger::new();
        trigger
            .expect_execute_job()
            .with(eq("JOB_B"))
            .times(1)
            .returning(|_| Ok(()));

        let runner = RunJobActionRunner::new(Arc::new(trigger));
        assert_eq!(runner.supported_action_types(), vec![ActionType::RunJob]);

        let action = Action::run_job(ConditionType::OnSuccess, "JOB_B");
        runner.trigger(&action, &Task::new("JOB_A")).await.unwrap();
    }

    #[tokio::test]
    async fn test_trigger_propagates_trigger_error() {
        let mut trigger = MockTrigger::new();
        trigger
            .expect_execute_job()
            .returning(|key| Err(SchedulerError::job_not_found(key)));

        let runner = RunJobActionRunner::new(Arc::new(trigger));
        let action = Action::run_job(ConditionType::OnFailure, "MISSING_JOB");
        let result = runner.trigger(&action, &Task::new("JOB_A")).await;
        assert!(matches!(result, Err(SchedulerError::JobNotFound { .. })));
    }
}
