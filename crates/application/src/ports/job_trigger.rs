use async_trait::async_trait;

use scheduler_errors::SchedulerResult;

/// Interface for requesting a manual execution of a job
#[async_trait]
pub trait JobTrigger: Send + Sync {
    async fn execute_job(&self, job_key: &str) -> SchedulerResult<()>;
}
