use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scheduler_errors::SchedulerResult;

/// Interface for the live, time-based trigger subsystem
///
/// Triggers are keyed by job key. The registry owns cron grammar and timing;
/// it persists nothing and is rebuilt from the job store on startup.
#[async_trait]
pub trait TriggerRegistry: Send + Sync {
    /// Returns `InvalidCron` when the expression cannot be parsed
    fn validate_expression(&self, cron_expression: &str) -> SchedulerResult<()>;
    /// Installs or replaces the trigger for `job_key`
    async fn register(
        &self,
        job_key: &str,
        cron_expression: &str,
        paused: bool,
    ) -> SchedulerResult<()>;
    /// Returns `false` when no trigger was installed
    async fn unregister(&self, job_key: &str) -> SchedulerResult<bool>;
    async fn pause(&self, job_key: &str) -> SchedulerResult<bool>;
    async fn resume(&self, job_key: &str) -> SchedulerResult<bool>;
    /// Fires one execution immediately, regardless of trigger state
    async fn fire_now(&self, job_key: &str) -> SchedulerResult<()>;
    async fn is_scheduled(&self, job_key: &str) -> bool;
    async fn is_paused(&self, job_key: &str) -> bool;
    /// `None` when the trigger is absent or paused
    async fn next_fire_time(&self, job_key: &str) -> Option<DateTime<Utc>>;
    async fn scheduled_keys(&self) -> Vec<String>;
}
