//! 领域仓储抽象
//!
//! 定义作业与任务的数据访问接口，遵循依赖倒置原则

use async_trait::async_trait;
use scheduler_errors::SchedulerResult;

use crate::entities::{Job, JobFilter, Task, TaskFilter};

/// 作业仓储抽象
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// 键已存在时返回 `KeyAlreadyInUse`
    async fn create(&self, job: &Job) -> SchedulerResult<Job>;
    async fn find_by_key(&self, key: &str) -> SchedulerResult<Option<Job>>;
    async fn exists(&self, key: &str) -> SchedulerResult<bool>;
    /// 作业不存在时返回 `JobNotFound`
    async fn update(&self, job: &Job) -> SchedulerResult<Job>;
    /// 同时删除作业的动作，返回是否删除了记录
    async fn delete(&self, key: &str) -> SchedulerResult<bool>;
    async fn find_by_filter(&self, filter: &JobFilter) -> SchedulerResult<Vec<Job>>;
    /// 已启用且配置了 CRON 表达式的作业
    async fn find_scheduled(&self) -> SchedulerResult<Vec<Job>>;
}

/// 任务仓储抽象
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// 分配新的 id 并返回持久化后的任务
    async fn create(&self, task: &Task) -> SchedulerResult<Task>;
    async fn find_by_id(&self, id: i64) -> SchedulerResult<Option<Task>>;
    /// 任务已被删除时返回 `TaskNotFound`
    async fn update(&self, task: &Task) -> SchedulerResult<Task>;
    /// 按 id 升序返回
    async fn find_by_filter(&self, filter: &TaskFilter) -> SchedulerResult<Vec<Task>>;
    async fn find_latest_by_job_key(&self, job_key: &str) -> SchedulerResult<Option<Task>>;
    /// 返回删除的任务数
    async fn delete_by_job_key(&self, job_key: &str) -> SchedulerResult<u64>;
}
