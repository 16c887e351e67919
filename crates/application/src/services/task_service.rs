use std::sync::Arc;
use tracing::{debug, info, instrument};

use scheduler_domain::entities::{Job, StatusUpdate, Task, TaskFilter};
use scheduler_domain::repositories::{JobRepository, TaskRepository};
use scheduler_errors::{SchedulerError, SchedulerResult};
use scheduler_observability::{MetricsCollector, StructuredLogger};

use crate::services::action_dispatcher::ActionDispatcher;

/// 状态更新及动作分发的结果
#[derive(Debug, Clone)]
pub struct StatusUpdateOutcome {
    pub task: Task,
    /// 条件匹配的动作数
    pub matched: usize,
    pub dispatched: usize,
    pub failed: usize,
}

/// 任务生命周期管理，以及状态变化到动作分发的转换
pub struct TaskService {
    task_repo: Arc<dyn TaskRepository>,
    job_repo: Arc<dyn JobRepository>,
    dispatcher: Arc<ActionDispatcher>,
}

impl TaskService {
    pub fn new(
        task_repo: Arc<dyn TaskRepository>,
        job_repo: Arc<dyn JobRepository>,
        dispatcher: Arc<ActionDispatcher>,
    ) -> Self {
        Self {
            task_repo,
            job_repo,
            dispatcher,
        }
    }

    pub async fn create_task(&self, job: &Job) -> SchedulerResult<Task> {
        let task = self.task_repo.create(&Task::new(&job.key)).await?;
        MetricsCollector::record_task_created();
        info!("为作业 {} 创建了新的任务 {}", job.key, task.id);
        Ok(task)
    }

    /// 持久化任务修改，不触发动作
    pub async fn save_task(&self, task: &Task) -> SchedulerResult<Task> {
        self.task_repo.update(task).await
    }

    /// 更新任务状态，并分发所属作业中条件匹配的动作
    ///
    /// 状态写入成功后即返回成功。单个动作分发失败只记录日志和指标，
    /// 不影响后续动作，也不会让本次调用失败。
    #[instrument(skip(self, update), fields(task.status = %update.status))]
    pub async fn update_status(
        &self,
        job_key: &str,
        task_id: i64,
        update: StatusUpdate,
    ) -> SchedulerResult<StatusUpdateOutcome> {
        update.validate()?;

        let mut task = self.get_task(job_key, task_id).await?;
        let job = self
            .job_repo
            .find_by_key(job_key)
            .await?
            .ok_or_else(|| SchedulerError::job_not_found(job_key))?;

        let previous = task.status;
        task.apply_status(&update);
        let task = self.task_repo.update(&task).await?;
        MetricsCollector::record_status_update(task.status.as_str());

        let matching = job.actions_matching(task.status);
        StructuredLogger::log_task_status_updated(
            job_key,
            task.id,
            previous.as_str(),
            task.status.as_str(),
            matching.len(),
        );

        let mut outcome = StatusUpdateOutcome {
            matched: matching.len(),
            dispatched: 0,
            failed: 0,
            task: task.clone(),
        };

        for (position, action) in matching.into_iter().enumerate() {
            let action_type = action.action_type();
            match self.dispatcher.dispatch(action, &task).await {
                Ok(()) => {
                    outcome.dispatched += 1;
                    MetricsCollector::record_action_dispatched(action_type.as_str());
                    StructuredLogger::log_action_dispatched(
                        job_key,
                        task.id,
                        action_type.as_str(),
                        position,
                    );
                }
                Err(e) => {
                    outcome.failed += 1;
                    MetricsCollector::record_action_dispatch_failure(action_type.as_str());
                    StructuredLogger::log_action_dispatch_failed(
                        job_key,
                        task.id,
                        action_type.as_str(),
                        position,
                        &e.to_string(),
                    );
                }
            }
        }

        Ok(outcome)
    }

    /// 按作业键和任务 id 获取任务，任务不属于该作业时视为不存在
    pub async fn get_task(&self, job_key: &str, task_id: i64) -> SchedulerResult<Task> {
        match self.task_repo.find_by_id(task_id).await? {
            Some(task) if task.belongs_to(job_key) => Ok(task),
            Some(task) => {
                debug!(
                    "任务 {} 属于作业 {}，而不是 {}",
                    task_id, task.job_key, job_key
                );
                Err(SchedulerError::task_not_found(job_key, task_id))
            }
            None => Err(SchedulerError::task_not_found(job_key, task_id)),
        }
    }

    pub async fn get_tasks(&self, job_key: &str) -> SchedulerResult<Vec<Task>> {
        self.task_repo
            .find_by_filter(&TaskFilter::for_job(job_key))
            .await
    }

    pub async fn search_tasks(&self, filter: &TaskFilter) -> SchedulerResult<Vec<Task>> {
        self.task_repo.find_by_filter(filter).await
    }

    /// 作业最近创建的任务；给定 `task_id` 时返回该任务并校验其归属
    pub async fn get_latest_task(
        &self,
        job_key: &str,
        task_id: Option<i64>,
    ) -> SchedulerResult<Option<Task>> {
        match task_id {
            Some(id) => self.get_task(job_key, id).await.map(Some),
            None => self.task_repo.find_latest_by_job_key(job_key).await,
        }
    }

    pub async fn delete_all_by_job_key(&self, job_key: &str) -> SchedulerResult<u64> {
        let deleted = self.task_repo.delete_by_job_key(job_key).await?;
        debug!("删除了作业 {} 的 {} 个任务", job_key, deleted);
        Ok(deleted)
    }
}
