use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use scheduler_domain::entities::{Job, JobDefinition, JobFilter, JobPatch, Task};
use scheduler_domain::events::FireSource;
use scheduler_domain::repositories::JobRepository;
use scheduler_errors::{SchedulerError, SchedulerResult};
use scheduler_observability::{MetricsCollector, StructuredLogger};

use crate::ports::JobTrigger;
use crate::services::scheduler_service::{ScheduleState, SchedulerService};
use crate::services::task_service::TaskService;

/// 作业生命周期编排
///
/// 每次影响调度的修改都先写存储，再通过 [`SchedulerService`] 同步触发器。
pub struct JobService {
    job_repo: Arc<dyn JobRepository>,
    task_service: Arc<TaskService>,
    scheduler: Arc<SchedulerService>,
}

impl JobService {
    pub fn new(
        job_repo: Arc<dyn JobRepository>,
        task_service: Arc<TaskService>,
        scheduler: Arc<SchedulerService>,
    ) -> Self {
        Self {
            job_repo,
            task_service,
            scheduler,
        }
    }

    #[instrument(skip(self, definition), fields(job.key = %definition.key))]
    pub async fn create_job(&self, definition: JobDefinition) -> SchedulerResult<Job> {
        let job = Job::new(definition);
        job.validate()?;
        if let Some(cron) = &job.cron_expression {
            self.scheduler.validate_cron(cron)?;
        }
        if self.job_repo.exists(&job.key).await? {
            return Err(SchedulerError::key_already_in_use(&job.key));
        }

        let job = self.job_repo.create(&job).await?;
        if job.is_scheduled() {
            self.scheduler.register(&job).await?;
        }

        info!("创建作业: {}", job.entity_description());
        Ok(job)
    }

    /// 部分更新作业；CRON 或启用状态变化时重新注册，CRON 被清空时移除触发器
    #[instrument(skip(self, patch))]
    pub async fn update_job(&self, job_key: &str, patch: JobPatch) -> SchedulerResult<Job> {
        let existing = self.get_job(job_key).await?;
        let is_empty = patch.is_empty();
        let updated = patch.apply(&existing)?;
        if is_empty {
            debug!("作业 {} 的补丁没有改动，跳过写入", job_key);
            return Ok(existing);
        }

        let cron_changed = existing.cron_expression != updated.cron_expression;
        let enabled_changed = existing.enabled != updated.enabled;
        if cron_changed {
            if let Some(cron) = &updated.cron_expression {
                self.scheduler.validate_cron(cron)?;
            }
        }

        let job = self.job_repo.update(&updated).await?;

        match &job.cron_expression {
            None => {
                if self.scheduler.is_scheduled(job_key).await {
                    self.scheduler.unregister(job_key).await?;
                }
            }
            Some(_) if cron_changed || enabled_changed => {
                self.scheduler.register(&job).await?;
            }
            Some(_) => {}
        }

        info!("更新作业: {}", job.entity_description());
        Ok(job)
    }

    /// 删除作业及其全部任务，存储删除先于触发器移除
    #[instrument(skip(self))]
    pub async fn delete_job(&self, job_key: &str) -> SchedulerResult<()> {
        if !self.job_repo.exists(job_key).await? {
            return Err(SchedulerError::job_not_found(job_key));
        }

        self.task_service.delete_all_by_job_key(job_key).await?;
        self.job_repo.delete(job_key).await?;

        if self.scheduler.is_scheduled(job_key).await {
            self.scheduler.unregister(job_key).await?;
        }

        info!("删除作业: {}", job_key);
        Ok(())
    }

    pub async fn enable(&self, job_key: &str) -> SchedulerResult<Job> {
        self.scheduler.enable(job_key).await
    }

    pub async fn disable(&self, job_key: &str) -> SchedulerResult<Job> {
        self.scheduler.disable(job_key).await
    }

    /// 手动触发一次执行，作业不存在时返回 `JobNotFound`
    pub async fn execute_job(&self, job_key: &str) -> SchedulerResult<()> {
        if !self.job_repo.exists(job_key).await? {
            return Err(SchedulerError::job_not_found(job_key));
        }
        self.scheduler.execute_job(job_key).await
    }

    /// 触发器回调：为作业创建一个新任务
    pub async fn launch_job(&self, job_key: &str, source: FireSource) -> SchedulerResult<Task> {
        let source_name = match source {
            FireSource::Schedule => "schedule",
            FireSource::Manual => "manual",
        };

        let job = match self.job_repo.find_by_key(job_key).await? {
            Some(job) => job,
            None => {
                let error = SchedulerError::job_not_found(job_key);
                StructuredLogger::log_job_fire_failed(job_key, source_name, &error.to_string());
                return Err(error);
            }
        };

        let task = self.task_service.create_task(&job).await?;
        MetricsCollector::record_job_fired(source_name);
        StructuredLogger::log_job_fired(job_key, source_name, task.id);
        Ok(task)
    }

    pub async fn get_job(&self, job_key: &str) -> SchedulerResult<Job> {
        self.job_repo
            .find_by_key(job_key)
            .await?
            .ok_or_else(|| SchedulerError::job_not_found(job_key))
    }

    pub async fn get_jobs(&self, filter: &JobFilter) -> SchedulerResult<Vec<Job>> {
        self.job_repo.find_by_filter(filter).await
    }

    pub async fn does_job_exist(&self, job_key: &str) -> SchedulerResult<bool> {
        self.job_repo.exists(job_key).await
    }

    pub async fn get_schedule_state(&self, job_key: &str) -> SchedulerResult<ScheduleState> {
        if !self.job_repo.exists(job_key).await? {
            return Err(SchedulerError::job_not_found(job_key));
        }
        Ok(self.scheduler.schedule_state(job_key).await)
    }

    pub fn task_service(&self) -> &Arc<TaskService> {
        &self.task_service
    }
}

#[async_trait]
impl JobTrigger for JobService {
    async fn execute_job(&self, job_key: &str) -> SchedulerResult<()> {
        JobService::execute_job(self, job_key).await
    }
}
