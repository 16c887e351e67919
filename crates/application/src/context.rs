use std::sync::Arc;
use tracing::info;

use scheduler_domain::ports::TriggerRegistry;
use scheduler_domain::repositories::{JobRepository, TaskRepository};
use scheduler_errors::SchedulerResult;

use crate::ports::ActionRunner;
use crate::services::{ActionDispatcher, JobService, SchedulerService, TaskService};

/// 组装好的核心服务
///
/// 执行器集合在这里校验一次，动作类型重叠时构造失败。
#[derive(Clone)]
pub struct SchedulerContext {
    pub job_service: Arc<JobService>,
    pub task_service: Arc<TaskService>,
    pub scheduler: Arc<SchedulerService>,
    pub dispatcher: Arc<ActionDispatcher>,
}

impl SchedulerContext {
    pub fn build(
        job_repo: Arc<dyn JobRepository>,
        task_repo: Arc<dyn TaskRepository>,
        registry: Arc<dyn TriggerRegistry>,
        runners: Vec<Arc<dyn ActionRunner>>,
    ) -> SchedulerResult<Self> {
        let dispatcher = Arc::new(ActionDispatcher::new(runners)?);
        info!("动作分发器已就绪，支持: {:?}", dispatcher.supported_types());

        let scheduler = Arc::new(SchedulerService::new(job_repo.clone(), registry));
        let task_service = Arc::new(TaskService::new(
            task_repo,
            job_repo.clone(),
            dispatcher.clone(),
        ));
        let job_service = Arc::new(JobService::new(
            job_repo,
            task_service.clone(),
            scheduler.clone(),
        ));

        Ok(Self {
            job_service,
            task_service,
            scheduler,
            dispatcher,
        })
    }
}
