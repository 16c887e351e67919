use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use scheduler_domain::entities::{Job, JobFilter, Task, TaskFilter};
use scheduler_domain::repositories::{JobRepository, TaskRepository};
use scheduler_errors::{SchedulerError, SchedulerResult};

/// 内存作业仓储，进程退出后数据丢失
#[derive(Debug, Clone, Default)]
pub struct InMemoryJobRepository {
    jobs: Arc<RwLock<HashMap<String, Job>>>,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.jobs.read().await.len()
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn create(&self, job: &Job) -> SchedulerResult<Job> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.key) {
            return Err(SchedulerError::key_already_in_use(&job.key));
        }
        jobs.insert(job.key.clone(), job.clone());
        Ok(job.clone())
    }

    async fn find_by_key(&self, key: &str) -> SchedulerResult<Option<Job>> {
        Ok(self.jobs.read().await.get(key).cloned())
    }

    async fn exists(&self, key: &str) -> SchedulerResult<bool> {
        Ok(self.jobs.read().await.contains_key(key))
    }

    async fn update(&self, job: &Job) -> SchedulerResult<Job> {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(&job.key) {
            Some(stored) => {
                *stored = job.clone();
                Ok(job.clone())
            }
            None => Err(SchedulerError::job_not_found(&job.key)),
        }
    }

    async fn delete(&self, key: &str) -> SchedulerResult<bool> {
        Ok(self.jobs.write().await.remove(key).is_some())
    }

    async fn find_by_filter(&self, filter: &JobFilter) -> SchedulerResult<Vec<Job>> {
        let jobs = self.jobs.read().await;
        let mut matched: Vec<Job> = jobs.values().filter(|j| filter.matches(j)).cloned().collect();
        matched.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(matched)
    }

    async fn find_scheduled(&self) -> SchedulerResult<Vec<Job>> {
        let jobs = self.jobs.read().await;
        let mut scheduled: Vec<Job> = jobs
            .values()
            .filter(|j| j.enabled && j.is_scheduled())
            .cloned()
            .collect();
        scheduled.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(scheduled)
    }
}

/// 内存任务仓储，id 从 1 开始递增
#[derive(Debug, Clone)]
pub struct InMemoryTaskRepository {
    tasks: Arc<RwLock<HashMap<i64, Task>>>,
    next_id: Arc<RwLock<i64>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self {
            tasks: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(RwLock::new(1)),
        }
    }

    pub async fn count(&self) -> usize {
        self.tasks.read().await.len()
    }
}

impl Default for InMemoryTaskRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn create(&self, task: &Task) -> SchedulerResult<Task> {
        let mut tasks = self.tasks.write().await;
        let mut next_id = self.next_id.write().await;

        let mut new_task = task.clone();
        new_task.id = *next_id;
        *next_id += 1;

        tasks.insert(new_task.id, new_task.clone());
        Ok(new_task)
    }

    async fn find_by_id(&self, id: i64) -> SchedulerResult<Option<Task>> {
        Ok(self.tasks.read().await.get(&id).cloned())
    }

    async fn update(&self, task: &Task) -> SchedulerResult<Task> {
        let mut tasks = self.tasks.write().await;
        match tasks.get_mut(&task.id) {
            Some(stored) => {
                *stored = task.clone();
                Ok(task.clone())
            }
            None => Err(SchedulerError::task_not_found(&task.job_key, task.id)),
        }
    }

    async fn find_by_filter(&self, filter: &TaskFilter) -> SchedulerResult<Vec<Task>> {
        let tasks = self.tasks.read().await;
        let mut matched: Vec<Task> = tasks.values().filter(|t| filter.matches(t)).cloned().collect();
        matched.sort_by_key(|t| t.id);
        Ok(matched)
    }

    async fn find_latest_by_job_key(&self, job_key: &str) -> SchedulerResult<Option<Task>> {
        let tasks = self.tasks.read().await;
        Ok(tasks
            .values()
            .filter(|t| t.belongs_to(job_key))
            .max_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
            .cloned())
    }

    async fn delete_by_job_key(&self, job_key: &str) -> SchedulerResult<u64> {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|_, t| !t.belongs_to(job_key));
        Ok((before - tasks.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scheduler_domain::entities::{JobDefinition, JobInformation};
    use scheduler_domain::value_objects::{JobType, TaskStatus};

    fn job(key: &str, cron: Option<&str>, enabled: bool) -> Job {
        Job::new(JobDefinition {
            key: key.to_string(),
            job_type: JobType::Generic,
            information: JobInformation::new(key),
            cron_expression: cron.map(str::to_string),
            enabled,
            actions: vec![],
        })
    }

    #[tokio::test]
    async fn test_job_key_uniqueness() {
        let repo = InMemoryJobRepository::new();
        repo.create(&job("JOB_A", None, true)).await.unwrap();

        let result = repo.create(&job("JOB_A", None, false)).await;
        assert!(matches!(result, Err(SchedulerError::KeyAlreadyInUse { .. })));
        assert_eq!(repo.count().await, 1);
    }

    #[tokio::test]
    async fn test_job_update_and_delete() {
        let repo = InMemoryJobRepository::new();
        let mut stored = repo.create(&job("JOB_A", None, true)).await.unwrap();
        stored.enabled = false;
        repo.update(&stored).await.unwrap();
        assert!(!repo.find_by_key("JOB_A").await.unwrap().unwrap().enabled);

        assert!(repo.delete("JOB_A").await.unwrap());
        assert!(!repo.delete("JOB_A").await.unwrap());
        assert!(matches!(
            repo.update(&stored).await,
            Err(SchedulerError::JobNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_find_scheduled() {
        let repo = InMemoryJobRepository::new();
        repo.create(&job("ACTIVE", Some("0 * * * * *"), true)).await.unwrap();
        repo.create(&job("PAUSED", Some("0 * * * * *"), false)).await.unwrap();
        repo.create(&job("MANUAL", None, true)).await.unwrap();

        let keys: Vec<String> = repo
            .find_scheduled()
            .await
            .unwrap()
            .into_iter()
            .map(|j| j.key)
            .collect();
        assert_eq!(keys, vec!["ACTIVE".to_string()]);
    }

    #[tokio::test]
    async fn test_task_ids_and_queries() {
        let repo = InMemoryTaskRepository::new();
        let first = repo.create(&Task::new("JOB_A")).await.unwrap();
        let second = repo.create(&Task::new("JOB_A")).await.unwrap();
        repo.create(&Task::new("JOB_B")).await.unwrap();
        assert_eq!((first.id, second.id), (1, 2));

        let latest = repo.find_latest_by_job_key("JOB_A").await.unwrap().unwrap();
        assert_eq!(latest.id, second.id);

        let mut running = second.clone();
        running.status = TaskStatus::Running;
        repo.update(&running).await.unwrap();

        let filter = TaskFilter {
            job_key: Some("JOB_A".to_string()),
            statuses: vec![TaskStatus::Running],
            created_after: None,
        };
        let found = repo.find_by_filter(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, second.id);
    }

    #[tokio::test]
    async fn test_delete_by_job_key_and_stale_update() {
        let repo = InMemoryTaskRepository::new();
        let task = repo.create(&Task::new("JOB_A")).await.unwrap();
        repo.create(&Task::new("JOB_A")).await.unwrap();
        repo.create(&Task::new("JOB_B")).await.unwrap();

        assert_eq!(repo.delete_by_job_key("JOB_A").await.unwrap(), 2);
        assert_eq!(repo.count().await, 1);
        assert!(matches!(
            repo.update(&task).await,
            Err(SchedulerError::TaskNotFound { .. })
        ));
    }
}
