use std::sync::Arc;
use tracing::info;

use scheduler_config::models::{DatabaseBackend, DatabaseConfig};
use scheduler_domain::repositories::{JobRepository, TaskRepository};
use scheduler_errors::SchedulerResult;

use crate::database::memory::{InMemoryJobRepository, InMemoryTaskRepository};
use crate::database::sqlite::DatabaseManager;

/// 按配置构造的一组仓储
pub struct Repositories {
    pub job_repository: Arc<dyn JobRepository>,
    pub task_repository: Arc<dyn TaskRepository>,
    /// 内存后端没有连接池
    pub database: Option<DatabaseManager>,
}

pub struct RepositoryFactory;

impl RepositoryFactory {
    pub async fn create(config: &DatabaseConfig) -> SchedulerResult<Repositories> {
        match config.backend {
            DatabaseBackend::Memory => {
                info!("使用内存存储后端，重启后数据将丢失");
                Ok(Repositories {
                    job_repository: Arc::new(InMemoryJobRepository::new()),
                    task_repository: Arc::new(InMemoryTaskRepository::new()),
                    database: None,
                })
            }
            DatabaseBackend::Sqlite => {
                info!("使用 SQLite 存储后端");
                let manager = DatabaseManager::new(config).await?;
                Ok(Repositories {
                    job_repository: Arc::new(manager.job_repository()),
                    task_repository: Arc::new(manager.task_repository()),
                    database: Some(manager),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scheduler_domain::entities::{Job, JobDefinition, JobInformation, Task};
    use scheduler_domain::value_objects::JobType;

    fn config(backend: DatabaseBackend, url: String) -> DatabaseConfig {
        DatabaseConfig {
            backend,
            url,
            ..DatabaseConfig::default()
        }
    }

    async fn exercise(repositories: &Repositories) {
        let job = Job::new(JobDefinition {
            key: "JOB_A".to_string(),
            job_type: JobType::Generic,
            information: JobInformation::new("job a"),
            cron_expression: None,
            enabled: true,
            actions: vec![],
        });
        repositories.job_repository.create(&job).await.unwrap();
        let task = repositories
            .task_repository
            .create(&Task::new("JOB_A"))
            .await
            .unwrap();
        assert!(task.id > 0);
        assert!(repositories.job_repository.exists("JOB_A").await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_backend() {
        let repositories = RepositoryFactory::create(&config(DatabaseBackend::Memory, String::new()))
            .await
            .unwrap();
        assert!(repositories.database.is_none());
        exercise(&repositories).await;
    }

    #[tokio::test]
    async fn test_sqlite_backend() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("factory.db").display());
        let repositories = RepositoryFactory::create(&config(DatabaseBackend::Sqlite, url))
            .await
            .unwrap();
        assert!(repositories.database.is_some());
        exercise(&repositories).await;
    }
}
