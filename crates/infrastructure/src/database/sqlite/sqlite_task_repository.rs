use async_trait::async_trait;
use scheduler_domain::{
    entities::{Task, TaskFilter},
    repositories::TaskRepository,
    value_objects::TaskStatus,
};
use scheduler_errors::{SchedulerError, SchedulerResult};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::{debug, instrument};

use crate::error_handling::{RepositoryErrorHelpers, RepositoryOperation};

const TASK_COLUMNS: &str = "id, job_key, status, message, created_at, updated_at";

pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl SqliteTaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_task(row: &SqliteRow) -> SchedulerResult<Task> {
        let status: String = row.try_get("status")?;
        Ok(Task {
            id: row.try_get("id")?,
            job_key: row.try_get("job_key")?,
            status: status.parse::<TaskStatus>()?,
            message: row.try_get("message")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    #[instrument(skip(self, task), fields(job.key = %task.job_key))]
    async fn create(&self, task: &Task) -> SchedulerResult<Task> {
        let result = sqlx::query(
            "INSERT INTO tasks (job_key, status, message, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&task.job_key)
        .bind(task.status.as_str())
        .bind(&task.message)
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            RepositoryErrorHelpers::task_database_error(
                RepositoryOperation::Create,
                &task.job_key,
                None,
                e,
            )
        })?;

        let mut created = task.clone();
        created.id = result.last_insert_rowid();
        debug!("已保存{}", created.entity_description());
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> SchedulerResult<Option<Task>> {
        let row = sqlx::query(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                RepositoryErrorHelpers::database_error(
                    RepositoryOperation::Read,
                    &format!("任务 {id}"),
                    e,
                )
            })?;

        row.as_ref().map(Self::row_to_task).transpose()
    }

    #[instrument(skip(self, task), fields(task.id = task.id, job.key = %task.job_key))]
    async fn update(&self, task: &Task) -> SchedulerResult<Task> {
        let result = sqlx::query(
            "UPDATE tasks SET status = ?, message = ?, updated_at = ? WHERE id = ? AND job_key = ?",
        )
        .bind(task.status.as_str())
        .bind(&task.message)
        .bind(task.updated_at)
        .bind(task.id)
        .bind(&task.job_key)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            RepositoryErrorHelpers::task_database_error(
                RepositoryOperation::Update,
                &task.job_key,
                Some(task.id),
                e,
            )
        })?;

        if result.rows_affected() == 0 {
            return Err(SchedulerError::task_not_found(&task.job_key, task.id));
        }
        Ok(task.clone())
    }

    async fn find_by_filter(&self, filter: &TaskFilter) -> SchedulerResult<Vec<Task>> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {TASK_COLUMNS} FROM tasks WHERE 1 = 1"));
        if let Some(job_key) = &filter.job_key {
            builder.push(" AND job_key = ").push_bind(job_key);
        }
        if !filter.statuses.is_empty() {
            builder.push(" AND status IN (");
            let mut separated = builder.separated(", ");
            for status in &filter.statuses {
                separated.push_bind(status.as_str());
            }
            separated.push_unseparated(")");
        }
        builder.push(" ORDER BY id ASC");

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                RepositoryErrorHelpers::database_error(RepositoryOperation::Query, "任务列表", e)
            })?;

        let mut tasks = rows
            .iter()
            .map(Self::row_to_task)
            .collect::<SchedulerResult<Vec<_>>>()?;

        // 时间戳以文本存储，创建时间下限（含）在内存中判断
        tasks.retain(|task| filter.matches(task));
        Ok(tasks)
    }

    async fn find_latest_by_job_key(&self, job_key: &str) -> SchedulerResult<Option<Task>> {
        let row = sqlx::query(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE job_key = ? ORDER BY id DESC LIMIT 1"
        ))
        .bind(job_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            RepositoryErrorHelpers::task_database_error(RepositoryOperation::Read, job_key, None, e)
        })?;

        row.as_ref().map(Self::row_to_task).transpose()
    }

    async fn delete_by_job_key(&self, job_key: &str) -> SchedulerResult<u64> {
        let result = sqlx::query("DELETE FROM tasks WHERE job_key = ?")
            .bind(job_key)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                RepositoryErrorHelpers::task_database_error(
                    RepositoryOperation::Delete,
                    job_key,
                    None,
                    e,
                )
            })?;
        Ok(result.rows_affected())
    }
}
