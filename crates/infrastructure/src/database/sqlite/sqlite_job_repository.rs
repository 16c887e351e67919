use async_trait::async_trait;
use scheduler_domain::{
    entities::{Action, ActionPayload, Job, JobFilter, JobInformation},
    repositories::JobRepository,
    value_objects::{ConditionType, JobType},
};
use scheduler_errors::{SchedulerError, SchedulerResult};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};
use std::collections::BTreeSet;
use tracing::{debug, instrument};

use crate::error_handling::{RepositoryErrorHelpers, RepositoryOperation};

const JOB_COLUMNS: &str =
    "key, job_type, name, description, tags, cron_expression, enabled, created_at, updated_at";

/// 作业与其动作分表存储，动作按 `position` 保持声明顺序
pub struct SqliteJobRepository {
    pool: SqlitePool,
}

impl SqliteJobRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_job(row: &SqliteRow, actions: Vec<Action>) -> SchedulerResult<Job> {
        let key: String = row.try_get("key")?;
        let job_type: String = row.try_get("job_type")?;
        let tags: String = row.try_get("tags")?;
        let tags: BTreeSet<String> = serde_json::from_str(&tags)
            .map_err(|e| RepositoryErrorHelpers::corrupted_row(&format!("作业 '{key}' 的标签"), e))?;

        Ok(Job {
            job_type: job_type.parse::<JobType>()?,
            information: JobInformation {
                name: row.try_get("name")?,
                description: row.try_get("description")?,
                tags,
            },
            cron_expression: row.try_get("cron_expression")?,
            enabled: row.try_get("enabled")?,
            actions,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            key,
        })
    }

    /// 还原动作并核对 `action_type` 列与载荷是否一致
    fn row_to_action(job_key: &str, row: &SqliteRow) -> SchedulerResult<Action> {
        let entity = format!("作业 '{job_key}' 的动作");
        let condition: String = row.try_get("condition_type")?;
        let action_type: String = row.try_get("action_type")?;
        let payload: String = row.try_get("payload")?;

        let condition = condition
            .parse::<ConditionType>()
            .map_err(|e| RepositoryErrorHelpers::corrupted_row(&entity, e))?;
        let payload: ActionPayload = serde_json::from_str(&payload)
            .map_err(|e| RepositoryErrorHelpers::corrupted_row(&entity, e))?;

        if payload.action_type().as_str() != action_type {
            return Err(RepositoryErrorHelpers::corrupted_row(
                &entity,
                format!(
                    "动作类型 {} 与载荷类型 {} 不一致",
                    action_type,
                    payload.action_type()
                ),
            ));
        }

        Ok(Action { condition, payload })
    }

    async fn load_actions(&self, job_key: &str) -> SchedulerResult<Vec<Action>> {
        let rows = sqlx::query(
            "SELECT condition_type, action_type, payload FROM job_actions WHERE job_key = ? ORDER BY position ASC",
        )
        .bind(job_key)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            RepositoryErrorHelpers::job_database_error(RepositoryOperation::Read, job_key, e)
        })?;

        rows.iter()
            .map(|row| Self::row_to_action(job_key, row))
            .collect()
    }

    async fn hydrate(&self, rows: Vec<SqliteRow>) -> SchedulerResult<Vec<Job>> {
        let mut jobs = Vec::with_capacity(rows.len());
        for row in &rows {
            let key: String = row.try_get("key")?;
            let actions = self.load_actions(&key).await?;
            jobs.push(Self::row_to_job(row, actions)?);
        }
        Ok(jobs)
    }

    async fn insert_actions(conn: &mut SqliteConnection, job: &Job) -> SchedulerResult<()> {
        for (position, action) in job.actions.iter().enumerate() {
            let payload = serde_json::to_string(&action.payload)?;
            sqlx::query(
                "INSERT INTO job_actions (job_key, position, condition_type, action_type, payload) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&job.key)
            .bind(position as i64)
            .bind(action.condition.as_str())
            .bind(action.action_type().as_str())
            .bind(payload)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                RepositoryErrorHelpers::job_database_error(RepositoryOperation::Create, &job.key, e)
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl JobRepository for SqliteJobRepository {
    #[instrument(skip(self, job), fields(job.key = %job.key))]
    async fn create(&self, job: &Job) -> SchedulerResult<Job> {
        let map_err = |e| {
            RepositoryErrorHelpers::job_database_error(RepositoryOperation::Create, &job.key, e)
        };
        let tags = serde_json::to_string(&job.information.tags)?;

        let mut tx = self.pool.begin().await.map_err(map_err)?;
        sqlx::query(
            "INSERT INTO jobs (key, job_type, name, description, tags, cron_expression, enabled, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&job.key)
        .bind(job.job_type.as_str())
        .bind(&job.information.name)
        .bind(&job.information.description)
        .bind(tags)
        .bind(&job.cron_expression)
        .bind(job.enabled)
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_err)?;

        Self::insert_actions(&mut tx, job).await?;
        tx.commit().await.map_err(map_err)?;

        debug!("已保存{}", job.entity_description());
        Ok(job.clone())
    }

    async fn find_by_key(&self, key: &str) -> SchedulerResult<Option<Job>> {
        let row = sqlx::query(&format!("SELECT {JOB_COLUMNS} FROM jobs WHERE key = ?"))
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryErrorHelpers::job_database_error(RepositoryOperation::Read, key, e))?;

        match row {
            Some(row) => {
                let actions = self.load_actions(key).await?;
                Ok(Some(Self::row_to_job(&row, actions)?))
            }
            None => Ok(None),
        }
    }

    async fn exists(&self, key: &str) -> SchedulerResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM jobs WHERE key = ?")
            .bind(key)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepositoryErrorHelpers::job_database_error(RepositoryOperation::Read, key, e))?;
        Ok(count > 0)
    }

    #[instrument(skip(self, job), fields(job.key = %job.key))]
    async fn update(&self, job: &Job) -> SchedulerResult<Job> {
        let map_err = |e| {
            RepositoryErrorHelpers::job_database_error(RepositoryOperation::Update, &job.key, e)
        };
        let tags = serde_json::to_string(&job.information.tags)?;

        let mut tx = self.pool.begin().await.map_err(map_err)?;
        let result = sqlx::query(
            "UPDATE jobs SET job_type = ?, name = ?, description = ?, tags = ?, cron_expression = ?, enabled = ?, updated_at = ? WHERE key = ?",
        )
        .bind(job.job_type.as_str())
        .bind(&job.information.name)
        .bind(&job.information.description)
        .bind(tags)
        .bind(&job.cron_expression)
        .bind(job.enabled)
        .bind(job.updated_at)
        .bind(&job.key)
        .execute(&mut *tx)
        .await
        .map_err(map_err)?;

        if result.rows_affected() == 0 {
            return Err(SchedulerError::job_not_found(&job.key));
        }

        sqlx::query("DELETE FROM job_actions WHERE job_key = ?")
            .bind(&job.key)
            .execute(&mut *tx)
            .await
            .map_err(map_err)?;
        Self::insert_actions(&mut tx, job).await?;
        tx.commit().await.map_err(map_err)?;

        debug!("已更新{}", job.entity_description());
        Ok(job.clone())
    }

    async fn delete(&self, key: &str) -> SchedulerResult<bool> {
        let result = sqlx::query("DELETE FROM jobs WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                RepositoryErrorHelpers::job_database_error(RepositoryOperation::Delete, key, e)
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_by_filter(&self, filter: &JobFilter) -> SchedulerResult<Vec<Job>> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {JOB_COLUMNS} FROM jobs WHERE 1 = 1"));
        if let Some(key) = &filter.key {
            builder.push(" AND key = ").push_bind(key);
        }
        if let Some(enabled) = filter.enabled {
            builder.push(" AND enabled = ").push_bind(enabled);
        }
        builder.push(" ORDER BY key ASC");

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryErrorHelpers::database_error(RepositoryOperation::Query, "作业列表", e))?;

        // 标签以 JSON 存储，按标签过滤在内存中完成
        let mut jobs = self.hydrate(rows).await?;
        jobs.retain(|job| filter.matches(job));
        Ok(jobs)
    }

    async fn find_scheduled(&self) -> SchedulerResult<Vec<Job>> {
        let rows = sqlx::query(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE enabled = 1 AND cron_expression IS NOT NULL ORDER BY key ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryErrorHelpers::database_error(RepositoryOperation::Query, "定时作业", e))?;

        self.hydrate(rows).await
    }
}
