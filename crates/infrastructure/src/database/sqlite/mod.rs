pub mod sqlite_job_repository;
pub mod sqlite_task_repository;

pub use sqlite_job_repository::SqliteJobRepository;
pub use sqlite_task_repository::SqliteTaskRepository;

use scheduler_config::models::DatabaseConfig;
use scheduler_errors::SchedulerResult;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error_handling::{RepositoryErrorHelpers, RepositoryOperation};

/// SQLite 连接池管理，负责建表与仓储构造
pub struct DatabaseManager {
    pool: SqlitePool,
}

impl DatabaseManager {
    /// 打开（必要时创建）数据库文件并运行迁移
    pub async fn new(config: &DatabaseConfig) -> SchedulerResult<Self> {
        debug!("打开 SQLite 数据库: {}", config.url);

        let connect_options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
            .connect_with(connect_options)
            .await?;

        let manager = Self { pool };
        manager.run_migrations().await?;

        info!("SQLite 数据库已就绪: {}", config.url);
        Ok(manager)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn job_repository(&self) -> SqliteJobRepository {
        SqliteJobRepository::new(self.pool.clone())
    }

    pub fn task_repository(&self) -> SqliteTaskRepository {
        SqliteTaskRepository::new(self.pool.clone())
    }

    pub async fn health_check(&self) -> SchedulerResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn run_migrations(&self) -> SchedulerResult<()> {
        debug!("运行 SQLite 数据库迁移");

        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS jobs (
                key TEXT PRIMARY KEY NOT NULL,
                job_type TEXT NOT NULL DEFAULT 'GENERIC',
                name TEXT NOT NULL,
                description TEXT,
                tags TEXT NOT NULL DEFAULT '[]',
                cron_expression TEXT,
                enabled INTEGER NOT NULL DEFAULT 1,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS job_actions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                job_key TEXT NOT NULL,
                position INTEGER NOT NULL,
                condition_type TEXT NOT NULL,
                action_type TEXT NOT NULL,
                payload TEXT NOT NULL,
                FOREIGN KEY (job_key) REFERENCES jobs(key) ON DELETE CASCADE
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                job_key TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'CREATED',
                message TEXT,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL,
                FOREIGN KEY (job_key) REFERENCES jobs(key) ON DELETE CASCADE
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_jobs_enabled ON jobs(enabled)",
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_job_actions_position ON job_actions(job_key, position)",
            "CREATE INDEX IF NOT EXISTS idx_tasks_job_key ON tasks(job_key)",
            "CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status)",
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    RepositoryErrorHelpers::database_error(RepositoryOperation::Migrate, "数据表", e)
                })?;
        }

        debug!("SQLite 数据库迁移完成");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use scheduler_config::models::DatabaseBackend;
    use tempfile::TempDir;

    /// 临时目录随返回值一起释放
    pub async fn temp_database() -> (DatabaseManager, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            backend: DatabaseBackend::Sqlite,
            url: format!("sqlite://{}", dir.path().join("scheduler.db").display()),
            max_connections: 2,
            min_connections: 1,
            connection_timeout_seconds: 5,
        };
        let manager = DatabaseManager::new(&config).await.unwrap();
        (manager, dir)
    }
}
