//! 仓储操作的错误映射
//!
//! 把 sqlx 错误转换为带有操作与实体上下文的 [`SchedulerError`]，并记录结构化日志。

use scheduler_errors::SchedulerError;
use sqlx::Error as SqlxError;
use std::fmt;
use tracing::error;

#[derive(Debug, Clone, Copy)]
pub enum RepositoryOperation {
    Create,
    Read,
    Update,
    Delete,
    Query,
    Migrate,
}

impl fmt::Display for RepositoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepositoryOperation::Create => write!(f, "创建"),
            RepositoryOperation::Read => write!(f, "读取"),
            RepositoryOperation::Update => write!(f, "更新"),
            RepositoryOperation::Delete => write!(f, "删除"),
            RepositoryOperation::Query => write!(f, "查询"),
            RepositoryOperation::Migrate => write!(f, "迁移"),
        }
    }
}

pub struct RepositoryErrorHelpers;

impl RepositoryErrorHelpers {
    /// 通用数据库错误
    pub fn database_error(
        operation: RepositoryOperation,
        entity: &str,
        error: SqlxError,
    ) -> SchedulerError {
        let message = match &error {
            SqlxError::PoolClosed => format!("{operation}{entity}时数据库连接池已关闭"),
            SqlxError::PoolTimedOut => format!("{operation}{entity}时数据库连接池超时"),
            SqlxError::RowNotFound => format!("{operation}{entity}时未找到记录"),
            other => format!("{operation}{entity}时发生数据库错误: {other}"),
        };
        error!(error = %error, operation = %operation, "{}", message);
        SchedulerError::database_error(message)
    }

    /// 创建作业时把唯一约束冲突转换为 `KeyAlreadyInUse`
    pub fn job_database_error(
        operation: RepositoryOperation,
        job_key: &str,
        error: SqlxError,
    ) -> SchedulerError {
        if let SqlxError::Database(db_error) = &error {
            if db_error.is_unique_violation() {
                return SchedulerError::key_already_in_use(job_key);
            }
        }
        Self::database_error(operation, &format!("作业 '{job_key}'"), error)
    }

    pub fn task_database_error(
        operation: RepositoryOperation,
        job_key: &str,
        task_id: Option<i64>,
        error: SqlxError,
    ) -> SchedulerError {
        let entity = match task_id {
            Some(id) => format!("任务 {id} (作业 '{job_key}')"),
            None => format!("作业 '{job_key}' 的任务"),
        };
        Self::database_error(operation, &entity, error)
    }

    /// 存储的数据无法还原为领域对象
    pub fn corrupted_row(entity: &str, detail: impl fmt::Display) -> SchedulerError {
        let message = format!("{entity}的存储数据损坏: {detail}");
        error!("{}", message);
        SchedulerError::internal(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_errors_keep_context() {
        let error = RepositoryErrorHelpers::database_error(
            RepositoryOperation::Read,
            "作业 'JOB_A'",
            SqlxError::PoolTimedOut,
        );
        assert!(matches!(error, SchedulerError::DatabaseOperation(_)));
        assert!(error.to_string().contains("读取作业 'JOB_A'时数据库连接池超时"));
    }

    #[test]
    fn test_non_constraint_job_error_is_database_error() {
        let error = RepositoryErrorHelpers::job_database_error(
            RepositoryOperation::Create,
            "JOB_A",
            SqlxError::PoolClosed,
        );
        assert_eq!(error.code(), "INTERNAL_ERROR");
        assert!(!matches!(error, SchedulerError::KeyAlreadyInUse { .. }));
    }

    #[test]
    fn test_corrupted_row_is_internal() {
        let error = RepositoryErrorHelpers::corrupted_row("作业 'JOB_A' 的动作", "未知条件");
        assert!(matches!(error, SchedulerError::Internal(_)));
    }
}
