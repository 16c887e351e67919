use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),
    #[error("数据库操作错误: {0}")]
    DatabaseOperation(String),
    #[error("作业未找到: {key}")]
    JobNotFound { key: String },
    #[error("任务未找到: 作业 {job_key} 下不存在任务 {task_id}")]
    TaskNotFound { job_key: String, task_id: i64 },
    #[error("作业键已被占用: {key}")]
    KeyAlreadyInUse { key: String },
    #[error("作业已处于启用状态: {key}")]
    JobAlreadyEnabled { key: String },
    #[error("作业已处于禁用状态: {key}")]
    JobAlreadyDisabled { key: String },
    #[error("作业没有配置调度: {key}")]
    NotAScheduledJob { key: String },
    #[error("作业类型不匹配: 作业 {key} 的类型为 {expected}, 请求类型为 {actual}")]
    IncorrectPayloadForJobType {
        key: String,
        expected: String,
        actual: String,
    },
    #[error("无效的CRON表达式: {expr} - {message}")]
    InvalidCron { expr: String, message: String },
    #[error("数据验证失败: {0}")]
    ValidationError(String),
    #[error("序列化错误: {0}")]
    Serialization(String),
    #[error("配置错误: {0}")]
    Configuration(String),
    #[error("内部错误: {0}")]
    Internal(String),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// 错误分类，决定边界层如何向调用方呈现错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    BusinessRule,
    Validation,
    Internal,
}

impl SchedulerError {
    pub fn database_error<S: Into<String>>(msg: S) -> Self {
        Self::DatabaseOperation(msg.into())
    }
    pub fn job_not_found<S: Into<String>>(key: S) -> Self {
        Self::JobNotFound { key: key.into() }
    }
    pub fn task_not_found<S: Into<String>>(job_key: S, task_id: i64) -> Self {
        Self::TaskNotFound {
            job_key: job_key.into(),
            task_id,
        }
    }
    pub fn key_already_in_use<S: Into<String>>(key: S) -> Self {
        Self::KeyAlreadyInUse { key: key.into() }
    }
    pub fn job_already_enabled<S: Into<String>>(key: S) -> Self {
        Self::JobAlreadyEnabled { key: key.into() }
    }
    pub fn job_already_disabled<S: Into<String>>(key: S) -> Self {
        Self::JobAlreadyDisabled { key: key.into() }
    }
    pub fn not_a_scheduled_job<S: Into<String>>(key: S) -> Self {
        Self::NotAScheduledJob { key: key.into() }
    }
    pub fn invalid_cron<E: Into<String>, M: Into<String>>(expr: E, message: M) -> Self {
        Self::InvalidCron {
            expr: expr.into(),
            message: message.into(),
        }
    }
    pub fn config_error<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }
    pub fn validation_error<S: Into<String>>(msg: S) -> Self {
        Self::ValidationError(msg.into())
    }
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// 对外暴露的稳定错误码
    pub fn code(&self) -> &'static str {
        match self {
            SchedulerError::JobNotFound { .. } => "JOB_NOT_FOUND",
            SchedulerError::TaskNotFound { .. } => "TASK_NOT_FOUND",
            SchedulerError::KeyAlreadyInUse { .. } => "KEY_ALREADY_IN_USE",
            SchedulerError::JobAlreadyEnabled { .. } => "JOB_ALREADY_ENABLED",
            SchedulerError::JobAlreadyDisabled { .. } => "JOB_ALREADY_DISABLED",
            SchedulerError::NotAScheduledJob { .. } => "NOT_A_SCHEDULED_JOB",
            SchedulerError::IncorrectPayloadForJobType { .. } => "INCORRECT_PAYLOAD_FOR_JOB_TYPE",
            SchedulerError::InvalidCron { .. } => "INVALID_CRON_EXPRESSION",
            SchedulerError::ValidationError(_) => "VALIDATION_ERROR",
            SchedulerError::Database(_)
            | SchedulerError::DatabaseOperation(_)
            | SchedulerError::Serialization(_)
            | SchedulerError::Configuration(_)
            | SchedulerError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SchedulerError::JobNotFound { .. } | SchedulerError::TaskNotFound { .. } => {
                ErrorKind::NotFound
            }
            SchedulerError::KeyAlreadyInUse { .. } => ErrorKind::Conflict,
            SchedulerError::JobAlreadyEnabled { .. }
            | SchedulerError::JobAlreadyDisabled { .. }
            | SchedulerError::NotAScheduledJob { .. }
            | SchedulerError::IncorrectPayloadForJobType { .. } => ErrorKind::BusinessRule,
            SchedulerError::InvalidCron { .. } | SchedulerError::ValidationError(_) => {
                ErrorKind::Validation
            }
            _ => ErrorKind::Internal,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SchedulerError::Internal(_) | SchedulerError::Configuration(_)
        )
    }

    pub fn user_message(&self) -> &str {
        match self {
            SchedulerError::JobNotFound { .. } => "请求的作业不存在",
            SchedulerError::TaskNotFound { .. } => "请求的任务不存在",
            SchedulerError::KeyAlreadyInUse { .. } => "作业键已被其他作业使用",
            SchedulerError::JobAlreadyEnabled { .. } => "作业已经处于启用状态",
            SchedulerError::JobAlreadyDisabled { .. } => "作业已经处于禁用状态",
            SchedulerError::NotAScheduledJob { .. } => "作业没有配置CRON表达式",
            SchedulerError::IncorrectPayloadForJobType { .. } => "请求内容与作业类型不匹配",
            SchedulerError::InvalidCron { .. } => "CRON表达式格式有误",
            SchedulerError::ValidationError(_) => "输入数据验证失败",
            _ => "系统繁忙，请稍后重试",
        }
    }
}

impl From<serde_json::Error> for SchedulerError {
    fn from(err: serde_json::Error) -> Self {
        SchedulerError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for SchedulerError {
    fn from(err: anyhow::Error) -> Self {
        SchedulerError::Internal(err.to_string())
    }
}
