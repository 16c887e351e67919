use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use scheduler_errors::{SchedulerError, SchedulerResult};

pub const JOB_KEY_MIN_LENGTH: usize = 3;
pub const JOB_KEY_MAX_LENGTH: usize = 50;
/// 长文本字段（描述、状态消息）的最大字符数
pub const LONG_TEXT_MAX_LENGTH: usize = 2500;
/// 短文本字段（名称、标签）的最大字符数
pub const SHORT_TEXT_MAX_LENGTH: usize = 250;

/// 作业键只允许大写字母、数字和下划线，长度 3 到 50
pub fn validate_job_key(key: &str) -> SchedulerResult<()> {
    let length = key.chars().count();
    if !(JOB_KEY_MIN_LENGTH..=JOB_KEY_MAX_LENGTH).contains(&length) {
        return Err(SchedulerError::validation_error(format!(
            "作业键 '{key}' 长度必须在 {JOB_KEY_MIN_LENGTH} 到 {JOB_KEY_MAX_LENGTH} 之间"
        )));
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(SchedulerError::validation_error(format!(
            "作业键 '{key}' 只能包含大写字母、数字和下划线"
        )));
    }
    Ok(())
}

pub fn validate_text(
    value: &str,
    field_name: &str,
    max_length: usize,
) -> SchedulerResult<()> {
    let length = value.chars().count();
    if length == 0 {
        return Err(SchedulerError::validation_error(format!(
            "{field_name} 不能为空"
        )));
    }
    if length > max_length {
        return Err(SchedulerError::validation_error(format!(
            "{field_name} 长度不能超过 {max_length} 个字符"
        )));
    }
    Ok(())
}

/// 作业类型，决定作业详情的结构
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobType {
    #[default]
    Generic,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::Generic => "GENERIC",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobType {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GENERIC" => Ok(JobType::Generic),
            _ => Err(SchedulerError::validation_error(format!(
                "无效的作业类型: {s}"
            ))),
        }
    }
}

/// 动作类型标签
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    RunJob,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::RunJob => "RUN_JOB",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RUN_JOB" => Ok(ActionType::RunJob),
            _ => Err(SchedulerError::validation_error(format!(
                "无效的动作类型: {s}"
            ))),
        }
    }
}

/// 任务执行状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Created,
    Running,
    Success,
    Failure,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Created => "CREATED",
            TaskStatus::Running => "RUNNING",
            TaskStatus::Success => "SUCCESS",
            TaskStatus::Failure => "FAILURE",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATED" => Ok(TaskStatus::Created),
            "RUNNING" => Ok(TaskStatus::Running),
            "SUCCESS" => Ok(TaskStatus::Success),
            "FAILURE" => Ok(TaskStatus::Failure),
            _ => Err(SchedulerError::validation_error(format!(
                "无效的任务状态: {s}"
            ))),
        }
    }
}

/// 动作触发条件
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionType {
    OnSuccess,
    OnFailure,
}

impl ConditionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionType::OnSuccess => "ON_SUCCESS",
            ConditionType::OnFailure => "ON_FAILURE",
        }
    }

    pub fn matches(&self, status: TaskStatus) -> bool {
        match self {
            ConditionType::OnSuccess => status == TaskStatus::Success,
            ConditionType::OnFailure => status == TaskStatus::Failure,
        }
    }
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConditionType {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ON_SUCCESS" => Ok(ConditionType::OnSuccess),
            "ON_FAILURE" => Ok(ConditionType::OnFailure),
            _ => Err(SchedulerError::validation_error(format!(
                "无效的触发条件: {s}"
            ))),
        }
    }
}
