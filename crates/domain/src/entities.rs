use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::update_value::UpdateValue;
use crate::value_objects::{
    validate_job_key, validate_text, ActionType, ConditionType, JobType, TaskStatus,
    LONG_TEXT_MAX_LENGTH, SHORT_TEXT_MAX_LENGTH,
};
use scheduler_errors::{SchedulerError, SchedulerResult};

/// 作业描述信息
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobInformation {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl JobInformation {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            description: None,
            tags: BTreeSet::new(),
        }
    }

    pub fn validate(&self) -> SchedulerResult<()> {
        validate_text(&self.name, "name", SHORT_TEXT_MAX_LENGTH)?;
        if let Some(description) = &self.description {
            validate_text(description, "description", LONG_TEXT_MAX_LENGTH)?;
        }
        for tag in &self.tags {
            validate_text(tag, "tag", SHORT_TEXT_MAX_LENGTH)?;
        }
        Ok(())
    }
}

/// 动作的具体内容，由 `type` 字段区分
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionPayload {
    RunJob { target_job_key: String },
}

impl ActionPayload {
    pub fn action_type(&self) -> ActionType {
        match self {
            ActionPayload::RunJob { .. } => ActionType::RunJob,
        }
    }
}

/// 附加在作业上的动作，任务状态满足条件时触发
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Action {
    pub condition: ConditionType,
    #[serde(flatten)]
    pub payload: ActionPayload,
}

impl Action {
    pub fn run_job<S: Into<String>>(condition: ConditionType, target_job_key: S) -> Self {
        Self {
            condition,
            payload: ActionPayload::RunJob {
                target_job_key: target_job_key.into(),
            },
        }
    }

    pub fn action_type(&self) -> ActionType {
        self.payload.action_type()
    }

    pub fn validate(&self) -> SchedulerResult<()> {
        match &self.payload {
            ActionPayload::RunJob { target_job_key } => validate_job_key(target_job_key),
        }
    }
}

/// 创建作业时提交的定义
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDefinition {
    pub key: String,
    #[serde(rename = "type", default)]
    pub job_type: JobType,
    pub information: JobInformation,
    #[serde(default)]
    pub cron_expression: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub actions: Vec<Action>,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    pub key: String,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub information: JobInformation,
    pub cron_expression: Option<String>,
    pub enabled: bool,
    pub actions: Vec<Action>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(definition: JobDefinition) -> Self {
        let now = Utc::now();
        Self {
            key: definition.key,
            job_type: definition.job_type,
            information: definition.information,
            cron_expression: definition.cron_expression,
            enabled: definition.enabled,
            actions: definition.actions,
            created_at: now,
            updated_at: now,
        }
    }

    /// 有 CRON 表达式的作业才会被注册到触发器
    pub fn is_scheduled(&self) -> bool {
        self.cron_expression.is_some()
    }

    /// 与给定状态匹配的动作，保持声明顺序
    pub fn actions_matching(&self, status: TaskStatus) -> Vec<&Action> {
        self.actions
            .iter()
            .filter(|action| action.condition.matches(status))
            .collect()
    }

    pub fn validate(&self) -> SchedulerResult<()> {
        validate_job_key(&self.key)?;
        self.information.validate()?;
        if let Some(cron) = &self.cron_expression {
            if cron.trim().is_empty() {
                return Err(SchedulerError::validation_error("CRON表达式不能为空"));
            }
        }
        for action in &self.actions {
            action.validate()?;
        }
        Ok(())
    }

    pub fn touch(&mut self) {
        self.updated_at = monotonic_now(self.updated_at);
    }

    pub fn entity_description(&self) -> String {
        format!(
            "作业 '{}' (键: {}, 类型: {})",
            self.information.name, self.key, self.job_type
        )
    }
}

/// 作业的部分更新，未出现的字段保持不变
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobPatch {
    #[serde(rename = "type", default)]
    pub job_type: Option<JobType>,
    #[serde(default)]
    pub information: UpdateValue<JobInformation>,
    #[serde(default)]
    pub cron_expression: UpdateValue<String>,
    #[serde(default)]
    pub enabled: UpdateValue<bool>,
    #[serde(default)]
    pub actions: UpdateValue<Vec<Action>>,
}

impl JobPatch {
    pub fn is_empty(&self) -> bool {
        !self.information.is_change()
            && !self.cron_expression.is_change()
            && !self.enabled.is_change()
            && !self.actions.is_change()
    }

    /// 将补丁应用到作业上，返回更新后的副本
    pub fn apply(self, job: &Job) -> SchedulerResult<Job> {
        if let Some(job_type) = self.job_type {
            if job_type != job.job_type {
                return Err(SchedulerError::IncorrectPayloadForJobType {
                    key: job.key.clone(),
                    expected: job.job_type.to_string(),
                    actual: job_type.to_string(),
                });
            }
        }
        if self.information.is_unset() {
            return Err(SchedulerError::validation_error("information 不能被置空"));
        }
        if self.enabled.is_unset() {
            return Err(SchedulerError::validation_error("enabled 不能被置空"));
        }
        if self.actions.is_unset() {
            return Err(SchedulerError::validation_error(
                "actions 不能被置空，请使用空数组",
            ));
        }

        let mut updated = job.clone();
        if let UpdateValue::Set(information) = self.information {
            updated.information = information;
        }
        updated.cron_expression = self.cron_expression.apply_to(updated.cron_expression);
        if let UpdateValue::Set(enabled) = self.enabled {
            updated.enabled = enabled;
        }
        if let UpdateValue::Set(actions) = self.actions {
            updated.actions = actions;
        }
        updated.validate()?;
        updated.touch();
        Ok(updated)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: i64,
    pub job_key: String,
    pub status: TaskStatus,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new<S: Into<String>>(job_key: S) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // 将由存储分配
            job_key: job_key.into(),
            status: TaskStatus::Created,
            message: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn belongs_to(&self, job_key: &str) -> bool {
        self.job_key == job_key
    }

    /// 应用状态更新，消息随状态一起替换
    pub fn apply_status(&mut self, update: &StatusUpdate) {
        self.status = update.status;
        self.message = update.message.clone();
        self.updated_at = monotonic_now(self.updated_at);
    }

    pub fn entity_description(&self) -> String {
        format!(
            "任务 {} (作业: {}, 状态: {})",
            self.id, self.job_key, self.status
        )
    }
}

/// 执行方上报的任务状态
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: TaskStatus,
    #[serde(default)]
    pub message: Option<String>,
}

impl StatusUpdate {
    pub fn new(status: TaskStatus) -> Self {
        Self {
            status,
            message: None,
        }
    }

    pub fn with_message<S: Into<String>>(mut self, message: S) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn validate(&self) -> SchedulerResult<()> {
        if let Some(message) = &self.message {
            validate_text(message, "message", LONG_TEXT_MAX_LENGTH)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub key: Option<String>,
    /// 作业必须包含全部标签
    pub tags: BTreeSet<String>,
    pub enabled: Option<bool>,
}

impl JobFilter {
    pub fn matches(&self, job: &Job) -> bool {
        if let Some(key) = &self.key {
            if &job.key != key {
                return false;
            }
        }
        if let Some(enabled) = self.enabled {
            if job.enabled != enabled {
                return false;
            }
        }
        self.tags.is_subset(&job.information.tags)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub job_key: Option<String>,
    /// 为空表示不按状态过滤
    pub statuses: Vec<TaskStatus>,
    pub created_after: Option<DateTime<Utc>>,
}

impl TaskFilter {
    pub fn for_job<S: Into<String>>(job_key: S) -> Self {
        Self {
            job_key: Some(job_key.into()),
            ..Default::default()
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        if let Some(job_key) = &self.job_key {
            if &task.job_key != job_key {
                return false;
            }
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&task.status) {
            return false;
        }
        if let Some(created_after) = self.created_after {
            if task.created_at < created_after {
                return false;
            }
        }
        true
    }
}

fn monotonic_now(previous: DateTime<Utc>) -> DateTime<Utc> {
    Utc::now().max(previous)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_job() -> Job {
        Job::new(JobDefinition {
            key: "JOB_A".to_string(),
            job_type: JobType::Generic,
            information: JobInformation::new("作业A"),
            cron_expression: Some("0 0 * * * *".to_string()),
            enabled: true,
            actions: vec![
                Action::run_job(ConditionType::OnSuccess, "JOB_B"),
                Action::run_job(ConditionType::OnFailure, "JOB_C"),
                Action::run_job(ConditionType::OnSuccess, "JOB_D"),
            ],
        })
    }

    #[test]
    fn test_action_json_shape() {
        let action = Action::run_job(ConditionType::OnSuccess, "JOB_B");
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"condition": "ON_SUCCESS", "type": "RUN_JOB", "target_job_key": "JOB_B"})
        );

        let parsed: Action = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, action);
        assert_eq!(parsed.action_type(), ActionType::RunJob);
    }

    #[test]
    fn test_unknown_action_type_rejected() {
        let result = serde_json::from_str::<Action>(
            r#"{"condition": "ON_SUCCESS", "type": "SEND_MAIL", "to": "x"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_actions_matching_keeps_declaration_order() {
        let job = sample_job();
        let matched: Vec<_> = job
            .actions_matching(TaskStatus::Success)
            .into_iter()
            .map(|a| match &a.payload {
                ActionPayload::RunJob { target_job_key } => target_job_key.clone(),
            })
            .collect();
        assert_eq!(matched, vec!["JOB_B".to_string(), "JOB_D".to_string()]);
        assert!(job.actions_matching(TaskStatus::Running).is_empty());
    }

    #[test]
    fn test_job_validation() {
        assert!(sample_job().validate().is_ok());

        let mut job = sample_job();
        job.key = "bad-key".to_string();
        assert!(job.validate().is_err());

        let mut job = sample_job();
        job.actions.push(Action::run_job(ConditionType::OnSuccess, "x"));
        assert!(job.validate().is_err());

        let mut job = sample_job();
        job.information.description = Some("d".repeat(2501));
        assert!(job.validate().is_err());
    }

    #[test]
    fn test_patch_with_only_information_keeps_schedule() {
        let job = sample_job();
        let patch = JobPatch {
            information: UpdateValue::Set(JobInformation::new("新名字")),
            ..Default::default()
        };

        let updated = patch.apply(&job).unwrap();
        assert_eq!(updated.information.name, "新名字");
        assert_eq!(updated.cron_expression, job.cron_expression);
        assert_eq!(updated.enabled, job.enabled);
        assert_eq!(updated.actions, job.actions);
        assert!(updated.updated_at >= job.updated_at);
    }

    #[test]
    fn test_patch_clears_cron_and_rejects_unset_required_fields() {
        let job = sample_job();
        let patch: JobPatch = serde_json::from_str(r#"{"cron_expression": null}"#).unwrap();
        let updated = patch.apply(&job).unwrap();
        assert_eq!(updated.cron_expression, None);

        let patch: JobPatch = serde_json::from_str(r#"{"enabled": null}"#).unwrap();
        assert!(matches!(
            patch.apply(&job),
            Err(SchedulerError::ValidationError(_))
        ));
    }

    #[test]
    fn test_task_status_update_is_monotonic() {
        let mut task = Task::new("JOB_A");
        task.updated_at = Utc::now() + Duration::hours(1);
        let before = task.updated_at;

        task.apply_status(&StatusUpdate::new(TaskStatus::Running).with_message("开始"));
        assert_eq!(task.status, TaskStatus::Running);
        assert_eq!(task.message.as_deref(), Some("开始"));
        assert!(task.updated_at >= before);

        task.apply_status(&StatusUpdate::new(TaskStatus::Success));
        assert_eq!(task.message, None);
    }

    #[test]
    fn test_filters() {
        let mut job = sample_job();
        job.information.tags = ["etl", "nightly"].iter().map(|s| s.to_string()).collect();

        let filter = JobFilter {
            tags: ["etl"].iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        };
        assert!(filter.matches(&job));

        let filter = JobFilter {
            tags: ["etl", "hourly"].iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        };
        assert!(!filter.matches(&job));

        let filter = JobFilter {
            enabled: Some(false),
            ..Default::default()
        };
        assert!(!filter.matches(&job));

        let task = Task::new("JOB_A");
        let filter = TaskFilter {
            job_key: Some("JOB_A".to_string()),
            statuses: vec![TaskStatus::Created, TaskStatus::Running],
            created_after: Some(task.created_at - Duration::seconds(1)),
        };
        assert!(filter.matches(&task));
        assert!(!TaskFilter::for_job("JOB_B").matches(&task));
    }
}
