use std::borrow::Cow;
use std::collections::BTreeSet;

use scheduler_domain::entities::{Action, JobDefinition, JobFilter, JobInformation};
use scheduler_domain::value_objects::{self, JobType, SHORT_TEXT_MAX_LENGTH};
use serde::Deserialize;
use validator::{Validate, ValidationError};

fn error(code: &'static str, message: String) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Owned(message))
}

/// 验证作业键格式
pub fn validate_job_key(key: &str) -> Result<(), ValidationError> {
    value_objects::validate_job_key(key).map_err(|e| error("job_key", e.to_string()))
}

/// CRON 语法由触发器校验，这里只拒绝空白表达式
pub fn validate_cron_expression(cron_expression: &str) -> Result<(), ValidationError> {
    if cron_expression.trim().is_empty() {
        return Err(error("cron_expression", "CRON表达式不能为空".to_string()));
    }
    Ok(())
}

pub fn validate_tags(tags: &BTreeSet<String>) -> Result<(), ValidationError> {
    for tag in tags {
        value_objects::validate_text(tag, "标签", SHORT_TEXT_MAX_LENGTH)
            .map_err(|e| error("tags", e.to_string()))?;
    }
    Ok(())
}

pub fn validate_actions(actions: &[Action]) -> Result<(), ValidationError> {
    for action in actions {
        action
            .validate()
            .map_err(|e| error("actions", e.to_string()))?;
    }
    Ok(())
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
pub struct JobInformationRequest {
    #[validate(length(min = 1, max = 250, message = "名称长度必须在 1 到 250 个字符之间"))]
    pub name: String,
    #[validate(length(min = 1, max = 2500, message = "描述长度必须在 1 到 2500 个字符之间"))]
    pub description: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_tags"))]
    pub tags: BTreeSet<String>,
}

/// 作业创建请求
#[derive(Debug, Deserialize, Validate)]
pub struct CreateJobRequest {
    #[validate(custom(function = "validate_job_key"))]
    pub key: String,
    #[serde(rename = "type", default)]
    pub job_type: JobType,
    #[validate(nested)]
    pub information: JobInformationRequest,
    #[validate(custom(function = "validate_cron_expression"))]
    pub cron_expression: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    #[validate(custom(function = "validate_actions"))]
    pub actions: Vec<Action>,
}

impl CreateJobRequest {
    pub fn into_definition(self) -> JobDefinition {
        JobDefinition {
            key: self.key,
            job_type: self.job_type,
            information: JobInformation {
                name: self.information.name,
                description: self.information.description,
                tags: self.information.tags,
            },
            cron_expression: self.cron_expression,
            enabled: self.enabled,
            actions: self.actions,
        }
    }
}

/// 作业查询参数，`tags` 为逗号分隔列表
#[derive(Debug, Default, Deserialize)]
pub struct JobQueryParams {
    pub key: Option<String>,
    pub tags: Option<String>,
    pub enabled: Option<bool>,
}

impl JobQueryParams {
    pub fn into_filter(self) -> JobFilter {
        let tags = self
            .tags
            .map(|tags| {
                tags.split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        JobFilter {
            key: self.key,
            tags,
            enabled: self.enabled,
        }
    }
}
