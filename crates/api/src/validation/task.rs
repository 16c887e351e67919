use chrono::{DateTime, Utc};
use scheduler_domain::entities::{StatusUpdate, TaskFilter};
use scheduler_domain::value_objects::TaskStatus;
use scheduler_errors::SchedulerError;
use serde::Deserialize;
use validator::Validate;

use crate::error::{ApiError, ApiResult};

/// 状态更新请求
#[derive(Debug, Deserialize, Validate)]
pub struct StatusUpdateRequest {
    pub status: TaskStatus,
    #[validate(length(min = 1, max = 2500, message = "状态消息长度必须在 1 到 2500 个字符之间"))]
    pub message: Option<String>,
}

impl From<StatusUpdateRequest> for StatusUpdate {
    fn from(request: StatusUpdateRequest) -> Self {
        StatusUpdate {
            status: request.status,
            message: request.message,
        }
    }
}

/// 任务 id 必须为正整数
pub fn validate_task_id(id: i64) -> ApiResult<i64> {
    if id < 1 {
        return Err(SchedulerError::validation_error(format!("任务 id 必须为正整数: {id}")).into());
    }
    Ok(id)
}

#[derive(Debug, Default, Deserialize)]
pub struct LatestTaskParams {
    pub task_id: Option<i64>,
}

/// 任务查询参数：`status` 为逗号分隔列表，`created_after` 为 RFC 3339 时间
#[derive(Debug, Default, Deserialize)]
pub struct TaskQueryParams {
    pub job_key: Option<String>,
    pub status: Option<String>,
    pub created_after: Option<String>,
}

impl TaskQueryParams {
    pub fn into_filter(self) -> ApiResult<TaskFilter> {
        let statuses = match self.status {
            Some(status) => status
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| s.parse::<TaskStatus>())
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        let created_after = match self.created_after {
            Some(raw) => Some(
                DateTime::parse_from_rfc3339(&raw)
                    .map_err(|e| ApiError::bad_request(format!("created_after 不是有效的 RFC 3339 时间: {e}")))?
                    .with_timezone(&Utc),
            ),
            None => None,
        };

        Ok(TaskFilter {
            job_key: self.job_key,
            statuses,
            created_after,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_query_parsing() {
        let filter = TaskQueryParams {
            job_key: Some("JOB_A".to_string()),
            status: Some("CREATED,RUNNING".to_string()),
            created_after: Some("2024-01-01T00:00:00Z".to_string()),
        }
        .into_filter()
        .unwrap();

        assert_eq!(filter.statuses, vec![TaskStatus::Created, TaskStatus::Running]);
        assert!(filter.created_after.is_some());
    }

    #[test]
    fn test_task_query_rejects_unknown_status_and_bad_time() {
        let unknown = TaskQueryParams {
            status: Some("DONE".to_string()),
            ..Default::default()
        }
        .into_filter();
        assert!(matches!(unknown, Err(ApiError::Scheduler(_))));

        let bad_time = TaskQueryParams {
            created_after: Some("yesterday".to_string()),
            ..Default::default()
        }
        .into_filter();
        assert!(matches!(bad_time, Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_task_id_must_be_positive() {
        assert_eq!(validate_task_id(7).unwrap(), 7);
        assert!(matches!(
            validate_task_id(0),
            Err(ApiError::Scheduler(SchedulerError::ValidationError(_)))
        ));
        assert!(validate_task_id(-3).is_err());
    }

    #[test]
    fn test_status_request_message_length() {
        let request = StatusUpdateRequest {
            status: TaskStatus::Success,
            message: Some(String::new()),
        };
        assert!(request.validate().is_err());

        let request = StatusUpdateRequest {
            status: TaskStatus::Success,
            message: None,
        };
        assert!(request.validate().is_ok());
    }
}
