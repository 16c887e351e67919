use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use scheduler_errors::{ErrorKind, SchedulerError};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use validator::{ValidationErrors, ValidationErrorsKind};

/// 错误响应体：稳定的错误码加上可读的错误信息
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub code: String,
    pub messages: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("调度器错误: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("验证错误: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("请求参数错误: {0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Scheduler(e) => match e.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::BusinessRule => StatusCode::UNPROCESSABLE_ENTITY,
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn body(&self) -> ErrorBody {
        match self {
            ApiError::Scheduler(e) if e.kind() == ErrorKind::Internal => ErrorBody {
                code: e.code().to_string(),
                messages: vec!["内部服务器错误".to_string()],
            },
            ApiError::Scheduler(e) => ErrorBody {
                code: e.code().to_string(),
                messages: vec![e.to_string()],
            },
            ApiError::Validation(errors) => {
                let mut messages = Vec::new();
                collect_validation_messages("", errors, &mut messages);
                if messages.is_empty() {
                    messages.push(errors.to_string());
                }
                messages.sort();
                ErrorBody {
                    code: "VALIDATION_ERROR".to_string(),
                    messages,
                }
            }
            ApiError::BadRequest(message) => ErrorBody {
                code: "BAD_REQUEST".to_string(),
                messages: vec![message.clone()],
            },
        }
    }
}

/// 展开嵌套结构与列表中的字段错误，字段名以 `.` 连接
fn collect_validation_messages(prefix: &str, errors: &ValidationErrors, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for e in field_errors {
                    let detail = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    out.push(format!("{path}: {detail}"));
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_validation_messages(&path, nested, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_validation_messages(&format!("{path}[{index}]"), nested, out);
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "请求处理失败");
        } else {
            warn!(error = %self, status = %status, "请求被拒绝");
        }
        (status, Json(self.body())).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
