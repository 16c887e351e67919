//! 路由所需权限
//!
//! 每条路由声明调用方需要的权限，当前只用于请求日志，不做校验。

use axum::http::Method;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    JobView,
    JobSearch,
    JobCreate,
    JobUpdate,
    JobDelete,
    JobEnable,
    JobDisable,
    JobRun,
    TaskView,
    TaskSearch,
    TaskStatusUpdate,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::JobView => "JOB_VIEW",
            Permission::JobSearch => "JOB_SEARCH",
            Permission::JobCreate => "JOB_CREATE",
            Permission::JobUpdate => "JOB_UPDATE",
            Permission::JobDelete => "JOB_DELETE",
            Permission::JobEnable => "JOB_ENABLE",
            Permission::JobDisable => "JOB_DISABLE",
            Permission::JobRun => "JOB_RUN",
            Permission::TaskView => "TASK_VIEW",
            Permission::TaskSearch => "TASK_SEARCH",
            Permission::TaskStatusUpdate => "TASK_STATUS_UPDATE",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 按路由模板（如 `/api/jobs/{key}`）查找所需权限；健康检查与指标接口返回 `None`
pub fn route_permission(method: &Method, route: &str) -> Option<Permission> {
    let permission = match (method.as_str(), route) {
        ("GET", "/api/jobs") => Permission::JobSearch,
        ("POST", "/api/jobs") => Permission::JobCreate,
        ("GET", "/api/jobs/{key}") => Permission::JobView,
        ("PATCH", "/api/jobs/{key}") => Permission::JobUpdate,
        ("DELETE", "/api/jobs/{key}") => Permission::JobDelete,
        ("POST", "/api/jobs/{key}/enable") => Permission::JobEnable,
        ("POST", "/api/jobs/{key}/disable") => Permission::JobDisable,
        ("POST", "/api/jobs/{key}/execute") => Permission::JobRun,
        ("GET", "/api/jobs/{key}/schedule") => Permission::JobView,
        ("GET", "/api/jobs/{key}/tasks")
        | ("GET", "/api/jobs/{key}/tasks/latest")
        | ("GET", "/api/jobs/{key}/tasks/{id}") => Permission::TaskView,
        ("PUT", "/api/jobs/{key}/tasks/{id}/status") => Permission::TaskStatusUpdate,
        ("GET", "/api/tasks") => Permission::TaskSearch,
        _ => return None,
    };
    Some(permission)
}
