//! # Scheduler API
//!
//! 作业调度系统的 REST 接口，基于 axum 构建。
//!
//! - `/api/jobs`：作业的创建、查询、部分更新、删除、启用/禁用与手动执行
//! - `/api/jobs/{key}/tasks`：任务查询与状态上报
//! - `/api/tasks`：跨作业的任务搜索，外部执行器据此发现待处理任务
//! - `/health`、`/metrics`：存活检查与 Prometheus 指标
//!
//! 成功响应统一为 `{ success, data, message, timestamp }`，
//! 失败响应为 `{ code, messages }`，`code` 为稳定的错误码。

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod permissions;
pub mod response;
pub mod routes;
pub mod validation;

use axum::Router;
use tower::ServiceBuilder;

use middleware::{cors_layer, request_logging, timeout_layer, trace_layer};
pub use routes::{create_routes, AppState};
use scheduler_config::models::ApiConfig;

/// 创建完整的API应用
pub fn create_app(state: AppState, api_config: &ApiConfig) -> Router {
    // 日志中间件需要路由匹配结果，因此挂在 route_layer 上
    let router = create_routes(state)
        .route_layer(axum::middleware::from_fn(request_logging))
        .layer(
            ServiceBuilder::new()
                .layer(trace_layer())
                .layer(timeout_layer(api_config.request_timeout_seconds)),
        );

    if api_config.cors_enabled {
        router.layer(cors_layer())
    } else {
        router
    }
}
