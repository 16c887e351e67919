use axum::{
    routing::{get, post, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use scheduler_application::JobService;
use std::sync::Arc;

use crate::handlers::{
    health::health_check,
    jobs::{
        create_job, delete_job, disable_job, enable_job, execute_job, get_job, get_schedule,
        list_jobs, update_job,
    },
    metrics::render_metrics,
    tasks::{get_latest_task, get_task, list_job_tasks, search_tasks, update_task_status},
};

/// API应用状态
#[derive(Clone)]
pub struct AppState {
    pub job_service: Arc<JobService>,
    pub metrics: Option<PrometheusHandle>,
}

/// 创建API路由
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(render_metrics))
        // 作业管理
        .route("/api/jobs", get(list_jobs).post(create_job))
        .route(
            "/api/jobs/{key}",
            get(get_job).patch(update_job).delete(delete_job),
        )
        .route("/api/jobs/{key}/enable", post(enable_job))
        .route("/api/jobs/{key}/disable", post(disable_job))
        .route("/api/jobs/{key}/execute", post(execute_job))
        .route("/api/jobs/{key}/schedule", get(get_schedule))
        // 任务
        .route("/api/jobs/{key}/tasks", get(list_job_tasks))
        .route("/api/jobs/{key}/tasks/latest", get(get_latest_task))
        .route("/api/jobs/{key}/tasks/{id}", get(get_task))
        .route("/api/jobs/{key}/tasks/{id}/status", put(update_task_status))
        .route("/api/tasks", get(search_tasks))
        .with_state(state)
}
