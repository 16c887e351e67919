use axum::{extract::State, response::IntoResponse};
use scheduler_domain::entities::JobPatch;

use crate::{
    error::ApiResult,
    extract::{ApiJson, ApiPath, ApiQuery, ValidatedJson},
    response::{accepted, created, success, ApiResponse},
    routes::AppState,
    validation::job::{CreateJobRequest, JobQueryParams},
};

/// 查询作业列表 (JOB_SEARCH)
pub async fn list_jobs(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<JobQueryParams>,
) -> ApiResult<impl IntoResponse> {
    let jobs = state.job_service.get_jobs(&params.into_filter()).await?;
    Ok(success(jobs))
}

/// 创建作业 (JOB_CREATE)
pub async fn create_job(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateJobRequest>,
) -> ApiResult<impl IntoResponse> {
    let job = state
        .job_service
        .create_job(request.into_definition())
        .await?;
    Ok(created(job))
}

/// 获取作业详情 (JOB_VIEW)
pub async fn get_job(
    State(state): State<AppState>,
    ApiPath(key): ApiPath<String>,
) -> ApiResult<impl IntoResponse> {
    let job = state.job_service.get_job(&key).await?;
    Ok(success(job))
}

/// 部分更新作业 (JOB_UPDATE)
///
/// 缺省字段保持不变，显式 `null` 清除字段
pub async fn update_job(
    State(state): State<AppState>,
    ApiPath(key): ApiPath<String>,
    ApiJson(patch): ApiJson<JobPatch>,
) -> ApiResult<impl IntoResponse> {
    let job = state.job_service.update_job(&key, patch).await?;
    Ok(success(job))
}

/// 删除作业及其全部任务 (JOB_DELETE)
pub async fn delete_job(
    State(state): State<AppState>,
    ApiPath(key): ApiPath<String>,
) -> ApiResult<impl IntoResponse> {
    state.job_service.delete_job(&key).await?;
    Ok(ApiResponse::success_empty_with_message(format!(
        "作业 {key} 已删除"
    )))
}

/// 启用作业 (JOB_ENABLE)
pub async fn enable_job(
    State(state): State<AppState>,
    ApiPath(key): ApiPath<String>,
) -> ApiResult<impl IntoResponse> {
    let job = state.job_service.enable(&key).await?;
    Ok(success(job))
}

/// 禁用作业 (JOB_DISABLE)
pub async fn disable_job(
    State(state): State<AppState>,
    ApiPath(key): ApiPath<String>,
) -> ApiResult<impl IntoResponse> {
    let job = state.job_service.disable(&key).await?;
    Ok(success(job))
}

/// 立即执行一次 (JOB_RUN)，任务异步创建
pub async fn execute_job(
    State(state): State<AppState>,
    ApiPath(key): ApiPath<String>,
) -> ApiResult<impl IntoResponse> {
    state.job_service.execute_job(&key).await?;
    Ok(accepted(format!("作业 {key} 已触发")))
}

/// 调度状态 (JOB_VIEW)
pub async fn get_schedule(
    State(state): State<AppState>,
    ApiPath(key): ApiPath<String>,
) -> ApiResult<impl IntoResponse> {
    let schedule = state.job_service.get_schedule_state(&key).await?;
    Ok(success(schedule))
}
