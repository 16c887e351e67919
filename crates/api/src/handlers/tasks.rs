use axum::{extract::State, response::IntoResponse};

use crate::{
    error::ApiResult,
    extract::{ApiPath, ApiQuery, ValidatedJson},
    response::success,
    routes::AppState,
    validation::task::{validate_task_id, LatestTaskParams, StatusUpdateRequest, TaskQueryParams},
};

/// 作业下的全部任务 (TASK_VIEW)
pub async fn list_job_tasks(
    State(state): State<AppState>,
    ApiPath(key): ApiPath<String>,
) -> ApiResult<impl IntoResponse> {
    state.job_service.get_job(&key).await?;
    let tasks = state.job_service.task_service().get_tasks(&key).await?;
    Ok(success(tasks))
}

/// 最近创建的任务，没有任务时 `data` 为 `null` (TASK_VIEW)
pub async fn get_latest_task(
    State(state): State<AppState>,
    ApiPath(key): ApiPath<String>,
    ApiQuery(params): ApiQuery<LatestTaskParams>,
) -> ApiResult<impl IntoResponse> {
    let task_id = params.task_id.map(validate_task_id).transpose()?;
    state.job_service.get_job(&key).await?;
    let task = state
        .job_service
        .task_service()
        .get_latest_task(&key, task_id)
        .await?;
    Ok(success(task))
}

/// 获取单个任务 (TASK_VIEW)
pub async fn get_task(
    State(state): State<AppState>,
    ApiPath((key, id)): ApiPath<(String, i64)>,
) -> ApiResult<impl IntoResponse> {
    let id = validate_task_id(id)?;
    let task = state.job_service.task_service().get_task(&key, id).await?;
    Ok(success(task))
}

/// 更新任务状态 (TASK_STATUS_UPDATE)
///
/// 动作分发失败不影响响应，只返回更新后的任务
pub async fn update_task_status(
    State(state): State<AppState>,
    ApiPath((key, id)): ApiPath<(String, i64)>,
    ValidatedJson(request): ValidatedJson<StatusUpdateRequest>,
) -> ApiResult<impl IntoResponse> {
    let id = validate_task_id(id)?;
    let outcome = state
        .job_service
        .task_service()
        .update_status(&key, id, request.into())
        .await?;
    Ok(success(outcome.task))
}

/// 按条件搜索任务 (TASK_SEARCH)
pub async fn search_tasks(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<TaskQueryParams>,
) -> ApiResult<impl IntoResponse> {
    let filter = params.into_filter()?;
    let tasks = state.job_service.task_service().search_tasks(&filter).await?;
    Ok(success(tasks))
}
