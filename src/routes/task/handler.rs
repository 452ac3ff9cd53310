use axum::extract::{Json, State};

use super::model::{
    ArticleTaskView, QaTask, SentiTask, SentiTaskDetailView, TaskDetailRequest, TaskDetailView,
    TaskKindTag, TasksRequest, aggregate_task_progress,
};
use crate::AppState;
use crate::error::ServiceError;
use crate::utils::{ApiJson, ApiResponse, success_to_api_response};

#[axum::debug_handler]
pub async fn get_tasks(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<TasksRequest>,
) -> Result<Json<ApiResponse<ArticleTaskView>>, ServiceError> {
    tracing::debug!("get_tasks: {:?}", req);
    let kind = req.task_type.unwrap_or(TaskKindTag::Qa);
    let view = aggregate_task_progress(&state.store, &req.article_id, &req.user_id, kind).await?;
    Ok(success_to_api_response(view))
}

#[axum::debug_handler]
pub async fn get_senti_tasks(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<TasksRequest>,
) -> Result<Json<ApiResponse<ArticleTaskView>>, ServiceError> {
    tracing::debug!("get_senti_tasks: {:?}", req);
    let view =
        aggregate_task_progress(&state.store, &req.article_id, &req.user_id, TaskKindTag::Senti)
            .await?;
    Ok(success_to_api_response(view))
}

#[axum::debug_handler]
pub async fn get_task_detail(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<TaskDetailRequest>,
) -> Result<Json<ApiResponse<TaskDetailView>>, ServiceError> {
    let view = QaTask::detail(&state.store, &req).await?;
    Ok(success_to_api_response(view))
}

#[axum::debug_handler]
pub async fn get_senti_task_detail(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<TaskDetailRequest>,
) -> Result<Json<ApiResponse<SentiTaskDetailView>>, ServiceError> {
    let view = SentiTask::detail(&state.store, &req).await?;
    Ok(success_to_api_response(view))
}
