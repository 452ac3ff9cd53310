use axum::extract::{Json, State};

use super::model::{
    AddProjectRequest, Auth, Project, ProjectCreated, ProjectMemberView, ProjectMembersRequest,
    UserProjectsRequest,
};
use crate::AppState;
use crate::error::ServiceError;
use crate::utils::{ApiJson, ApiResponse, success_to_api_response};

#[axum::debug_handler]
pub async fn import_project(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<AddProjectRequest>,
) -> Result<Json<ApiResponse<ProjectCreated>>, ServiceError> {
    let created = Project::bootstrap(&state.store, req).await?;
    Ok(success_to_api_response(created))
}

#[axum::debug_handler]
pub async fn get_projects(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<UserProjectsRequest>,
) -> Result<Json<ApiResponse<Vec<Project>>>, ServiceError> {
    let projects = Project::resolve_memberships(&state.store, &req.user_id).await?;
    Ok(success_to_api_response(projects))
}

#[axum::debug_handler]
pub async fn get_project_members(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ProjectMembersRequest>,
) -> Result<Json<ApiResponse<Vec<ProjectMemberView>>>, ServiceError> {
    let members = Auth::list_members(&state.store, req.project_id).await?;
    Ok(success_to_api_response(members))
}

#[axum::debug_handler]
pub async fn grant_auth(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<Auth>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ServiceError> {
    let id = req.grant(&state.store).await?;
    Ok(success_to_api_response(serde_json::json!({ "authId": id })))
}
