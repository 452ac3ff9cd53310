use axum::extract::{Json, State};

use super::model::{LoginResponse, User};
use crate::AppState;
use crate::error::ServiceError;
use crate::utils::{ApiJson, ApiResponse, success_to_api_response};

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<User>,
) -> Result<Json<ApiResponse<LoginResponse>>, ServiceError> {
    let created = User::lookup_or_create(&state.store, req).await?;
    Ok(success_to_api_response(LoginResponse::from(created)))
}

#[axum::debug_handler]
pub async fn get_users(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<User>>>, ServiceError> {
    let users = User::list(&state.store).await?;
    Ok(success_to_api_response(users))
}
