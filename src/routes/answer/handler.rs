use axum::extract::{Json, State};

use super::model::{AnswerCreated, QaAnswer, SentiAnswer};
use crate::AppState;
use crate::error::ServiceError;
use crate::utils::{ApiJson, ApiResponse, success_to_api_response};

#[axum::debug_handler]
pub async fn save_answer(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<QaAnswer>,
) -> Result<Json<ApiResponse<AnswerCreated>>, ServiceError> {
    let created = req.record(&state.store).await?;
    Ok(success_to_api_response(created))
}

#[axum::debug_handler]
pub async fn save_senti_answer(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SentiAnswer>,
) -> Result<Json<ApiResponse<AnswerCreated>>, ServiceError> {
    let created = req.record(&state.store).await?;
    Ok(success_to_api_response(created))
}
