use axum::extract::{Json, State};

use super::model::{Article, ProjectArticlesRequest, ProjectArticlesView, SentiArticle};
use crate::AppState;
use crate::error::ServiceError;
use crate::utils::{ApiJson, ApiResponse, success_to_api_response};

#[axum::debug_handler]
pub async fn get_articles(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ProjectArticlesRequest>,
) -> Result<Json<ApiResponse<ProjectArticlesView>>, ServiceError> {
    let view = Article::list_by_project(&state.store, req.project_id).await?;
    Ok(success_to_api_response(view))
}

#[axum::debug_handler]
pub async fn get_senti_articles(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Article>>>, ServiceError> {
    let articles = SentiArticle::list(&state.store).await?;
    Ok(success_to_api_response(articles))
}
