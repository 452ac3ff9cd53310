use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use config::Config;
use store::Store;

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod store;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub config: Config,
}

/// 组装全部路由，挂载在 `config.api_base_uri` 下
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        // 用户
        .route("/login", post(routes::user::login))
        .route("/users", post(routes::user::get_users))
        // 项目与成员
        .route("/projects", post(routes::project::get_projects))
        .route("/projects/import", post(routes::project::import_project))
        .route("/projects/members", post(routes::project::get_project_members))
        .route("/auth", post(routes::project::grant_auth))
        // 问答标注
        .route("/articles", post(routes::article::get_articles))
        .route("/tasks", post(routes::task::get_tasks))
        .route("/tasks/detail", post(routes::task::get_task_detail))
        .route("/answers", post(routes::answer::save_answer))
        // 情感标注
        .route("/senti/articles", post(routes::article::get_senti_articles))
        .route("/senti/tasks", post(routes::task::get_senti_tasks))
        .route("/senti/tasks/detail", post(routes::task::get_senti_task_detail))
        .route("/senti/answers", post(routes::answer::save_senti_answer))
        .route("/health", get(health));

    let base = state.config.api_base_uri.trim_matches('/').to_string();
    let router = if base.is_empty() {
        Router::new().merge(api)
    } else {
        Router::new().nest(&format!("/{base}"), api)
    };
    router.with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "store": state.store.backend_name(),
    }))
}
