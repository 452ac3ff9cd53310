//! 通过路由层发起请求，检查响应格式和状态码

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use label_backend::config::Config;
use label_backend::store::{Deadlines, MemoryStore, Store};
use label_backend::utils::error_codes;
use label_backend::{AppState, build_router};
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> Router {
    let config = Config::from_lookup(|key| match key {
        "STORE_BACKEND" => Some("memory".to_string()),
        _ => None,
    })
    .unwrap();
    let store = Store::memory(MemoryStore::new(), Deadlines::default());
    build_router(AppState { store, config })
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn health_reports_the_backend() {
    let app = app();
    let request = Request::builder()
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({"status": "ok", "store": "memory"}));
}

#[tokio::test]
async fn annotator_walkthrough() {
    let app = app();

    let (status, body) = post(
        &app,
        "/api/login",
        json!({"userId": "u1", "name": "Ada", "email": "ada@example.com"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], error_codes::SUCCESS);
    assert_eq!(body["resp_data"]["created"], true);

    let (_, body) = post(&app, "/api/login", json!({"userId": "u1"})).await;
    assert_eq!(body["resp_data"]["message"], "User Login");

    let (status, body) = post(
        &app,
        "/api/projects/import",
        json!({
            "project": {"projectName": "news", "projectType": "MRC"},
            "members": [{"userId": "u1", "codeType": "0", "statusCode": "1"}],
            "csvFile": [["T1", "1-1"], ["T1", "1-2"], ["T2", "2-1"]],
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["resp_data"]["projectId"], 0);
    assert_eq!(body["resp_data"]["tasks"], 3);

    let (_, body) = post(&app, "/api/projects", json!({"userId": "u1"})).await;
    assert_eq!(body["resp_data"][0]["projectName"], "news");

    let (_, body) = post(&app, "/api/articles", json!({"projectId": "0"})).await;
    assert_eq!(body["resp_data"]["articleList"][0]["totalTasks"], 2);

    let (_, body) = post(
        &app,
        "/api/answers",
        json!({
            "userId": "u1", "articleId": "articleId1", "taskId": "taskId1-2",
            "taskType": "MRC", "question": "who", "answer": "Ada",
        }),
    )
    .await;
    assert_eq!(body["code"], error_codes::SUCCESS);

    let (_, body) = post(
        &app,
        "/api/tasks",
        json!({"articleId": "articleId1", "userId": "u1"}),
    )
    .await;
    let tasks = &body["resp_data"]["taskList"];
    assert_eq!(tasks[0]["isAnswered"], false);
    assert_eq!(tasks[1]["isAnswered"], true);
    assert_eq!(tasks[1]["answered"], 1);

    let (_, body) = post(&app, "/api/projects/members", json!({"projectId": 0})).await;
    assert_eq!(body["resp_data"][0]["name"], "Ada");
}

#[tokio::test]
async fn failures_are_bad_requests_with_a_code() {
    let app = app();

    let (status, body) = post(
        &app,
        "/api/projects/import",
        json!({"project": {"projectName": "bad"}, "csvFile": [["T1", "1"]]}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], error_codes::VALIDATION_ERROR);
    assert!(body.get("resp_data").is_none());

    let (status, body) = post(
        &app,
        "/api/tasks",
        json!({"articleId": "nope", "userId": "u1"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], error_codes::NOT_FOUND);

    let (status, body) = post(&app, "/api/articles", json!({"projectId": 42})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], error_codes::NOT_FOUND);
}

#[tokio::test]
async fn undecodable_bodies_get_the_error_envelope() {
    let app = app();

    let (status, body) = post(&app, "/api/projects", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], error_codes::VALIDATION_ERROR);
    assert!(body["msg"].as_str().unwrap().contains("userId"));

    let (status, body) = post(
        &app,
        "/api/tasks",
        json!({"articleId": "a", "taskType": ""}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], error_codes::VALIDATION_ERROR);

    // 缺少 content-type
    let request = Request::builder()
        .method("POST")
        .uri("/api/login")
        .body(Body::from(r#"{"userId": "u1"}"#))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], error_codes::VALIDATION_ERROR);
}
