use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use std::sync::Arc;
use tower::ServiceExt;

async fn empty_pool_app() -> (axum::Router, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("failed to create temp data dir");
    let http_client = reqwest::Client::new();
    let pool = antigravity_gateway::pool::spawn(dir.path().to_path_buf(), http_client.clone())
        .await
        .expect("failed to spawn empty account pool");
    let upstream = antigravity_gateway::upstream::UpstreamClient::new(http_client);
    let dispatcher = antigravity_gateway::dispatch::Dispatcher::new(pool.clone(), upstream, 60);
    let translate = antigravity_gateway::translate::TranslateContext::new();
    let config = Arc::new(antigravity_gateway::config::Config::default());
    let state = antigravity_gateway::server::AppState::new(pool, dispatcher, translate, config);
    (antigravity_gateway::server::router(state), dir)
}

#[tokio::test]
async fn chat_completions_with_no_accounts_returns_503() {
    let (app, _data_dir) = empty_pool_app().await;

    let body = r#"{"model":"gemini-2.5-pro","messages":[{"role":"user","content":"hi"}]}"#;
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/chat/completions")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("failed to read body");
    let json: serde_json::Value = serde_json::from_slice(&bytes).expect("response body was not JSON");
    assert_eq!(json["error"]["code"], "NO_ACCOUNTS_AVAILABLE");
}

#[tokio::test]
async fn chat_completions_rejects_malformed_json_with_400() {
    let (app, _data_dir) = empty_pool_app().await;

    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/chat/completions")
                .header("content-type", "application/json")
                .body(Body::from("not-json"))
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_models_returns_known_model_catalog() {
    let (app, _data_dir) = empty_pool_app().await;

    let resp = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/v1/models")
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("failed to read body");
    let json: serde_json::Value = serde_json::from_slice(&bytes).expect("response body was not JSON");
    let data = json["data"].as_array().expect("expected a data array");
    assert!(!data.is_empty());
}
