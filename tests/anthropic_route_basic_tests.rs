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
async fn messages_with_no_accounts_returns_503() {
    let (app, _data_dir) = empty_pool_app().await;

    let body = r#"{"model":"claude-sonnet-4-5","max_tokens":128,"messages":[{"role":"user","content":"hi"}]}"#;
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/messages")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("failed to read body");
    let json: serde_json::Value = serde_json::from_slice(&bytes).expect("response body was not JSON");
    assert_eq!(json["type"], "error");
}

#[tokio::test]
async fn messages_rejects_malformed_json_with_400() {
    let (app, _data_dir) = empty_pool_app().await;

    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/messages")
                .header("content-type", "application/json")
                .body(Body::from("not-json"))
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn messages_with_tool_use_round_trips_without_upstream_call() {
    let (app, _data_dir) = empty_pool_app().await;

    // A tool declaration with a name that needs sanitizing; with no accounts
    // configured, dispatch fails before ever reaching upstream, but inbound
    // translation (and the tool-name cache write) still has to succeed.
    let body = serde_json::json!({
        "model": "claude-sonnet-4-5",
        "max_tokens": 128,
        "messages": [{"role": "user", "content": "hi"}],
        "tools": [{"name": "my.tool!", "input_schema": {"type": "object"}}],
    });

    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/messages")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}
