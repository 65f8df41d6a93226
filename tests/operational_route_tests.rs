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
async fn health_reports_ok() {
    let (app, _data_dir) = empty_pool_app().await;

    let resp = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("failed to build request"))
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("failed to read body");
    let json: serde_json::Value = serde_json::from_slice(&bytes).expect("response body was not JSON");
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn account_limits_reports_empty_pool() {
    let (app, _data_dir) = empty_pool_app().await;

    let resp = app
        .oneshot(Request::builder().uri("/account-limits").body(Body::empty()).expect("failed to build request"))
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("failed to read body");
    let json: serde_json::Value = serde_json::from_slice(&bytes).expect("response body was not JSON");
    assert_eq!(json["total"], 0);
    assert_eq!(json["available"], 0);
}

#[tokio::test]
async fn refresh_token_endpoint_accepts_post() {
    let (app, _data_dir) = empty_pool_app().await;

    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/refresh-token")
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let (app, _data_dir) = empty_pool_app().await;

    let resp = app
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).expect("failed to build request"))
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
