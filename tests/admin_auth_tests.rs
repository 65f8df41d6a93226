use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use base64::Engine as _;
use std::sync::Arc;
use tower::ServiceExt;

fn basic_auth_header(username: &str, password: &str) -> String {
    let raw = format!("{username}:{password}");
    format!("Basic {}", base64::engine::general_purpose::STANDARD.encode(raw))
}

async fn empty_pool_app() -> (axum::Router, antigravity_gateway::config::Config, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("failed to create temp data dir");
    let http_client = reqwest::Client::new();
    let pool = antigravity_gateway::pool::spawn(dir.path().to_path_buf(), http_client.clone())
        .await
        .expect("failed to spawn empty account pool");
    let upstream = antigravity_gateway::upstream::UpstreamClient::new(http_client);
    let dispatcher = antigravity_gateway::dispatch::Dispatcher::new(pool.clone(), upstream, 60);
    let translate = antigravity_gateway::translate::TranslateContext::new();
    let config = antigravity_gateway::config::Config::default();
    let state = antigravity_gateway::server::AppState::new(pool, dispatcher, translate, Arc::new(config.clone()));
    (antigravity_gateway::server::router(state), config, dir)
}

#[tokio::test]
async fn admin_routes_reject_missing_token() {
    let (app, _cfg, _data_dir) = empty_pool_app().await;

    let resp = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/admin/accounts")
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let (app, _cfg, _data_dir) = empty_pool_app().await;

    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/admin/login")
                .header("authorization", basic_auth_header("admin", "wrong"))
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_then_listing_accounts_succeeds_with_issued_token() {
    let (app, cfg, _data_dir) = empty_pool_app().await;

    let login_resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/admin/login")
                .header("authorization", basic_auth_header(&cfg.admin_username, &cfg.admin_password))
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("login request failed");

    assert_eq!(login_resp.status(), StatusCode::OK);
    let bytes = to_bytes(login_resp.into_body(), usize::MAX).await.expect("failed to read login body");
    let json: serde_json::Value = serde_json::from_slice(&bytes).expect("login body was not JSON");
    let token = json["token"].as_str().expect("login response missing token").to_string();

    let resp = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/admin/accounts")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("failed to read body");
    let json: serde_json::Value = serde_json::from_slice(&bytes).expect("response body was not JSON");
    assert_eq!(json["total"], 0);
}
