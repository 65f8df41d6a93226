//! The HTTP surface (§6): the three public API families plus the
//! operational endpoints. Route framing (request-id stamping, access
//! logging) is carried over from the teacher's `server::router` pattern.

pub mod anthropic;
pub mod gemini;
pub mod openai;
pub mod operational;
pub mod sse_util;
pub mod state;

use axum::{
    Router,
    extract::Request,
    http::{HeaderName, HeaderValue, StatusCode, Version, header::USER_AGENT},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use base64::Engine as _;
use rand::RngCore;
use std::time::Instant;
use tower_http::decompression::RequestDecompressionLayer;
use tracing::{error, info, warn};

pub use state::AppState;

const MAX_REQUEST_ID_LEN: usize = 128;
const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

fn generate_request_id() -> String {
    let mut bytes = [0u8; 12];
    rand::rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

fn format_http_version(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_11 => "HTTP/1.1",
        Version::HTTP_2 => "HTTP/2",
        Version::HTTP_3 => "HTTP/3",
        _ => "HTTP/?",
    }
}

async fn not_found_handler() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn access_log(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let version = req.version();

    let request_id = req
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN)
        .map(str::to_string)
        .unwrap_or_else(generate_request_id);

    let user_agent = req.headers().get(USER_AGENT).and_then(|v| v.to_str().ok()).unwrap_or("-").to_string();

    let start = Instant::now();
    let mut resp = next.run(req).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        resp.headers_mut().insert(X_REQUEST_ID, value);
    }

    let status = resp.status();
    let latency_ms = start.elapsed().as_millis();
    let path = uri.path();
    let protocol = format_http_version(version);

    if status.is_server_error() {
        error!(%request_id, %method, protocol, path, latency_ms, %user_agent, status = status.as_u16(), "request");
    } else if status.is_client_error() {
        warn!(%request_id, %method, protocol, path, latency_ms, %user_agent, status = status.as_u16(), "request");
    } else {
        info!(%request_id, %method, protocol, path, latency_ms, %user_agent, status = status.as_u16(), "request");
    }

    resp
}

/// Streaming headers always set on an SSE response (§6).
pub(crate) fn apply_streaming_headers(resp: &mut Response) {
    use axum::http::header::{CACHE_CONTROL, CONNECTION};
    resp.headers_mut().insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    resp.headers_mut().insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    resp.headers_mut().insert("x-accel-buffering", HeaderValue::from_static("no"));
}

pub fn router(state: AppState) -> Router {
    let openai_routes = Router::new()
        .route("/v1/chat/completions", post(openai::chat_completions))
        .route("/v1/models", get(openai::list_models));

    let anthropic_routes = Router::new().route("/v1/messages", post(anthropic::messages));

    let gemini_routes = Router::new()
        .route("/v1beta/models", get(gemini::list_models))
        .route("/v1beta/models/{*rest}", get(gemini::get_model).post(gemini::dispatch_path));

    let operational_routes = Router::new()
        .route("/health", get(operational::health))
        .route("/refresh-token", post(operational::refresh_token))
        .route("/account-limits", get(operational::account_limits));

    Router::new()
        .merge(openai_routes)
        .merge(anthropic_routes)
        .merge(gemini_routes)
        .merge(operational_routes)
        .merge(crate::admin::router())
        .fallback(not_found_handler)
        .with_state(state)
        .layer(middleware::from_fn(access_log))
        .layer(RequestDecompressionLayer::new())
}
