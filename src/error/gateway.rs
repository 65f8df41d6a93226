use axum::{Json, http::StatusCode, response::IntoResponse};
use gateway_schema::{anthropic::AnthropicErrorBody, openai::OpenaiErrorBody};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error as ThisError;

use super::{ConfigError, DispatchError, IsRetryable, PoolError, TranslateError};

/// The gateway's top-level error type (§7): a thin composition of one
/// `thiserror` enum per layer (`PoolError`, `TranslateError`,
/// `DispatchError`, `ConfigError`), plus the handful of generic
/// infrastructure failures (actor-call plumbing, raw transport/codec
/// errors) that don't belong to any single layer.
#[derive(Debug, ThisError)]
pub enum GatewayError {
    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Translate(#[from] TranslateError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Pool(e) => e.status(),
            GatewayError::Translate(e) => e.status(),
            GatewayError::Dispatch(e) => e.status(),
            GatewayError::Config(_)
            | GatewayError::Internal(_)
            | GatewayError::Reqwest(_)
            | GatewayError::Json(_)
            | GatewayError::Io(_)
            | GatewayError::Url(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code_and_message(&self) -> (&'static str, String) {
        match self {
            GatewayError::Pool(e) => (e.code(), e.to_string()),
            GatewayError::Translate(e) => (e.code(), e.to_string()),
            GatewayError::Dispatch(e) => (e.code(), e.message()),
            GatewayError::Config(_) => ("INTERNAL_ERROR", "configuration error".into()),
            GatewayError::Internal(msg) => ("INTERNAL_ERROR", msg.clone()),
            GatewayError::Reqwest(_) | GatewayError::Url(_) => {
                ("UPSTREAM_ERROR", "upstream request failed".into())
            }
            GatewayError::Json(_) => ("BAD_UPSTREAM_PAYLOAD", "failed to parse payload".into()),
            GatewayError::Io(_) => ("INTERNAL_ERROR", "storage error".into()),
        }
    }

    /// Render as an OpenAI-shaped error body (`/v1/chat/completions`, `/v1/models`).
    pub fn into_openai_response(self) -> axum::response::Response {
        let status = self.status();
        let (code, message) = self.code_and_message();
        let body = OpenaiErrorBody::new(message, code);
        (status, Json(body)).into_response()
    }

    /// Render as an Anthropic-shaped error body (`/v1/messages`).
    pub fn into_anthropic_response(self) -> axum::response::Response {
        let status = self.status();
        let (code, message) = self.code_and_message();
        let body = AnthropicErrorBody::new(code.to_ascii_lowercase(), message);
        (status, Json(body)).into_response()
    }

    /// Render as a Gemini-shaped error body (`/v1beta/models/...`).
    pub fn into_gemini_response(self) -> axum::response::Response {
        let status = self.status();
        let (code, message) = self.code_and_message();
        let body = json!({
            "error": {
                "code": status.as_u16(),
                "message": message,
                "status": code,
            }
        });
        (status, Json(body)).into_response()
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let (code, message) = self.code_and_message();
        (status, Json(GenericErrorBody { error: GenericErrorObject { code: code.to_string(), message, details: None } })).into_response()
    }
}

#[derive(Serialize)]
struct GenericErrorObject {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

#[derive(Serialize)]
struct GenericErrorBody {
    error: GenericErrorObject,
}

impl IsRetryable for GatewayError {
    fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Pool(e) => e.is_retryable(),
            GatewayError::Translate(e) => e.is_retryable(),
            GatewayError::Dispatch(e) => e.is_retryable(),
            GatewayError::Reqwest(_) => true,
            _ => false,
        }
    }
}
