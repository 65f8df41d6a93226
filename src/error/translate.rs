use axum::http::StatusCode;
use thiserror::Error as ThisError;

use super::IsRetryable;

/// Errors raised while mapping a caller's request into the native shape
/// (§4.2): always the caller's fault, never retried.
#[derive(Debug, ThisError)]
pub enum TranslateError {
    #[error("malformed request: {0}")]
    Malformed(String),
}

impl TranslateError {
    pub fn status(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    pub fn code(&self) -> &'static str {
        "INVALID_REQUEST"
    }
}

impl IsRetryable for TranslateError {
    fn is_retryable(&self) -> bool {
        false
    }
}
