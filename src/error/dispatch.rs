use axum::http::StatusCode;
use thiserror::Error as ThisError;

use super::IsRetryable;

/// Errors raised while classifying an upstream response (§4.4 step 5, §7):
/// the dispatcher's own retry-vs-surface taxonomy.
#[derive(Debug, ThisError)]
pub enum DispatchError {
    #[error("upstream authentication failed: {0}")]
    Unauthorized(String),

    #[error("upstream rate limited")]
    RateLimited,

    #[error("upstream transient failure: {0}")]
    UpstreamTransient(String),

    #[error("upstream error {status}: {message}")]
    UpstreamClient { status: StatusCode, message: String },
}

impl DispatchError {
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            DispatchError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            DispatchError::UpstreamTransient(_) => StatusCode::BAD_GATEWAY,
            DispatchError::UpstreamClient { status, .. } => *status,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::Unauthorized(_) => "UNAUTHORIZED",
            DispatchError::RateLimited => "RATE_LIMITED",
            DispatchError::UpstreamTransient(_) | DispatchError::UpstreamClient { .. } => "UPSTREAM_ERROR",
        }
    }

    pub fn message(&self) -> String {
        match self {
            DispatchError::Unauthorized(msg) => msg.clone(),
            DispatchError::RateLimited => "upstream rate limit exceeded".to_string(),
            DispatchError::UpstreamTransient(msg) => msg.clone(),
            DispatchError::UpstreamClient { message, .. } => message.clone(),
        }
    }
}

/// Retried by the dispatcher's loop (§4.4 step 5 / §7 policy): rate limits,
/// auth failures (after marking the account invalid), and transient 5xx/
/// transport errors. A non-retryable 4xx (`UpstreamClient`) surfaces
/// immediately.
impl IsRetryable for DispatchError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            DispatchError::Unauthorized(_) | DispatchError::RateLimited | DispatchError::UpstreamTransient(_)
        )
    }
}
