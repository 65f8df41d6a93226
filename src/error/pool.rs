use axum::http::StatusCode;
use thiserror::Error as ThisError;

use super::{IsRetryable, OauthError};

/// Errors raised by the account pool layer (§4.1): selection, credential
/// acquisition, and administrative mutation failures.
#[derive(Debug, ThisError)]
pub enum PoolError {
    #[error("no accounts available")]
    NoAccountsAvailable,

    #[error("account pool is at capacity")]
    CapacityExceeded,

    #[error("no such account: {0}")]
    NotFound(String),

    #[error("credential unavailable for {email}: {reason}")]
    CredentialUnavailable { email: String, reason: String },

    #[error(transparent)]
    Oauth(#[from] OauthError),

    #[error("pool actor error: {0}")]
    Actor(String),
}

impl PoolError {
    pub fn status(&self) -> StatusCode {
        match self {
            PoolError::NoAccountsAvailable => StatusCode::SERVICE_UNAVAILABLE,
            PoolError::CapacityExceeded => StatusCode::BAD_REQUEST,
            PoolError::NotFound(_) => StatusCode::NOT_FOUND,
            PoolError::CredentialUnavailable { .. } => StatusCode::UNAUTHORIZED,
            PoolError::Oauth(_) | PoolError::Actor(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            PoolError::NoAccountsAvailable => "NO_ACCOUNTS_AVAILABLE",
            PoolError::CapacityExceeded => "CAPACITY_EXCEEDED",
            PoolError::NotFound(_) => "ACCOUNT_NOT_FOUND",
            PoolError::CredentialUnavailable { .. } => "UNAUTHORIZED",
            PoolError::Oauth(_) | PoolError::Actor(_) => "INTERNAL_ERROR",
        }
    }
}

impl IsRetryable for PoolError {
    fn is_retryable(&self) -> bool {
        match self {
            PoolError::Oauth(e) => e.is_retryable(),
            _ => false,
        }
    }
}
