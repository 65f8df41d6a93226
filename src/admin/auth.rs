//! Admin JWT issuance and the `AdminAuth` request guard (§6 — "a minimal
//! guarded sub-router ... keyed off operator credentials instead of a single
//! proxy key"), grounded on the teacher's `RequireKeyAuth` extractor shape
//! but verifying a signed JWT instead of a single static key.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use jsonwebtoken::{DecodingKey, EncodingKey, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use subtle::ConstantTimeEq;

use crate::server::AppState;

const TOKEN_TTL_SECS: i64 = 12 * 60 * 60;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
    iat: i64,
}

/// Constant-time comparison of supplied credentials against configured ones.
pub fn check_credentials(state: &AppState, username: &str, password: &str) -> bool {
    let user_ok: bool = username.as_bytes().ct_eq(state.config.admin_username.as_bytes()).into();
    let pass_ok: bool = password.as_bytes().ct_eq(state.config.admin_password.as_bytes()).into();
    user_ok & pass_ok
}

pub fn issue_token(state: &AppState, username: &str) -> Result<String, AuthError> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims { sub: username.to_string(), exp: now + TOKEN_TTL_SECS, iat: now };
    encode(&jsonwebtoken::Header::default(), &claims, &EncodingKey::from_secret(state.config.jwt_secret.as_bytes()))
        .map_err(|_| AuthError::TokenMint)
}

fn verify_token(secret: &str, token: &str) -> Result<Claims, AuthError> {
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())
        .map(|data| data.claims)
        .map_err(|_| AuthError::InvalidToken)
}

/// Extractor guarding every `/admin/*` route except `/admin/login`.
#[derive(Debug, Clone)]
pub struct AdminAuth {
    pub username: String,
}

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .typed_get::<Authorization<Bearer>>()
            .map(|auth| auth.token().to_string())
            .ok_or(AuthError::MissingToken)?;

        let claims = verify_token(&state.config.jwt_secret, &token)?;
        Ok(AdminAuth { username: claims.sub })
    }
}

#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    InvalidCredentials,
    TokenMint,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, reason) = match self {
            AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "missing admin token"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid or expired admin token"),
            AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid admin credentials"),
            AuthError::TokenMint => (StatusCode::INTERNAL_SERVER_ERROR, "failed to issue token"),
        };
        (status, Json(json!({ "error": "unauthorized", "reason": reason }))).into_response()
    }
}
