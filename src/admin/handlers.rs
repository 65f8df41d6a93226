//! Admin route handlers (§6): login plus the account-pool mutators that are
//! the only way to change pool state outside the dispatcher's own
//! rate-limit/invalid flags.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::TypedHeader;
use axum_extra::headers::{Authorization, authorization::Basic};
use serde::Deserialize;
use serde_json::{json, Value};

use super::auth::{check_credentials, issue_token, AdminAuth, AuthError};
use crate::error::GatewayError;
use crate::pool::account::{Account, AccountSource};
use crate::server::AppState;

pub async fn login(
    State(state): State<AppState>,
    TypedHeader(auth): TypedHeader<Authorization<Basic>>,
) -> Result<Json<Value>, AuthError> {
    if !check_credentials(&state, auth.username(), auth.password()) {
        return Err(AuthError::InvalidCredentials);
    }
    let token = issue_token(&state, auth.username())?;
    Ok(Json(json!({ "token": token, "token_type": "Bearer" })))
}

pub async fn list_accounts(_admin: AdminAuth, State(state): State<AppState>) -> Result<Json<Value>, GatewayError> {
    let status = state.pool.status().await?;
    Ok(Json(serde_json::to_value(status).unwrap_or(Value::Null)))
}

#[derive(Debug, Deserialize)]
pub struct AddAccountRequest {
    pub email: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub access_token_expires_at: i64,
    pub project_id: Option<String>,
}

pub async fn add_account(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Json(req): Json<AddAccountRequest>,
) -> Result<StatusCode, GatewayError> {
    let mut account = Account::new_oauth(
        req.email,
        req.access_token,
        req.refresh_token,
        req.access_token_expires_at,
        req.project_id,
    );
    account.source = AccountSource::Manual;
    state.pool.add_or_replace(account).await?;
    Ok(StatusCode::CREATED)
}

pub async fn delete_account(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<StatusCode, GatewayError> {
    state.pool.delete(&email).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn revalidate_account(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<StatusCode, GatewayError> {
    state.pool.revalidate(&email).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reset_cooldowns(_admin: AdminAuth, State(state): State<AppState>) -> StatusCode {
    state.pool.reset_all_rate_limits();
    StatusCode::NO_CONTENT
}

pub async fn clear_caches(_admin: AdminAuth, State(state): State<AppState>) -> StatusCode {
    state.pool.clear_all_token_caches();
    StatusCode::NO_CONTENT
}

