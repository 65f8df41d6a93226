//! Operational endpoints (§6): liveness, a manual token-refresh trigger,
//! and a read-only view of account rate-limit state. Unauthenticated —
//! these carry no secrets and exist for deployment probes/dashboards.

use axum::{Json, extract::State};
use serde_json::{Value, json};

use super::AppState;
use crate::error::GatewayError;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Forces every account's cached access token to be treated as expired, so
/// the next `get_token` call for each one performs a real refresh (§4.1).
pub async fn refresh_token(State(state): State<AppState>) -> Json<Value> {
    state.pool.clear_all_token_caches();
    Json(json!({ "status": "refresh scheduled" }))
}

pub async fn account_limits(State(state): State<AppState>) -> Result<Json<Value>, GatewayError> {
    let status = state.pool.status().await?;
    Ok(Json(serde_json::to_value(status).unwrap_or(Value::Null)))
}
