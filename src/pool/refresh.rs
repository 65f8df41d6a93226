//! Upstream OAuth refresh and project discovery (§4.1 `get_token`,
//! `get_project`), grounded in the teacher's Antigravity OAuth endpoints and
//! `loadCodeAssist`/`onboardUser` discovery calls.

use super::oauth_client::{build_oauth2_client, OauthTokenResponse};
use crate::config::{oauth_defaults, Config};
use crate::error::OauthError;
use oauth2::{RedirectUrl, RefreshToken, TokenResponse};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Result of a successful token refresh: new access token plus its absolute
/// expiry (epoch ms) and, if the upstream rotated it, a new refresh token.
#[derive(Debug, Clone)]
pub struct RefreshedToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub access_token_expires_at: i64,
}

fn oauth_client() -> Result<super::oauth_client::StandardOauth2Client, OauthError> {
    let redirect = RedirectUrl::new(oauth_defaults::redirect_url().to_string())
        .map_err(|e| OauthError::Other { message: e.to_string() })?;
    build_oauth2_client(
        oauth_defaults::CLIENT_ID,
        Some(oauth_defaults::CLIENT_SECRET),
        oauth_defaults::auth_url().as_str(),
        oauth_defaults::token_url().as_str(),
        redirect,
    )
}

/// Exchanges `refresh_token` for a fresh access token. HTTP 400/401 surfaces
/// as [`OauthError::UpstreamStatus`], which the pool treats as a permanent
/// failure ("refresh failed") and 5xx/network failures as transient.
pub async fn refresh_access_token(
    http_client: &reqwest::Client,
    refresh_token: &str,
) -> Result<RefreshedToken, OauthError> {
    let client = oauth_client()?;

    let token: OauthTokenResponse = client
        .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
        .request_async(http_client)
        .await?;

    let expires_in_secs = token.expires_in().map(|d| d.as_secs() as i64).unwrap_or(3600);
    let access_token_expires_at = crate::pool::account::now_ms() + expires_in_secs * 1000;

    Ok(RefreshedToken {
        access_token: token.access_token().secret().clone(),
        refresh_token: token.refresh_token().map(|t| t.secret().clone()),
        access_token_expires_at,
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestMetadata {
    ide_type: &'static str,
    platform: &'static str,
    plugin_type: &'static str,
}

impl Default for RequestMetadata {
    fn default() -> Self {
        Self {
            ide_type: "IDE_UNSPECIFIED",
            platform: "PLATFORM_UNSPECIFIED",
            plugin_type: "GEMINI",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoadCodeAssistResponse {
    cloudaicompanion_project: Option<String>,
    #[serde(default)]
    allowed_tiers: Vec<AllowedTier>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AllowedTier {
    id: Option<String>,
    #[serde(default)]
    is_default: bool,
}

/// Discovers the Google Cloud project backing an account by calling the
/// upstream `loadCodeAssist` endpoint and, if no project is yet associated,
/// `onboardUser` with the account's default tier (§4.1 `get_project`).
pub async fn discover_project(
    http_client: &reqwest::Client,
    api_base: &str,
    access_token: &str,
) -> Result<String, OauthError> {
    let load_url = format!("{}/v1internal:loadCodeAssist", api_base.trim_end_matches('/'));
    let resp = http_client
        .post(load_url)
        .bearer_auth(access_token)
        .json(&json!({ "metadata": RequestMetadata::default() }))
        .send()
        .await?;
    if !resp.status().is_success() {
        return Err(OauthError::UpstreamStatus(resp.status()));
    }
    let parsed: LoadCodeAssistResponse = resp.json().await?;

    if let Some(project) = parsed.cloudaicompanion_project {
        return Ok(project);
    }

    let tier_id = parsed
        .allowed_tiers
        .iter()
        .find(|t| t.is_default)
        .or_else(|| parsed.allowed_tiers.first())
        .and_then(|t| t.id.clone())
        .unwrap_or_else(|| "free-tier".to_string());

    let onboard_url = format!("{}/v1internal:onboardUser", api_base.trim_end_matches('/'));
    let resp = http_client
        .post(onboard_url)
        .bearer_auth(access_token)
        .json(&json!({ "tierId": tier_id, "metadata": RequestMetadata::default() }))
        .send()
        .await?;
    if !resp.status().is_success() {
        return Err(OauthError::UpstreamStatus(resp.status()));
    }
    let body: Value = resp.json().await?;
    body.get("cloudaicompanionProject")
        .and_then(|v| v.get("id"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| OauthError::Other {
            message: "onboardUser response missing cloudaicompanionProject.id".into(),
        })
}

/// Falls back to `Config::default_project_id` when discovery fails and the
/// account has no cached project (§4.1 `get_project`).
pub fn configured_default_project(cfg: &Config) -> Option<String> {
    cfg.default_project_id.clone()
}
