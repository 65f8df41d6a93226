//! The request dispatcher (§4.4): couples the account pool to the upstream
//! client, retrying across accounts up to 5 times and classifying upstream
//! failures into retry-vs-surface per §7's error taxonomy.

use reqwest::StatusCode;
use tracing::{info, warn};

use crate::error::{DispatchError, GatewayError, PoolError};
use crate::pool::account::now_ms;
use crate::pool::AccountPoolHandle;
use crate::upstream::UpstreamClient;
use gateway_schema::native::AntigravityRequestBody;

const MAX_ATTEMPTS: usize = 5;

pub struct Dispatcher {
    pool: AccountPoolHandle,
    upstream: UpstreamClient,
    cooldown_secs: u64,
}

impl Dispatcher {
    pub fn new(pool: AccountPoolHandle, upstream: UpstreamClient, cooldown_secs: u64) -> Self {
        Self { pool, upstream, cooldown_secs }
    }

    /// Runs the retry loop of §4.4 and returns the upstream response once an
    /// account's call succeeds, or the last classified error after 5 attempts.
    pub async fn dispatch(
        &self,
        mut body: AntigravityRequestBody,
        streaming: bool,
    ) -> Result<reqwest::Response, GatewayError> {
        let mut last_err = GatewayError::Pool(PoolError::NoAccountsAvailable);

        for attempt in 1..=MAX_ATTEMPTS {
            let account = self.pool.select_next().await?;

            let token = match self.pool.get_token(&account.email).await {
                Ok(token) => token,
                Err(e) => {
                    warn!(attempt, email = %account.email, error = %e, "token acquisition failed, trying next account");
                    last_err = e;
                    continue;
                }
            };

            let project = match self.pool.get_project(&account.email, &token).await {
                Ok(project) => project,
                Err(e) => {
                    warn!(attempt, email = %account.email, error = %e, "project discovery failed, trying next account");
                    last_err = e;
                    continue;
                }
            };
            body.project = project;

            info!(attempt, email = %account.email, streaming, "dispatching to upstream");

            let resp = match self.upstream.send(&token, streaming, &body).await {
                Ok(resp) => resp,
                Err(e) => {
                    warn!(attempt, email = %account.email, error = %e, "upstream call failed, trying next account");
                    last_err = e;
                    continue;
                }
            };

            match self.classify(&account.email, resp).await {
                Outcome::Done(resp) => return Ok(resp),
                Outcome::Retry(e) => last_err = e,
                Outcome::Fatal(e) => return Err(e),
            }
        }

        Err(last_err)
    }

    /// Reads `resp`'s status and (for non-2xx) body, applying the account
    /// health-flag side effects each classification implies (§4.4 step 5).
    async fn classify(&self, email: &str, resp: reqwest::Response) -> Outcome {
        let status = resp.status();
        if status.is_success() {
            return Outcome::Done(resp);
        }

        let retry_after = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        let body_text = resp.text().await.unwrap_or_default();

        if status == StatusCode::UNAUTHORIZED || body_text.contains("UNAUTHENTICATED") {
            self.pool.mark_invalid(email, "auth failed");
            return Outcome::Retry(DispatchError::Unauthorized(body_text).into());
        }

        if status == StatusCode::TOO_MANY_REQUESTS || body_text.contains("RESOURCE_EXHAUSTED") {
            let reset_secs = retry_after.unwrap_or(self.cooldown_secs);
            let reset_at = now_ms() + (reset_secs as i64) * 1000;
            self.pool.mark_rate_limited(email, Some(reset_at));
            return Outcome::Retry(DispatchError::RateLimited.into());
        }

        if status.is_server_error() {
            return Outcome::Retry(DispatchError::UpstreamTransient(format!("{status}: {body_text}")).into());
        }

        Outcome::Fatal(DispatchError::UpstreamClient { status, message: body_text }.into())
    }
}

enum Outcome {
    Done(reqwest::Response),
    Retry(GatewayError),
    Fatal(GatewayError),
}

#[cfg(test)]
mod tests {
    #[test]
    fn max_attempts_matches_spec() {
        assert_eq!(super::MAX_ATTEMPTS, 5);
    }
}
