//! The `Account` record (§3): one upstream OAuth credential plus the health
//! and bookkeeping fields the pool mutates as it selects, refreshes, and
//! retires credentials.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Returns the current time as epoch milliseconds, matching the wire/storage
/// representation used throughout the pool.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Where an account's credential originated. Purely informational; does not
/// change selection or refresh behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountSource {
    Oauth,
    Manual,
    Import,
    Legacy,
}

/// One upstream credential plus its health/bookkeeping (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub email: String,

    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub access_token_expires_at: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub source: AccountSource,

    #[serde(default)]
    pub is_rate_limited: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit_reset_at: Option<i64>,

    #[serde(default)]
    pub is_invalid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalid_reason: Option<String>,

    pub added_at: i64,
    pub last_used_at: i64,
}

impl Account {
    /// Builds a freshly onboarded OAuth account; `added_at`/`last_used_at`
    /// are set to now.
    pub fn new_oauth(
        email: impl Into<String>,
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        access_token_expires_at: i64,
        project_id: Option<String>,
    ) -> Self {
        let now = now_ms();
        Self {
            email: email.into(),
            access_token: access_token.into(),
            refresh_token,
            access_token_expires_at,
            project_id,
            source: AccountSource::Oauth,
            is_rate_limited: false,
            rate_limit_reset_at: None,
            is_invalid: false,
            invalid_reason: None,
            added_at: now,
            last_used_at: now,
        }
    }

    /// An account with no refresh token becomes invalid once its access
    /// token has expired (§3 invariant).
    pub fn heal_expiry(&mut self) {
        if self.refresh_token.is_none() && now_ms() >= self.access_token_expires_at {
            self.is_invalid = true;
            self.invalid_reason.get_or_insert_with(|| "access token expired, no refresh token".into());
        }
    }

    /// An account is selectable if it isn't invalid, and is either not
    /// rate-limited or its cooldown has already elapsed (auto-heal on read).
    pub fn is_eligible(&mut self) -> bool {
        self.heal_expiry();
        if self.is_invalid {
            return false;
        }
        if self.is_rate_limited {
            match self.rate_limit_reset_at {
                Some(reset_at) if now_ms() > reset_at => {
                    self.is_rate_limited = false;
                    self.rate_limit_reset_at = None;
                    true
                }
                None => false,
                Some(_) => false,
            }
        } else {
            true
        }
    }

    /// Seconds until `rate_limit_reset_at`, or `None` if the cooldown is
    /// indefinite or the account isn't currently rate-limited.
    pub fn cooldown_remaining_secs(&self) -> Option<i64> {
        if !self.is_rate_limited {
            return None;
        }
        self.rate_limit_reset_at
            .map(|reset_at| (reset_at - now_ms()).max(0) / 1000)
    }

    /// Sets cooldown; idempotent and never reduces an existing later reset
    /// (§4.1 `mark_rate_limited`).
    pub fn mark_rate_limited(&mut self, reset_at: Option<i64>) {
        if self.is_rate_limited {
            match (self.rate_limit_reset_at, reset_at) {
                (Some(existing), Some(candidate)) if candidate <= existing => return,
                (None, Some(_)) => return, // existing is indefinite; never shorten it
                _ => {}
            }
        }
        self.is_rate_limited = true;
        self.rate_limit_reset_at = reset_at;
    }

    pub fn mark_invalid(&mut self, reason: impl Into<String>) {
        self.is_invalid = true;
        self.invalid_reason = Some(reason.into());
    }

    pub fn revalidate(&mut self) {
        self.is_invalid = false;
        self.invalid_reason = None;
    }

    pub fn clear_rate_limit(&mut self) {
        self.is_rate_limited = false;
        self.rate_limit_reset_at = None;
    }

    pub fn touch_last_used(&mut self) {
        self.last_used_at = now_ms();
    }

    /// True if the cached access token is valid for at least `safety_window_secs`
    /// more seconds (§4.1 `get_token`).
    pub fn token_fresh_for(&self, safety_window_secs: i64) -> bool {
        self.access_token_expires_at - now_ms() >= safety_window_secs * 1000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_account() -> Account {
        Account::new_oauth(
            "a@example.com",
            "tok",
            Some("refresh".into()),
            now_ms() + 3_600_000,
            Some("proj-1".into()),
        )
    }

    #[test]
    fn eligible_when_healthy() {
        let mut a = fresh_account();
        assert!(a.is_eligible());
    }

    #[test]
    fn invalid_accounts_are_never_eligible() {
        let mut a = fresh_account();
        a.mark_invalid("auth failed");
        assert!(!a.is_eligible());
    }

    #[test]
    fn rate_limited_with_future_reset_is_not_eligible() {
        let mut a = fresh_account();
        a.mark_rate_limited(Some(now_ms() + 60_000));
        assert!(!a.is_eligible());
    }

    #[test]
    fn rate_limited_account_self_heals_once_reset_passes() {
        let mut a = fresh_account();
        a.mark_rate_limited(Some(now_ms() - 1));
        assert!(a.is_eligible());
        assert!(!a.is_rate_limited);
    }

    #[test]
    fn indefinite_cooldown_never_self_heals() {
        let mut a = fresh_account();
        a.mark_rate_limited(None);
        assert!(!a.is_eligible());
    }

    #[test]
    fn mark_rate_limited_never_shortens_existing_later_reset() {
        let mut a = fresh_account();
        let far = now_ms() + 600_000;
        a.mark_rate_limited(Some(far));
        a.mark_rate_limited(Some(now_ms() + 1_000));
        assert_eq!(a.rate_limit_reset_at, Some(far));
    }

    #[test]
    fn mark_rate_limited_never_overrides_indefinite_cooldown() {
        let mut a = fresh_account();
        a.mark_rate_limited(None);
        a.mark_rate_limited(Some(now_ms() + 1_000));
        assert_eq!(a.rate_limit_reset_at, None);
        assert!(a.is_rate_limited);
    }

    #[test]
    fn revalidate_clears_invalid_flag() {
        let mut a = fresh_account();
        a.mark_invalid("refresh failed");
        a.revalidate();
        assert!(!a.is_invalid);
        assert!(a.invalid_reason.is_none());
    }

    #[test]
    fn account_without_refresh_token_becomes_invalid_after_expiry() {
        let mut a = Account::new_oauth("a@example.com", "tok", None, now_ms() - 1, None);
        assert!(!a.is_eligible()); // heal_expiry runs inside is_eligible
        assert!(a.is_invalid);
    }

    #[test]
    fn token_fresh_for_respects_safety_window() {
        let a = Account::new_oauth("a@example.com", "tok", None, now_ms() + 30_000, None);
        assert!(!a.token_fresh_for(60));
        assert!(a.token_fresh_for(10));
    }
}
