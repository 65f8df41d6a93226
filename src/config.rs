//! Layered configuration: environment variables merged over documented
//! defaults, following §6's env-var contract plus the ambient knobs needed
//! to run the account pool and HTTP server.

use figment::{
    Figment,
    providers::{Env, Format as _, Serialized},
};
use serde::{Deserialize, Serialize};
use std::{
    net::{IpAddr, Ipv4Addr},
    path::PathBuf,
    sync::LazyLock,
};
use url::Url;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// TOML/env: `LISTEN_ADDR`. Default `0.0.0.0`.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: IpAddr,

    /// env: `LISTEN_PORT`. Default `8080`.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// env: `LOGLEVEL`. Default `info`.
    #[serde(default = "default_loglevel")]
    pub loglevel: String,

    /// env: `DATA_DIR`. Directory holding `accounts.json`. Default `./data`.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// env: `JWT_SECRET`. Empty means a random per-process secret is minted
    /// at startup (admin sessions do not survive a restart in that case).
    #[serde(default)]
    pub jwt_secret: String,

    /// env: `ADMIN_USERNAME`. Default `admin`.
    #[serde(default = "default_admin_username")]
    pub admin_username: String,

    /// env: `ADMIN_PASSWORD`. Default `admin`; operators are expected to
    /// override this in any non-local deployment.
    #[serde(default = "default_admin_password")]
    pub admin_password: String,

    /// env: `SEARCH_PROVIDER` (`serper` | `bing`). Unset disables the shim.
    #[serde(default)]
    pub search_provider: Option<String>,

    /// env: `SERPER_API_KEY`.
    #[serde(default)]
    pub serper_api_key: Option<String>,

    /// env: `BING_API_KEY`.
    #[serde(default)]
    pub bing_api_key: Option<String>,

    /// env: `SEARCH_MAX_RESULTS`. Default `5`.
    #[serde(default = "default_search_max_results")]
    pub search_max_results: u32,

    /// env: `ENABLE_WEB_SEARCH`. Default `false`.
    #[serde(default)]
    pub enable_web_search: bool,

    /// env: `DEFAULT_PROJECT_ID`. Fallback when upstream project discovery
    /// fails and the selected account has none cached.
    #[serde(default)]
    pub default_project_id: Option<String>,

    /// env: `COOLDOWN_SECS`. Default rate-limit cooldown. Default `60`.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,

    /// env: `MAX_ACCOUNTS`. Hard pool capacity. Default `10`.
    #[serde(default = "default_max_accounts")]
    pub max_accounts: usize,

    /// env: `PROXY_URL`. Outbound proxy for upstream calls, if any.
    #[serde(default)]
    pub proxy_url: Option<Url>,

    /// env: `ENABLE_MULTIPLEXING`. HTTP/2 multiplexing for the upstream
    /// client. Default `false`.
    #[serde(default = "default_enable_multiplexing")]
    pub enable_multiplexing: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            listen_port: default_listen_port(),
            loglevel: default_loglevel(),
            data_dir: default_data_dir(),
            jwt_secret: String::new(),
            admin_username: default_admin_username(),
            admin_password: default_admin_password(),
            search_provider: None,
            serper_api_key: None,
            bing_api_key: None,
            search_max_results: default_search_max_results(),
            enable_web_search: false,
            default_project_id: None,
            cooldown_secs: default_cooldown_secs(),
            max_accounts: default_max_accounts(),
            proxy_url: None,
            enable_multiplexing: default_enable_multiplexing(),
        }
    }
}

fn default_listen_addr() -> IpAddr {
    Ipv4Addr::new(0, 0, 0, 0).into()
}
fn default_listen_port() -> u16 {
    8080
}
fn default_loglevel() -> String {
    "info".to_string()
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_admin_username() -> String {
    "admin".to_string()
}
fn default_admin_password() -> String {
    "admin".to_string()
}
fn default_search_max_results() -> u32 {
    5
}
fn default_cooldown_secs() -> u64 {
    60
}
fn default_max_accounts() -> usize {
    10
}
fn default_enable_multiplexing() -> bool {
    false
}

impl Config {
    /// Builds a Figment merging documented defaults with raw (unprefixed)
    /// environment variables, matching each field's upper-snake-case name.
    pub fn figment() -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Env::raw())
    }

    pub fn load() -> Self {
        let mut cfg: Self = Self::figment()
            .extract()
            .unwrap_or_else(|err| panic!("failed to extract configuration: {err}"));

        if cfg.jwt_secret.trim().is_empty() {
            cfg.jwt_secret = Uuid::new_v4().to_string();
            tracing::warn!(
                "JWT_SECRET not set; minted a random per-process secret, admin sessions will not \
                 survive a restart"
            );
        }

        cfg
    }

    pub fn accounts_path(&self) -> PathBuf {
        self.data_dir.join("accounts.json")
    }
}

/// Fixed upstream OAuth endpoints and client credentials. Not configurable:
/// the Antigravity/Cloud-Code upstream only trusts these.
pub mod oauth_defaults {
    use url::Url;

    pub fn auth_url() -> Url {
        Url::parse("https://accounts.google.com/o/oauth2/v2/auth")
            .expect("fixed oauth auth_url must be valid")
    }

    pub fn token_url() -> Url {
        Url::parse("https://oauth2.googleapis.com/token")
            .expect("fixed oauth token_url must be valid")
    }

    pub fn redirect_url() -> Url {
        Url::parse("http://localhost:8188").expect("fixed oauth redirect_url must be valid")
    }

    pub const CLIENT_ID: &str =
        "1071006060591-tmhssin2h21lcre235vtolojh4g403ep.apps.googleusercontent.com";
    pub const CLIENT_SECRET: &str = "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";

    pub fn scopes() -> Vec<String> {
        vec![
            "https://www.googleapis.com/auth/cloud-platform".to_string(),
            "https://www.googleapis.com/auth/userinfo.email".to_string(),
            "https://www.googleapis.com/auth/userinfo.profile".to_string(),
        ]
    }
}

/// Global, lazily-initialized configuration for call sites that cannot
/// thread a `Config` value through (e.g. the `extra`-preserving schema
/// helpers). The binary entrypoint uses `Config::load()` directly.
pub static CONFIG: LazyLock<Config> = LazyLock::new(Config::load);
