mod config;
mod dispatch;
mod gateway;
mod oauth;
mod pool;
mod translate;

pub use config::ConfigError;
pub use dispatch::DispatchError;
pub use gateway::GatewayError;
pub use oauth::OauthError;
pub use pool::PoolError;
pub use translate::TranslateError;

pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}
