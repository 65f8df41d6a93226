pub mod admin;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod ids;
pub mod pool;
pub mod server;
pub mod translate;
pub mod upstream;
pub mod utils;

pub use error::{ConfigError, DispatchError, GatewayError, OauthError, PoolError, TranslateError};
