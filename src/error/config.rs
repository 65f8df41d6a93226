use thiserror::Error as ThisError;

/// Errors raised while assembling `Config` from env/defaults (§6).
#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Extract(String),
}
