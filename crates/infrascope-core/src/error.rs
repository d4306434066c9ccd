use chrono::{DateTime, Utc};
use thiserror::Error;

/// All the ways a discovery run can go wrong
///
/// Every variant is terminal for the current invocation - there is no
/// in-process retry or recovery. The mitigations are operator-level: fix
/// the token, wait out the rate-limit window, rerun without cache-only.
#[derive(Error, Debug)]
pub enum Error {
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("rate limit exhausted, window resets at {reset_at}")]
    RateLimited { reset_at: DateTime<Utc> },

    #[error("API error: {0}")]
    Api(String),

    #[error("no cached catalog found")]
    CacheMiss,

    #[error("unsupported {field} '{value}', expected one of: {supported}")]
    InvalidFilter {
        field: &'static str,
        value: String,
        supported: &'static str,
    },

    #[error("cache operation failed: {0}")]
    Cache(#[from] infrascope_cache::CacheError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<infrascope_api::GitHubError> for Error {
    fn from(err: infrascope_api::GitHubError) -> Self {
        use infrascope_api::GitHubError;
        match err {
            GitHubError::AuthFailed(msg) => Error::AuthFailed(msg),
            GitHubError::RateLimited { reset_at } => Error::RateLimited { reset_at },
            GitHubError::Api(msg) => Error::Api(msg),
            GitHubError::Network(e) => Error::Network(e),
            GitHubError::Parse(e) => Error::Serialization(e),
        }
    }
}
