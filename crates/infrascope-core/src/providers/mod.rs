// Repository source implementations
pub mod github;

pub use github::GitHubSource;

use crate::Result;
use infrascope_api::RateLimitSnapshot;

/// Trait for repository sources - makes the orchestrator testable and keeps
/// the door open for other hosting APIs
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RepoSource: Send + Sync {
    /// Probe the credential; returns the authenticated identity
    async fn validate_credentials(&self) -> Result<String>;

    /// Current quota for this credential
    async fn rate_limit(&self) -> Result<RateLimitSnapshot>;

    /// All repository names the organization owns, in API return order
    async fn list_repository_names(&self, organization: &str) -> Result<Vec<String>>;
}
