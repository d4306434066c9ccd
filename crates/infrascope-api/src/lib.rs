// GitHub API access for organization repository discovery
pub mod github;
pub mod pacing;

// Re-export common types
pub use github::{GitHubClient, GitHubError, RateLimitSnapshot};
pub use pacing::PacingConfig;
