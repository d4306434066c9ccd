// GitHub source - bridges the API client with the RepoSource trait
use async_trait::async_trait;
use infrascope_api::{GitHubClient, PacingConfig, RateLimitSnapshot};

use crate::{providers::RepoSource, Result};

/// Wrapper around GitHubClient that implements RepoSource
pub struct GitHubSource {
    client: GitHubClient,
}

impl GitHubSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            client: GitHubClient::new(token),
        }
    }

    /// For GitHub Enterprise instances
    pub fn with_base_url(token: impl Into<String>, base_url: String) -> Self {
        Self {
            client: GitHubClient::with_base_url(token, base_url),
        }
    }

    /// Custom inter-page pacing (tests set it to zero)
    pub fn with_pacing(token: impl Into<String>, pacing: PacingConfig) -> Self {
        Self {
            client: GitHubClient::with_pacing(token, pacing),
        }
    }
}

#[async_trait]
impl RepoSource for GitHubSource {
    async fn validate_credentials(&self) -> Result<String> {
        Ok(self.client.validate_token().await?)
    }

    async fn rate_limit(&self) -> Result<RateLimitSnapshot> {
        Ok(self.client.rate_limit().await?)
    }

    async fn list_repository_names(&self, organization: &str) -> Result<Vec<String>> {
        Ok(self.client.list_org_repos(organization).await?)
    }
}
