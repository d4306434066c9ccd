use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use crate::pacing::PacingConfig;

const GITHUB_API_BASE: &str = "https://api.github.com";

/// Page size for repository listings - GitHub's documented maximum
const PER_PAGE: u32 = 100;

#[derive(Error, Debug)]
pub enum GitHubError {
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("rate limit exhausted, window resets at {reset_at}")]
    RateLimited { reset_at: DateTime<Utc> },

    #[error("API request failed: {0}")]
    Api(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GitHubError>;

/// Point-in-time view of the core API quota
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateLimitSnapshot {
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

pub struct GitHubClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
    pacing: PacingConfig,
}

impl GitHubClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, GITHUB_API_BASE.to_string())
    }

    /// For GitHub Enterprise instances or test servers
    pub fn with_base_url(token: impl Into<String>, base_url: String) -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("infrascope/0.1.0"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/vnd.github+json"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            token: token.into(),
            base_url,
            pacing: PacingConfig::default(),
        }
    }

    /// Create client with custom pacing configuration
    pub fn with_pacing(token: impl Into<String>, pacing: PacingConfig) -> Self {
        let mut client = Self::new(token);
        client.pacing = pacing;
        client
    }

    /// Authorization header value for this client's credential
    ///
    /// Fine-grained tokens want the `Bearer` scheme; classic tokens use the
    /// older `token` scheme. The prefix tells them apart.
    fn auth_header(&self) -> String {
        auth_header_value(&self.token)
    }

    /// Probe the credential against the current-user endpoint
    ///
    /// Runs once per invocation, before any page is fetched. Returns the
    /// authenticated login for diagnostic logging.
    pub async fn validate_token(&self) -> Result<String> {
        let url = format!("{}/user", self.base_url);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .send()
            .await?;

        if response.status() == 401 {
            return Err(GitHubError::AuthFailed(
                "token rejected by the API".to_string(),
            ));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GitHubError::Api(format!("status {}: {}", status, body)));
        }

        let user: AuthenticatedUser = response.json().await?;
        debug!("authenticated as {}", user.login);
        Ok(user.login)
    }

    /// Read the core quota from the rate-limit endpoint
    pub async fn rate_limit(&self) -> Result<RateLimitSnapshot> {
        let url = format!("{}/rate_limit", self.base_url);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .send()
            .await?;

        if response.status() == 401 {
            return Err(GitHubError::AuthFailed(
                "token rejected by the API".to_string(),
            ));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GitHubError::Api(format!("status {}: {}", status, body)));
        }

        let limits: RateLimitResponse = response.json().await?;
        let core = limits.resources.core;
        let reset_at = DateTime::from_timestamp(core.reset, 0)
            .ok_or_else(|| GitHubError::Api(format!("reset timestamp out of range: {}", core.reset)))?;

        Ok(RateLimitSnapshot {
            remaining: core.remaining,
            reset_at,
        })
    }

    /// Fetch every repository name the organization owns
    ///
    /// Pages are requested sequentially, 100 at a time, until an empty page
    /// comes back. The fetch is all-or-nothing: an API error on any page
    /// aborts the whole traversal and prior pages are discarded.
    pub async fn list_org_repos(&self, organization: &str) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut page: u32 = 1;

        loop {
            if page > 1 && !self.pacing.page_delay().is_zero() {
                tokio::time::sleep(self.pacing.page_delay()).await;
            }

            let url = format!("{}/orgs/{}/repos", self.base_url, organization);
            trace!("fetching page {} for {}", page, organization);

            let response = self
                .client
                .get(&url)
                .header(reqwest::header::AUTHORIZATION, self.auth_header())
                .query(&[
                    ("per_page", PER_PAGE.to_string()),
                    ("page", page.to_string()),
                ])
                .send()
                .await?;

            if response.status() == 401 {
                return Err(GitHubError::AuthFailed(
                    "token rejected by the API".to_string(),
                ));
            }

            // Quota exhausted mid-traversal shows up as a 403/429 with a
            // zeroed remaining header, not as an error-message body
            if response.status() == 403 || response.status() == 429 {
                if let Some(reset_at) = rate_limit_reset(response.headers()) {
                    return Err(GitHubError::RateLimited { reset_at });
                }
            }

            let body = response.text().await?;
            let page_names = parse_repo_page(&body)?;

            if page_names.is_empty() {
                break;
            }

            debug!("page {}: {} repositories", page, page_names.len());
            names.extend(page_names);
            page += 1;
        }

        Ok(names)
    }
}

/// Select the authorization header value by token prefix
///
/// Fine-grained personal access tokens (`github_pat_...`) authenticate with
/// `Bearer`; classic tokens (`ghp_...` and friends) use `token`.
pub fn auth_header_value(token: &str) -> String {
    if token.starts_with("github_pat_") {
        format!("Bearer {}", token)
    } else {
        format!("token {}", token)
    }
}

/// Read the reset instant out of a quota-exhausted response's headers
///
/// Only trips when the remaining header is literally zero; other 403s
/// (missing scopes, org restrictions) fall through to the error-body path.
fn rate_limit_reset(headers: &reqwest::header::HeaderMap) -> Option<DateTime<Utc>> {
    let remaining = headers.get("x-ratelimit-remaining")?.to_str().ok()?;
    if remaining != "0" {
        return None;
    }
    let reset = headers
        .get("x-ratelimit-reset")?
        .to_str()
        .ok()?
        .parse::<i64>()
        .ok()?;
    DateTime::from_timestamp(reset, 0)
}

/// Parse one page of the repository listing
///
/// A successful page is a JSON array of repository objects; an API-level
/// failure is an object carrying a `message` field. Anything else is a
/// parse error.
pub fn parse_repo_page(body: &str) -> Result<Vec<String>> {
    let page: RepoPage = serde_json::from_str(body)?;
    match page {
        RepoPage::Repos(repos) => Ok(repos.into_iter().map(|r| r.name).collect()),
        RepoPage::Error(err) => Err(GitHubError::Api(err.message)),
    }
}

#[derive(Debug, Deserialize)]
struct AuthenticatedUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RateLimitResponse {
    resources: RateLimitResources,
}

#[derive(Debug, Deserialize)]
struct RateLimitResources {
    core: RateLimitResource,
}

#[derive(Debug, Deserialize)]
struct RateLimitResource {
    remaining: u32,
    reset: i64,
}

#[derive(Debug, Deserialize)]
struct OrgRepo {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RepoPage {
    Repos(Vec<OrgRepo>),
    Error(ApiErrorBody),
}
