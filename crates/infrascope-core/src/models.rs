use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Classified repository record - the star of the show
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepoRecord {
    pub name: String,
    pub team: String,
    pub environment: Environment,
    pub resource: String,
    pub kind: RepoKind,
}

/// Deployment environment token in the naming convention
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
    Global,
    Unknown,
}

impl Environment {
    /// The values a name (or a filter) may legally carry
    pub const SUPPORTED: &'static str = "dev, prod, global";

    /// Parse a name segment into a known environment. `unknown` is not a
    /// token anyone writes into a repository name, so it never parses.
    pub fn parse_token(s: &str) -> Option<Self> {
        match s {
            "dev" => Some(Environment::Dev),
            "prod" => Some(Environment::Prod),
            "global" => Some(Environment::Global),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Prod => "prod",
            Environment::Global => "global",
            Environment::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Environment {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Environment::parse_token(s).ok_or_else(|| crate::Error::InvalidFilter {
            field: "environment",
            value: s.to_string(),
            supported: Environment::SUPPORTED,
        })
    }
}

/// How a name related to the naming convention
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RepoKind {
    /// Matches the generic `<team>-infra-<environment>-<resource>` shape
    Standard,
    /// Explicitly whitelisted name outside the shape
    Exception,
    /// Neither - never admitted into the catalog
    Unknown,
}

impl RepoKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepoKind::Standard => "standard",
            RepoKind::Exception => "exception",
            RepoKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RepoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Exact-match predicates for narrowing a record set
///
/// An absent predicate matches everything in that dimension; present
/// predicates AND together. Built once during argument parsing and passed
/// through the call chain as an immutable value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    pub team: Option<String>,
    pub environment: Option<Environment>,
    pub resource: Option<String>,
}

impl FilterSpec {
    pub fn matches(&self, record: &RepoRecord) -> bool {
        if let Some(ref team) = self.team {
            if record.team != *team {
                return false;
            }
        }
        if let Some(environment) = self.environment {
            if record.environment != environment {
                return false;
            }
        }
        if let Some(ref resource) = self.resource {
            if record.resource != *resource {
                return false;
            }
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.team.is_none() && self.environment.is_none() && self.resource.is_none()
    }
}
