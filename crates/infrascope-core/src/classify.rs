// Name-pattern classification against the org naming convention
use crate::models::{Environment, RepoKind, RepoRecord};

/// Whitelisted names that bypass the standard shape, with their fixed
/// resource designations. Both live under the shared team, global scope.
pub const EXCEPTIONS: &[(&str, &str)] = &[
    ("infra-docs", "documentation"),
    ("infra-scripts", "automation"),
];

/// Marker segment separating the team prefix from environment and resource
const INFRA_MARKER: &str = "-infra-";

/// Outcome of matching a raw name against the naming convention
///
/// Matching is decoupled from record construction so the fetch-time
/// accept/reject gate and the display path share one definition of what a
/// conforming name is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameMatch {
    Standard {
        team: String,
        environment: Environment,
        resource: String,
    },
    Exception {
        resource: &'static str,
    },
    Unclassified,
}

/// Match a raw repository name against the convention, first rule wins
pub fn match_name(name: &str) -> NameMatch {
    for (exception, resource) in EXCEPTIONS {
        if name == *exception {
            return NameMatch::Exception { resource };
        }
    }

    // Decompose <team>-infra-<environment>-<resource>. A team name may
    // itself contain "-infra-", so scan every occurrence left to right and
    // take the first split that yields a legal environment token and a
    // non-empty resource.
    let mut search_from = 0;
    while let Some(offset) = name[search_from..].find(INFRA_MARKER) {
        let marker = search_from + offset;
        let team = &name[..marker];
        let rest = &name[marker + INFRA_MARKER.len()..];

        if !team.is_empty() {
            if let Some((env_token, resource)) = rest.split_once('-') {
                if let Some(environment) = Environment::parse_token(env_token) {
                    if !resource.is_empty() {
                        return NameMatch::Standard {
                            team: team.to_string(),
                            environment,
                            resource: resource.to_string(),
                        };
                    }
                }
            }
        }

        search_from = marker + 1;
    }

    NameMatch::Unclassified
}

/// Classify a name into a full record - total, never fails
pub fn classify(name: &str) -> RepoRecord {
    match match_name(name) {
        NameMatch::Standard {
            team,
            environment,
            resource,
        } => RepoRecord {
            name: name.to_string(),
            team,
            environment,
            resource,
            kind: RepoKind::Standard,
        },
        NameMatch::Exception { resource } => RepoRecord {
            name: name.to_string(),
            team: "shared".to_string(),
            environment: Environment::Global,
            resource: resource.to_string(),
            kind: RepoKind::Exception,
        },
        NameMatch::Unclassified => RepoRecord {
            name: name.to_string(),
            team: "unknown".to_string(),
            environment: Environment::Unknown,
            resource: "unknown".to_string(),
            kind: RepoKind::Unknown,
        },
    }
}

/// Whether a raw name is admitted into the catalog at fetch time
///
/// Names matching neither the standard shape nor the exception list never
/// enter the cached catalog.
pub fn is_catalog_member(name: &str) -> bool {
    !matches!(match_name(name), NameMatch::Unclassified)
}
