// Discovery orchestration - cache vs. fetch, accept-filter, projection
use infrascope_cache::{DiscoverySnapshot, SnapshotStore};
use tracing::{debug, info, warn};

use crate::classify;
use crate::filter;
use crate::format::{self, OutputFormat};
use crate::models::FilterSpec;
use crate::providers::RepoSource;
use crate::{Error, Result};

/// Quota threshold below which we warn but keep going
pub const LOW_QUOTA_WATERMARK: u32 = 10;

/// Per-invocation switches for the discovery flow
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscoverOptions {
    /// Serve from the cache file only, stale or not; never touch the network
    pub cache_only: bool,
    /// Fetch even when the cache is still fresh
    pub force_refresh: bool,
}

/// Composes client, classifier, cache, filter and formatter per invocation
///
/// Holds no state across invocations beyond what it reads from and writes
/// to the snapshot store.
pub struct DiscoveryEngine {
    source: Option<Box<dyn RepoSource>>,
    store: SnapshotStore,
}

impl DiscoveryEngine {
    pub fn new(source: Box<dyn RepoSource>, store: SnapshotStore) -> Self {
        Self {
            source: Some(source),
            store,
        }
    }

    /// Engine without a network source, for cache-only invocations
    pub fn offline(store: SnapshotStore) -> Self {
        Self {
            source: None,
            store,
        }
    }

    /// Run one discovery: resolve the catalog, filter it, render it
    ///
    /// Any step's failure propagates unchanged and no partial output is
    /// produced.
    pub async fn discover(
        &self,
        organization: &str,
        filter_spec: &FilterSpec,
        format: OutputFormat,
        options: &DiscoverOptions,
    ) -> Result<String> {
        let snapshot = self.load_catalog(organization, options).await?;

        let records: Vec<_> = snapshot
            .repositories
            .iter()
            .map(|name| classify::classify(name))
            .collect();
        let matched = filter::apply(records, filter_spec);

        format::render(&matched, format, snapshot.timestamp)
    }

    /// Resolve the catalog snapshot per the cache/fetch state machine
    async fn load_catalog(
        &self,
        organization: &str,
        options: &DiscoverOptions,
    ) -> Result<DiscoverySnapshot> {
        if options.cache_only {
            // Stale is acceptable here; absent is not
            return self.store.read()?.ok_or(Error::CacheMiss);
        }

        let source = self.source.as_deref().ok_or_else(|| {
            Error::AuthFailed("no credential configured for a networked discovery".to_string())
        })?;

        let login = source.validate_credentials().await?;
        debug!("credential probe passed for {}", login);

        let quota = source.rate_limit().await?;
        if quota.remaining == 0 {
            return Err(Error::RateLimited {
                reset_at: quota.reset_at,
            });
        }
        if quota.remaining < LOW_QUOTA_WATERMARK {
            warn!(
                "only {} API requests left in this window, resets at {}",
                quota.remaining, quota.reset_at
            );
        }

        if !options.force_refresh {
            // An unreadable cache is repaired by refetching, not fatal here
            let cached = match self.store.read() {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    debug!("cache unreadable, refetching: {}", e);
                    None
                }
            };
            if let Some(snapshot) =
                cached.filter(|s| self.store.is_fresh(s) && s.organization == organization)
            {
                debug!("cache still fresh, skipping fetch");
                return Ok(snapshot);
            }
        }

        let names = source.list_repository_names(organization).await?;
        let fetched = names.len();

        // The accept gate: names matching neither the standard shape nor
        // the exception list never enter the catalog.
        let accepted: Vec<String> = names
            .into_iter()
            .filter(|name| classify::is_catalog_member(name))
            .collect();
        info!(
            "discovered {} repositories for {} ({} rejected by naming convention)",
            accepted.len(),
            organization,
            fetched - accepted.len()
        );

        let snapshot = DiscoverySnapshot::new(organization, accepted);
        self.store.write(&snapshot)?;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockRepoSource;
    use chrono::Utc;
    use infrascope_api::RateLimitSnapshot;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::tempdir;

    fn store_in(dir: &Path) -> SnapshotStore {
        SnapshotStore::new(dir.join("catalog.json"), Duration::from_secs(3600))
    }

    fn quota(remaining: u32) -> RateLimitSnapshot {
        RateLimitSnapshot {
            remaining,
            reset_at: Utc::now(),
        }
    }

    fn healthy_source(names: Vec<&'static str>) -> MockRepoSource {
        let mut source = MockRepoSource::new();
        source
            .expect_validate_credentials()
            .returning(|| Ok("ops-robot".to_string()));
        source.expect_rate_limit().returning(|| Ok(quota(5000)));
        source
            .expect_list_repository_names()
            .returning(move |_| Ok(names.iter().map(|n| n.to_string()).collect()));
        source
    }

    #[tokio::test]
    async fn test_cache_only_without_cache_is_a_cache_miss() {
        let dir = tempdir().unwrap();
        let engine = DiscoveryEngine::offline(store_in(dir.path()));

        let err = engine
            .discover(
                "acme-ops",
                &FilterSpec::default(),
                OutputFormat::List,
                &DiscoverOptions {
                    cache_only: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::CacheMiss));
    }

    #[tokio::test]
    async fn test_cache_only_serves_stale_snapshots() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store
            .write(&DiscoverySnapshot {
                timestamp: 1, // ancient
                organization: "acme-ops".to_string(),
                repositories: vec!["ios-infra-dev-networking".to_string()],
            })
            .unwrap();

        let engine = DiscoveryEngine::offline(store);
        let out = engine
            .discover(
                "acme-ops",
                &FilterSpec::default(),
                OutputFormat::List,
                &DiscoverOptions {
                    cache_only: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(out, "ios-infra-dev-networking");
    }

    #[tokio::test]
    async fn test_zero_quota_fails_before_any_page_request() {
        let dir = tempdir().unwrap();
        let mut source = MockRepoSource::new();
        source
            .expect_validate_credentials()
            .returning(|| Ok("ops-robot".to_string()));
        source.expect_rate_limit().returning(|| Ok(quota(0)));
        source.expect_list_repository_names().times(0);

        let engine = DiscoveryEngine::new(Box::new(source), store_in(dir.path()));
        let err = engine
            .discover(
                "acme-ops",
                &FilterSpec::default(),
                OutputFormat::List,
                &DiscoverOptions::default(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::RateLimited { .. }));
        assert!(!dir.path().join("catalog.json").exists());
    }

    #[tokio::test]
    async fn test_low_quota_warns_but_proceeds() {
        let dir = tempdir().unwrap();
        let mut source = MockRepoSource::new();
        source
            .expect_validate_credentials()
            .returning(|| Ok("ops-robot".to_string()));
        source.expect_rate_limit().returning(|| Ok(quota(3)));
        source
            .expect_list_repository_names()
            .returning(|_| Ok(vec!["ios-infra-dev-networking".to_string()]));

        let engine = DiscoveryEngine::new(Box::new(source), store_in(dir.path()));
        let out = engine
            .discover(
                "acme-ops",
                &FilterSpec::default(),
                OutputFormat::List,
                &DiscoverOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(out, "ios-infra-dev-networking");
    }

    #[tokio::test]
    async fn test_fetch_persists_only_accepted_names() {
        let dir = tempdir().unwrap();
        let source = healthy_source(vec![
            "ios-infra-dev-networking",
            "infra-docs",
            "random-repo",
            "web-infra-prod-cdn",
        ]);

        let engine = DiscoveryEngine::new(Box::new(source), store_in(dir.path()));
        let out = engine
            .discover(
                "acme-ops",
                &FilterSpec::default(),
                OutputFormat::Json,
                &DiscoverOptions::default(),
            )
            .await
            .unwrap();

        let doc: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(doc["total"], 3);

        let cached = std::fs::read_to_string(dir.path().join("catalog.json")).unwrap();
        let snapshot: DiscoverySnapshot = serde_json::from_str(&cached).unwrap();
        assert_eq!(
            snapshot.repositories,
            vec!["ios-infra-dev-networking", "infra-docs", "web-infra-prod-cdn"]
        );
        assert!(!cached.contains("random-repo"));
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_previous_cache_untouched() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store
            .write(&DiscoverySnapshot::new(
                "acme-ops",
                vec!["ios-infra-dev-networking".to_string()],
            ))
            .unwrap();
        let before = std::fs::read(dir.path().join("catalog.json")).unwrap();

        let mut source = MockRepoSource::new();
        source
            .expect_validate_credentials()
            .returning(|| Ok("ops-robot".to_string()));
        source.expect_rate_limit().returning(|| Ok(quota(5000)));
        source
            .expect_list_repository_names()
            .returning(|_| Err(Error::Api("server exploded on page 2".to_string())));

        let engine = DiscoveryEngine::new(Box::new(source), store);
        let err = engine
            .discover(
                "acme-ops",
                &FilterSpec::default(),
                OutputFormat::List,
                &DiscoverOptions {
                    force_refresh: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Api(_)));
        let after = std::fs::read(dir.path().join("catalog.json")).unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_fresh_cache_skips_the_fetch() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store
            .write(&DiscoverySnapshot::new(
                "acme-ops",
                vec!["ios-infra-dev-networking".to_string()],
            ))
            .unwrap();

        let mut source = MockRepoSource::new();
        source
            .expect_validate_credentials()
            .returning(|| Ok("ops-robot".to_string()));
        source.expect_rate_limit().returning(|| Ok(quota(5000)));
        source.expect_list_repository_names().times(0);

        let engine = DiscoveryEngine::new(Box::new(source), store);
        let out = engine
            .discover(
                "acme-ops",
                &FilterSpec::default(),
                OutputFormat::List,
                &DiscoverOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(out, "ios-infra-dev-networking");
    }

    #[tokio::test]
    async fn test_force_refresh_overrides_fresh_cache() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store
            .write(&DiscoverySnapshot::new(
                "acme-ops",
                vec!["old-infra-dev-db".to_string()],
            ))
            .unwrap();

        let source = healthy_source(vec!["new-infra-prod-db"]);
        let engine = DiscoveryEngine::new(Box::new(source), store);
        let out = engine
            .discover(
                "acme-ops",
                &FilterSpec::default(),
                OutputFormat::List,
                &DiscoverOptions {
                    force_refresh: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(out, "new-infra-prod-db");
    }

    #[tokio::test]
    async fn test_fresh_cache_for_another_org_is_not_reused() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store
            .write(&DiscoverySnapshot::new(
                "other-org",
                vec!["other-infra-dev-db".to_string()],
            ))
            .unwrap();

        let source = healthy_source(vec!["ios-infra-dev-networking"]);
        let engine = DiscoveryEngine::new(Box::new(source), store);
        let out = engine
            .discover(
                "acme-ops",
                &FilterSpec::default(),
                OutputFormat::List,
                &DiscoverOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(out, "ios-infra-dev-networking");
    }

    #[tokio::test]
    async fn test_filters_narrow_the_rendered_catalog() {
        let dir = tempdir().unwrap();
        let source = healthy_source(vec![
            "ios-infra-dev-networking",
            "ios-infra-prod-networking",
            "web-infra-dev-cdn",
        ]);

        let engine = DiscoveryEngine::new(Box::new(source), store_in(dir.path()));
        let spec = FilterSpec {
            team: Some("ios".to_string()),
            environment: Some(crate::Environment::Prod),
            resource: None,
        };
        let out = engine
            .discover(
                "acme-ops",
                &spec,
                OutputFormat::List,
                &DiscoverOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(out, "ios-infra-prod-networking");
    }

    #[tokio::test]
    async fn test_cached_rerun_renders_the_same_catalog() {
        let dir = tempdir().unwrap();
        let source = healthy_source(vec!["ios-infra-dev-networking", "infra-scripts"]);

        let networked = DiscoveryEngine::new(Box::new(source), store_in(dir.path()));
        let first = networked
            .discover(
                "acme-ops",
                &FilterSpec::default(),
                OutputFormat::Json,
                &DiscoverOptions::default(),
            )
            .await
            .unwrap();

        // A later cache-only invocation reclassifies the stored names and
        // must land on the identical catalog.
        let offline = DiscoveryEngine::offline(store_in(dir.path()));
        let second = offline
            .discover(
                "acme-ops",
                &FilterSpec::default(),
                OutputFormat::Json,
                &DiscoverOptions {
                    cache_only: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(first, second);
    }
}
