use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache IO failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache document malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CacheError>;

/// The on-disk catalog snapshot
///
/// Only raw repository names are stored, pre-classification. Classification
/// is recomputed on every read so the naming rules can evolve without
/// invalidating old caches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiscoverySnapshot {
    /// Creation instant, seconds since epoch
    pub timestamp: u64,
    /// The organization this catalog was fetched for
    pub organization: String,
    /// Repository names in API return order
    pub repositories: Vec<String>,
}

impl DiscoverySnapshot {
    pub fn new(organization: impl Into<String>, repositories: Vec<String>) -> Self {
        Self {
            timestamp: epoch_now(),
            organization: organization.into(),
            repositories,
        }
    }

    /// Seconds elapsed since this snapshot was written
    pub fn age(&self) -> u64 {
        epoch_now().saturating_sub(self.timestamp)
    }
}

/// Owner of the catalog snapshot file
///
/// Writes are atomic from the reader's perspective: the full document is
/// staged to a sibling temp file and renamed into place, so a concurrent
/// reader sees either the old snapshot or the new one, never a torn write.
/// Concurrent invocations race with last-writer-wins semantics, which is
/// fine - the cache is a convenience, not a source of truth.
pub struct SnapshotStore {
    path: PathBuf,
    ttl: Duration,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot, stale or not. `None` when no cache exists yet.
    pub fn read(&self) -> Result<Option<DiscoverySnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&self.path)?;
        let snapshot: DiscoverySnapshot = serde_json::from_str(&contents)?;
        Ok(Some(snapshot))
    }

    /// Persist a complete snapshot, replacing any previous one wholesale
    pub fn write(&self, snapshot: &DiscoverySnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(snapshot)?;
        let staging = self.staging_path();
        std::fs::write(&staging, contents)?;
        std::fs::rename(&staging, &self.path)?;

        debug!(
            "cached {} repositories for {} at {}",
            snapshot.repositories.len(),
            snapshot.organization,
            self.path.display()
        );
        Ok(())
    }

    /// Whether a cache file exists and is younger than the TTL
    pub fn is_valid(&self) -> bool {
        match self.read() {
            Ok(Some(snapshot)) => self.is_fresh(&snapshot),
            _ => false,
        }
    }

    /// Whether an already-loaded snapshot is younger than the TTL
    pub fn is_fresh(&self, snapshot: &DiscoverySnapshot) -> bool {
        Duration::from_secs(snapshot.age()) < self.ttl
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "catalog.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn epoch_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
