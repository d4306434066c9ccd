// File-based catalog snapshot cache
// Keeps API calls down and makes offline (cache-only) mode possible

pub mod snapshot;

pub use snapshot::{CacheError, DiscoverySnapshot, SnapshotStore};
