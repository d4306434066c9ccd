// Record-set narrowing - pure, order-preserving, infallible
use crate::models::{FilterSpec, RepoRecord};

/// Keep only the records the spec matches, in their original order
pub fn apply(records: Vec<RepoRecord>, spec: &FilterSpec) -> Vec<RepoRecord> {
    if spec.is_empty() {
        return records;
    }
    records.into_iter().filter(|r| spec.matches(r)).collect()
}
