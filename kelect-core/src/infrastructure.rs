use std::sync::Arc;

use crate::error::{LeaseError, Result};
use crate::types::{LeaseRecord, ResourceKind};

/// Defines the contract for version-stamped record stores.
///
/// The store is the only source of linearizability: `create` is first-writer-wins
/// and `update` is a compare-and-swap on the version token.
pub trait ResourceStore: Send + Sync {
    /// Read a record, `None` if it does not exist
    fn get(&self, kind: ResourceKind, namespace: &str, name: &str) -> Result<Option<LeaseRecord>>;

    /// Create a record, failing with `AlreadyExists` if the name is taken
    fn create(&self, namespace: &str, record: LeaseRecord) -> Result<LeaseRecord>;

    /// Replace a record if its current version still equals `version_token`
    fn update(&self, namespace: &str, record: LeaseRecord, version_token: &str) -> Result<LeaseRecord>;
}

/// Lets several clients in one process share a store.
impl<S: ResourceStore + ?Sized> ResourceStore for Arc<S> {
    fn get(&self, kind: ResourceKind, namespace: &str, name: &str) -> Result<Option<LeaseRecord>> {
        (**self).get(kind, namespace, name)
    }

    fn create(&self, namespace: &str, record: LeaseRecord) -> Result<LeaseRecord> {
        (**self).create(namespace, record)
    }

    fn update(&self, namespace: &str, record: LeaseRecord, version_token: &str) -> Result<LeaseRecord> {
        (**self).update(namespace, record, version_token)
    }
}

/// Submits `record` as a CAS update against the token it was read with.
///
/// The record is consumed: whatever the outcome, the old token cannot be replayed.
pub fn compare_and_swap<S: ResourceStore + ?Sized>(store: &S, record: LeaseRecord) -> Result<LeaseRecord> {
    let token = record
        .version_token()
        .map(str::to_owned)
        .ok_or_else(|| LeaseError::MissingVersionToken {
            name: record.name().to_string(),
        })?;
    let namespace = record.metadata().namespace.clone();

    tracing::debug!(
        kind = %record.kind(),
        namespace = %namespace,
        name = %record.name(),
        version = %token,
        "Submitting optimistic update"
    );

    store.update(&namespace, record, &token)
}
