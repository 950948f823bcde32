use crate::error::{LeaseError, Result};
use crate::infrastructure::ResourceStore;
use crate::types::{LeaseRecord, ResourceKind};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

type RecordKey = (ResourceKind, String, String);

#[derive(Default)]
struct Records {
    // Map of (kind, namespace, name) -> stored record
    entries: HashMap<RecordKey, LeaseRecord>,
    // Last version handed out, shared by all records
    last_version: u64,
}

impl Records {
    fn next_version(&mut self) -> String {
        self.last_version += 1;
        self.last_version.to_string()
    }
}

/// A process-local store with the same CAS semantics as a remote one.
#[derive(Default)]
pub struct InMemoryResourceStore {
    records: Mutex<Records>,
}

impl InMemoryResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held across all kinds and namespaces.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Records> {
        // A panic while holding the lock cannot leave a half-written entry behind.
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn key(kind: ResourceKind, namespace: &str, name: &str) -> RecordKey {
        (kind, namespace.to_string(), name.to_string())
    }
}

impl ResourceStore for InMemoryResourceStore {
    fn get(&self, kind: ResourceKind, namespace: &str, name: &str) -> Result<Option<LeaseRecord>> {
        Ok(self.lock().entries.get(&Self::key(kind, namespace, name)).cloned())
    }

    fn create(&self, namespace: &str, mut record: LeaseRecord) -> Result<LeaseRecord> {
        let mut records = self.lock();
        let key = Self::key(record.kind(), namespace, record.name());

        if records.entries.contains_key(&key) {
            return Err(LeaseError::AlreadyExists {
                kind: record.kind(),
                namespace: namespace.to_string(),
                name: record.name().to_string(),
            });
        }

        let version = records.next_version();
        let metadata = record.metadata_mut();
        metadata.namespace = namespace.to_string();
        metadata.resource_version = Some(version);

        records.entries.insert(key, record.clone());
        Ok(record)
    }

    fn update(&self, namespace: &str, mut record: LeaseRecord, version_token: &str) -> Result<LeaseRecord> {
        let mut records = self.lock();
        let key = Self::key(record.kind(), namespace, record.name());

        let current = match records.entries.get(&key) {
            Some(current) => current.version_token().map(str::to_owned),
            None => {
                return Err(LeaseError::NotFound {
                    kind: record.kind(),
                    namespace: namespace.to_string(),
                    name: record.name().to_string(),
                });
            }
        };

        if current.as_deref() != Some(version_token) {
            return Err(LeaseError::VersionConflict {
                kind: record.kind(),
                namespace: namespace.to_string(),
                name: record.name().to_string(),
                expected: version_token.to_string(),
            });
        }

        let version = records.next_version();
        let metadata = record.metadata_mut();
        metadata.namespace = namespace.to_string();
        metadata.resource_version = Some(version);

        records.entries.insert(key, record.clone());
        Ok(record)
    }
}
