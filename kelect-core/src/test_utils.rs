use crate::error::Result;
use crate::infrastructure::ResourceStore;
use crate::infrastructure_in_memory::InMemoryResourceStore;
use crate::types::{LeaseRecord, ResourceKind};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory store that counts the writes it receives.
#[derive(Default)]
pub struct CountingStore {
    inner: InMemoryResourceStore,
    writes: AtomicUsize,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl ResourceStore for CountingStore {
    fn get(&self, kind: ResourceKind, namespace: &str, name: &str) -> Result<Option<LeaseRecord>> {
        self.inner.get(kind, namespace, name)
    }

    fn create(&self, namespace: &str, record: LeaseRecord) -> Result<LeaseRecord> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.create(namespace, record)
    }

    fn update(&self, namespace: &str, record: LeaseRecord, version_token: &str) -> Result<LeaseRecord> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.update(namespace, record, version_token)
    }
}

pub fn at(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .expect("valid test timestamp")
        .with_timezone(&Utc)
}

pub fn members(identities: &[&str]) -> BTreeSet<String> {
    identities.iter().map(|id| id.to_string()).collect()
}
