//! High-level ergonomic client that pairs a resource store with the configured
//! lease backend. The `kelect` CLI delegates to this.
//!
//! Every call is a single store round trip: no retries, no background renewal.

use crate::backend::LeaseBackend;
use crate::config::LockConfiguration;
use crate::error::Result;
use crate::infrastructure::ResourceStore;
use crate::infrastructure_in_memory::InMemoryResourceStore;
use crate::types::{LeaderInfo, LeaseRecord};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Lease operations for one process identity, bound to a store and a backend.
pub struct LeaseClient {
    store: Box<dyn ResourceStore>,
    backend: LeaseBackend,
    config: LockConfiguration,
}

impl LeaseClient {
    /// Create a client over an empty in-memory store.
    pub fn new(config: LockConfiguration) -> Result<Self> {
        Self::with_store(Box::new(InMemoryResourceStore::new()), config)
    }

    /// Create a client over any store. The configuration is validated first.
    pub fn with_store(store: Box<dyn ResourceStore>, config: LockConfiguration) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            backend: LeaseBackend::for_resource_type(config.lease_resource_type),
            config,
        })
    }

    /// Create a client backed by SQLite at the given path.
    /// Records are shared with every process opening the same file.
    #[cfg(feature = "sqlite")]
    pub fn with_sqlite(path: &str, config: LockConfiguration) -> Result<Self> {
        let store = crate::infrastructure_sqlite::SqliteResourceStore::open(path)?;
        Self::with_store(Box::new(store), config)
    }

    pub fn config(&self) -> &LockConfiguration {
        &self.config
    }

    pub fn backend(&self) -> LeaseBackend {
        self.backend
    }

    pub fn store(&self) -> &dyn ResourceStore {
        self.store.as_ref()
    }

    pub fn resource_name(&self, group: &str) -> String {
        self.config.resource_name_for(group)
    }

    /// Read the record holding `group`'s lease.
    pub fn fetch(&self, group: &str) -> Result<Option<LeaseRecord>> {
        self.backend.fetch_lease_resource(
            self.store(),
            &self.config.namespace,
            &self.resource_name(group),
            group,
        )
    }

    pub fn decode(&self, record: Option<&LeaseRecord>, group: &str, members: &BTreeSet<String>) -> LeaderInfo {
        self.backend.decode_leader_info(record, members, group)
    }

    /// Fetch and decode in one step.
    pub fn leader_info(&self, group: &str, members: &BTreeSet<String>) -> Result<LeaderInfo> {
        let record = self.fetch(group)?;
        Ok(self.decode(record.as_ref(), group, members))
    }

    /// The snapshot this process writes when it claims `group`.
    pub fn candidate(&self, group: &str, members: &BTreeSet<String>, at: DateTime<Utc>) -> LeaderInfo {
        let lease_duration = match self.backend {
            LeaseBackend::Structured(_) => Some(self.config.lease_duration_seconds()),
            LeaseBackend::KeyValue(_) => None,
        };
        LeaderInfo::new(group, Some(self.config.identity.clone()), Some(at), members.clone())
            .with_lease_duration(lease_duration)
    }

    /// First-writer-wins creation of `group`'s record with this process as leader.
    pub fn create(&self, group: &str, members: &BTreeSet<String>) -> Result<LeaseRecord> {
        let now = now();
        self.backend.create_new_lease_resource(
            self.store(),
            &self.config.namespace,
            &self.resource_name(group),
            &self.candidate(group, members, now),
            now,
        )
    }

    /// Claim `group` on top of a previously fetched record.
    pub fn acquire(&self, group: &str, record: LeaseRecord, members: &BTreeSet<String>) -> Result<LeaseRecord> {
        let now = now();
        self.backend
            .optimistic_acquire_leadership(self.store(), record, &self.candidate(group, members, now), now)
    }

    /// Clear `group`'s leader fields on a previously fetched record.
    pub fn release(&self, group: &str, record: LeaseRecord) -> Result<LeaseRecord> {
        self.backend.optimistic_delete_leader_info(self.store(), record, group)
    }

    /// Throttled heartbeat using the configured minimum update interval.
    pub fn renew(&self, record: LeaseRecord) -> Result<LeaseRecord> {
        self.backend.refresh_lease_renew_time(
            self.store(),
            record,
            self.config.min_update_interval_seconds(),
            now(),
        )
    }
}
