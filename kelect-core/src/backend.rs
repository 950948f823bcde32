//! The operation set an election controller drives, over two record encodings.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::backend_key_value::KeyValueLeaseBackend;
use crate::backend_structured::StructuredLeaseBackend;
use crate::error::{LeaseError, MalformedTimestamp, Result};
use crate::infrastructure::ResourceStore;
use crate::types::{LeaderInfo, LeaseRecord, ResourceKind};

/// Label key identifying records written by this crate
pub const PROVIDER_LABEL: &str = "provider";
/// Value of [`PROVIDER_LABEL`]
pub const PROVIDER: &str = "kelect";
/// Label key used by key-value records for store-side filtering
pub const KIND_LABEL: &str = "kind";
/// Value of [`KIND_LABEL`]
pub const LOCKS_KIND: &str = "locks";

/// Which record encoding a lock uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LeaseResourceType {
    /// Leader entries inside a shared key/value record
    ConfigMap,
    /// One dedicated lease record per group
    #[default]
    Lease,
}

impl LeaseResourceType {
    pub fn resource_kind(self) -> ResourceKind {
        match self {
            LeaseResourceType::ConfigMap => ResourceKind::ConfigMap,
            LeaseResourceType::Lease => ResourceKind::Lease,
        }
    }
}

impl fmt::Display for LeaseResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resource_kind().as_str())
    }
}

impl FromStr for LeaseResourceType {
    type Err = LeaseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "configmap" => Ok(LeaseResourceType::ConfigMap),
            "lease" => Ok(LeaseResourceType::Lease),
            _ => Err(LeaseError::InvalidConfig(format!(
                "unknown lease resource type '{}'. Must be one of: ConfigMap, Lease",
                s
            ))),
        }
    }
}

/// A lease backend, selected once at construction time.
///
/// Callers only ever see [`LeaseRecord`] and [`LeaderInfo`]; how the lease is laid
/// out inside the record stays with the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaseBackend {
    KeyValue(KeyValueLeaseBackend),
    Structured(StructuredLeaseBackend),
}

impl LeaseBackend {
    pub fn for_resource_type(resource_type: LeaseResourceType) -> Self {
        match resource_type {
            LeaseResourceType::ConfigMap => LeaseBackend::KeyValue(KeyValueLeaseBackend),
            LeaseResourceType::Lease => LeaseBackend::Structured(StructuredLeaseBackend),
        }
    }

    pub fn resource_type(&self) -> LeaseResourceType {
        match self {
            LeaseBackend::KeyValue(_) => LeaseResourceType::ConfigMap,
            LeaseBackend::Structured(_) => LeaseResourceType::Lease,
        }
    }

    /// Decodes `record` into a snapshot for `group`. Never fails: missing,
    /// malformed or foreign records yield an empty leader.
    pub fn decode_leader_info(
        &self,
        record: Option<&LeaseRecord>,
        members: &BTreeSet<String>,
        group: &str,
    ) -> LeaderInfo {
        match (self, record) {
            (_, None) => LeaderInfo::empty(group, members.clone()),
            (LeaseBackend::KeyValue(backend), Some(LeaseRecord::ConfigMap(config_map))) => {
                backend.decode_leader_info(Some(config_map), members, group)
            }
            (LeaseBackend::Structured(backend), Some(LeaseRecord::Lease(lease))) => {
                backend.decode_leader_info(Some(lease), members, group)
            }
            (_, Some(other)) => {
                tracing::warn!(
                    group,
                    expected = %self.resource_type(),
                    found = %other.kind(),
                    name = %other.name(),
                    "Ignoring lease record of unexpected kind"
                );
                LeaderInfo::empty(group, members.clone())
            }
        }
    }

    pub fn fetch_lease_resource<S: ResourceStore + ?Sized>(
        &self,
        store: &S,
        namespace: &str,
        name: &str,
        group: &str,
    ) -> Result<Option<LeaseRecord>> {
        match self {
            LeaseBackend::KeyValue(backend) => Ok(backend
                .fetch_lease_resource(store, namespace, name, group)?
                .map(LeaseRecord::from)),
            LeaseBackend::Structured(backend) => Ok(backend
                .fetch_lease_resource(store, namespace, name, group)?
                .map(LeaseRecord::from)),
        }
    }

    pub fn create_new_lease_resource<S: ResourceStore + ?Sized>(
        &self,
        store: &S,
        namespace: &str,
        name: &str,
        leader_info: &LeaderInfo,
        now: DateTime<Utc>,
    ) -> Result<LeaseRecord> {
        match self {
            LeaseBackend::KeyValue(backend) => backend
                .create_new_lease_resource(store, namespace, name, leader_info, now)
                .map(LeaseRecord::from),
            LeaseBackend::Structured(backend) => backend
                .create_new_lease_resource(store, namespace, name, leader_info, now)
                .map(LeaseRecord::from),
        }
    }

    pub fn optimistic_acquire_leadership<S: ResourceStore + ?Sized>(
        &self,
        store: &S,
        record: LeaseRecord,
        new_leader_info: &LeaderInfo,
        now: DateTime<Utc>,
    ) -> Result<LeaseRecord> {
        match self {
            LeaseBackend::KeyValue(backend) => backend
                .optimistic_acquire_leadership(store, record.try_into()?, new_leader_info, now)
                .map(LeaseRecord::from),
            LeaseBackend::Structured(backend) => backend
                .optimistic_acquire_leadership(store, record.try_into()?, new_leader_info, now)
                .map(LeaseRecord::from),
        }
    }

    pub fn optimistic_delete_leader_info<S: ResourceStore + ?Sized>(
        &self,
        store: &S,
        record: LeaseRecord,
        group: &str,
    ) -> Result<LeaseRecord> {
        match self {
            LeaseBackend::KeyValue(backend) => backend
                .optimistic_delete_leader_info(store, record.try_into()?, group)
                .map(LeaseRecord::from),
            LeaseBackend::Structured(backend) => backend
                .optimistic_delete_leader_info(store, record.try_into()?, group)
                .map(LeaseRecord::from),
        }
    }

    /// Extends the heartbeat if the encoding has one and the last renewal is
    /// older than `min_update_interval_seconds`. Otherwise returns `record` as is.
    pub fn refresh_lease_renew_time<S: ResourceStore + ?Sized>(
        &self,
        store: &S,
        record: LeaseRecord,
        min_update_interval_seconds: u64,
        now: DateTime<Utc>,
    ) -> Result<LeaseRecord> {
        match self {
            LeaseBackend::KeyValue(backend) => {
                Ok(backend.refresh_lease_renew_time(record.try_into()?).into())
            }
            LeaseBackend::Structured(backend) => backend
                .refresh_lease_renew_time(store, record.try_into()?, min_update_interval_seconds, now)
                .map(LeaseRecord::from),
        }
    }
}

/// Parses an optional timestamp field, logging and dropping it when malformed.
pub(crate) fn decode_timestamp(
    scope: &str,
    field: &str,
    raw: Option<&str>,
    parse: fn(&str) -> std::result::Result<DateTime<Utc>, MalformedTimestamp>,
) -> Option<DateTime<Utc>> {
    match parse(raw?) {
        Ok(instant) => Some(instant),
        Err(e) => {
            tracing::warn!(scope, field, error = %e, "Treating unreadable timestamp as absent");
            None
        }
    }
}
