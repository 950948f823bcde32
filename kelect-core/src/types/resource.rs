use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LeaseError;

/// The record kinds a lease can be stored as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Generic labeled key/value record
    ConfigMap,
    /// Dedicated coordination lease record
    Lease,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::ConfigMap => "ConfigMap",
            ResourceKind::Lease => "Lease",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Addressing and concurrency metadata shared by every record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Opaque CAS token assigned by the store on every write
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
}

impl ObjectMeta {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }
}

/// Key/value record. One record may hold the leader entries of many groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigMap {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

/// Payload of a structured lease. Timestamps are kept as raw MicroTime text so a
/// corrupted value survives a read and can be degraded at decode time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holder_identity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acquire_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renew_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lease_duration_seconds: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lease_transitions: Option<i32>,
}

/// Structured lease record, one per election group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: LeaseSpec,
}

/// A record as held by a resource store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum LeaseRecord {
    ConfigMap(ConfigMap),
    Lease(Lease),
}

impl LeaseRecord {
    pub fn kind(&self) -> ResourceKind {
        match self {
            LeaseRecord::ConfigMap(_) => ResourceKind::ConfigMap,
            LeaseRecord::Lease(_) => ResourceKind::Lease,
        }
    }

    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            LeaseRecord::ConfigMap(config_map) => &config_map.metadata,
            LeaseRecord::Lease(lease) => &lease.metadata,
        }
    }

    pub fn metadata_mut(&mut self) -> &mut ObjectMeta {
        match self {
            LeaseRecord::ConfigMap(config_map) => &mut config_map.metadata,
            LeaseRecord::Lease(lease) => &mut lease.metadata,
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata().name
    }

    pub fn version_token(&self) -> Option<&str> {
        self.metadata().resource_version.as_deref()
    }
}

impl From<ConfigMap> for LeaseRecord {
    fn from(config_map: ConfigMap) -> Self {
        LeaseRecord::ConfigMap(config_map)
    }
}

impl From<Lease> for LeaseRecord {
    fn from(lease: Lease) -> Self {
        LeaseRecord::Lease(lease)
    }
}

impl TryFrom<LeaseRecord> for ConfigMap {
    type Error = LeaseError;

    fn try_from(record: LeaseRecord) -> Result<Self, Self::Error> {
        match record {
            LeaseRecord::ConfigMap(config_map) => Ok(config_map),
            other => Err(LeaseError::RecordKindMismatch {
                expected: ResourceKind::ConfigMap,
                found: other.kind(),
            }),
        }
    }
}

impl TryFrom<LeaseRecord> for Lease {
    type Error = LeaseError;

    fn try_from(record: LeaseRecord) -> Result<Self, Self::Error> {
        match record {
            LeaseRecord::Lease(lease) => Ok(lease),
            other => Err(LeaseError::RecordKindMismatch {
                expected: ResourceKind::Lease,
                found: other.kind(),
            }),
        }
    }
}
