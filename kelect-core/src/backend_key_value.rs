//! Leases stored as two string entries per group inside a shared key/value record.
//!
//! This layout has no duration or heartbeat. A leader proves liveness by
//! rewriting its acquire timestamp; renewal is a no-op.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::backend::{decode_timestamp, KIND_LABEL, LOCKS_KIND, PROVIDER, PROVIDER_LABEL};
use crate::error::Result;
use crate::infrastructure::{compare_and_swap, ResourceStore};
use crate::timestamp::{format_local_timestamp, parse_local_timestamp};
use crate::types::{ConfigMap, LeaderInfo, ObjectMeta, ResourceKind};

pub const LEADER_PREFIX: &str = "leader.pod.";
pub const LOCAL_TIMESTAMP_PREFIX: &str = "leader.local.timestamp.";

pub fn leader_key(group: &str) -> String {
    format!("{}{}", LEADER_PREFIX, group)
}

pub fn timestamp_key(group: &str) -> String {
    format!("{}{}", LOCAL_TIMESTAMP_PREFIX, group)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyValueLeaseBackend;

impl KeyValueLeaseBackend {
    pub fn decode_leader_info(
        &self,
        config_map: Option<&ConfigMap>,
        members: &BTreeSet<String>,
        group: &str,
    ) -> LeaderInfo {
        let Some(config_map) = config_map else {
            return LeaderInfo::empty(group, members.clone());
        };

        let leader = config_map
            .data
            .get(&leader_key(group))
            .filter(|leader| !leader.is_empty())
            .cloned();
        let key = timestamp_key(group);
        let acquire_timestamp = decode_timestamp(
            group,
            &key,
            config_map.data.get(&key).map(String::as_str),
            parse_local_timestamp,
        );

        LeaderInfo::new(group, leader, acquire_timestamp, members.clone())
    }

    pub fn fetch_lease_resource<S: ResourceStore + ?Sized>(
        &self,
        store: &S,
        namespace: &str,
        name: &str,
        group: &str,
    ) -> Result<Option<ConfigMap>> {
        debug!(namespace, name, group, "Fetching leader config map");
        store
            .get(ResourceKind::ConfigMap, namespace, name)?
            .map(ConfigMap::try_from)
            .transpose()
    }

    pub fn create_new_lease_resource<S: ResourceStore + ?Sized>(
        &self,
        store: &S,
        namespace: &str,
        name: &str,
        leader_info: &LeaderInfo,
        now: DateTime<Utc>,
    ) -> Result<ConfigMap> {
        let metadata = ObjectMeta::new(namespace, name)
            .with_label(PROVIDER_LABEL, PROVIDER)
            .with_label(KIND_LABEL, LOCKS_KIND);
        let config_map = write_leader(
            ConfigMap {
                metadata,
                data: BTreeMap::new(),
            },
            leader_info,
            now,
        );

        let created = ConfigMap::try_from(store.create(namespace, config_map.into())?)?;
        info!(
            namespace,
            name,
            group = %leader_info.group,
            leader = ?leader_info.leader,
            "Created leader config map"
        );
        Ok(created)
    }

    /// Rewrites the two entries of `new_leader_info.group`; other groups' entries
    /// are carried over untouched.
    pub fn optimistic_acquire_leadership<S: ResourceStore + ?Sized>(
        &self,
        store: &S,
        config_map: ConfigMap,
        new_leader_info: &LeaderInfo,
        now: DateTime<Utc>,
    ) -> Result<ConfigMap> {
        let updated = write_leader(config_map, new_leader_info, now);
        let updated = ConfigMap::try_from(compare_and_swap(store, updated.into())?)?;

        info!(
            name = %updated.metadata.name,
            group = %new_leader_info.group,
            leader = ?new_leader_info.leader,
            "Leadership written to config map"
        );
        Ok(updated)
    }

    pub fn optimistic_delete_leader_info<S: ResourceStore + ?Sized>(
        &self,
        store: &S,
        mut config_map: ConfigMap,
        group: &str,
    ) -> Result<ConfigMap> {
        config_map.data.remove(&leader_key(group));
        config_map.data.remove(&timestamp_key(group));

        let updated = ConfigMap::try_from(compare_and_swap(store, config_map.into())?)?;
        info!(name = %updated.metadata.name, group, "Leader entries removed from config map");
        Ok(updated)
    }

    /// No heartbeat to extend: hands the record back without touching the store.
    pub fn refresh_lease_renew_time(&self, config_map: ConfigMap) -> ConfigMap {
        debug!(name = %config_map.metadata.name, "Config map leases carry no renew time");
        config_map
    }
}

fn write_leader(mut config_map: ConfigMap, leader_info: &LeaderInfo, now: DateTime<Utc>) -> ConfigMap {
    let group = leader_info.group.as_str();

    match leader_info.leader.as_deref().filter(|leader| !leader.is_empty()) {
        Some(leader) => {
            let acquired = leader_info.acquire_timestamp.unwrap_or(now);
            config_map.data.insert(leader_key(group), leader.to_string());
            config_map
                .data
                .insert(timestamp_key(group), format_local_timestamp(acquired));
        }
        None => {
            config_map.data.remove(&leader_key(group));
            config_map.data.remove(&timestamp_key(group));
        }
    }

    config_map
}
