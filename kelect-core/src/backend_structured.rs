//! Leases stored as a dedicated coordination record per group, with holder,
//! acquire/renew times, duration and a transition counter.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::backend::{decode_timestamp, PROVIDER, PROVIDER_LABEL};
use crate::error::Result;
use crate::infrastructure::{compare_and_swap, ResourceStore};
use crate::timestamp::{format_micro_time, parse_micro_time};
use crate::types::{LeaderInfo, Lease, LeaseSpec, ObjectMeta, ResourceKind};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StructuredLeaseBackend;

impl StructuredLeaseBackend {
    pub fn decode_leader_info(
        &self,
        lease: Option<&Lease>,
        members: &BTreeSet<String>,
        group: &str,
    ) -> LeaderInfo {
        let Some(lease) = lease else {
            return LeaderInfo::empty(group, members.clone());
        };
        let spec = &lease.spec;

        let leader = spec
            .holder_identity
            .clone()
            .filter(|holder| !holder.is_empty());
        let acquire_timestamp =
            decode_timestamp(group, "acquireTime", spec.acquire_time.as_deref(), parse_micro_time);
        let renew_timestamp =
            decode_timestamp(group, "renewTime", spec.renew_time.as_deref(), parse_micro_time);

        let lease_duration_seconds = match spec.lease_duration_seconds {
            Some(seconds) if seconds > 0 => Some(seconds),
            Some(seconds) => {
                warn!(group, seconds, "Treating non-positive lease duration as absent");
                None
            }
            None => None,
        };

        LeaderInfo::new(group, leader, acquire_timestamp, members.clone())
            .with_renew_timestamp(renew_timestamp)
            .with_lease_duration(lease_duration_seconds)
    }

    pub fn fetch_lease_resource<S: ResourceStore + ?Sized>(
        &self,
        store: &S,
        namespace: &str,
        name: &str,
        group: &str,
    ) -> Result<Option<Lease>> {
        debug!(namespace, name, group, "Fetching leader lease");
        store
            .get(ResourceKind::Lease, namespace, name)?
            .map(Lease::try_from)
            .transpose()
    }

    pub fn create_new_lease_resource<S: ResourceStore + ?Sized>(
        &self,
        store: &S,
        namespace: &str,
        name: &str,
        leader_info: &LeaderInfo,
        now: DateTime<Utc>,
    ) -> Result<Lease> {
        let mut spec = LeaseSpec {
            lease_transitions: Some(0),
            ..LeaseSpec::default()
        };
        if let Some(holder) = leader_info.leader.as_deref().filter(|holder| !holder.is_empty()) {
            let stamp = format_micro_time(now);
            spec.holder_identity = Some(holder.to_string());
            spec.acquire_time = Some(stamp.clone());
            spec.renew_time = Some(stamp);
            spec.lease_duration_seconds = leader_info.lease_duration_seconds;
        }

        let lease = Lease {
            metadata: ObjectMeta::new(namespace, name).with_label(PROVIDER_LABEL, PROVIDER),
            spec,
        };

        let created = Lease::try_from(store.create(namespace, lease.into())?)?;
        info!(
            namespace,
            name,
            group = %leader_info.group,
            holder = ?created.spec.holder_identity,
            "Created leader lease"
        );
        Ok(created)
    }

    /// Hands the lease to `new_leader_info.leader` and counts one more transition.
    pub fn optimistic_acquire_leadership<S: ResourceStore + ?Sized>(
        &self,
        store: &S,
        mut lease: Lease,
        new_leader_info: &LeaderInfo,
        now: DateTime<Utc>,
    ) -> Result<Lease> {
        let stamp = format_micro_time(now);
        let transitions = lease.spec.lease_transitions.unwrap_or(0).saturating_add(1);

        lease.spec = LeaseSpec {
            holder_identity: new_leader_info.leader.clone(),
            acquire_time: Some(stamp.clone()),
            renew_time: Some(stamp),
            lease_duration_seconds: new_leader_info.lease_duration_seconds,
            lease_transitions: Some(transitions),
        };

        let updated = Lease::try_from(compare_and_swap(store, lease.into())?)?;
        info!(
            name = %updated.metadata.name,
            group = %new_leader_info.group,
            holder = ?updated.spec.holder_identity,
            transitions,
            "Leadership written to lease"
        );
        Ok(updated)
    }

    /// Clears the holder fields. The transition counter is kept.
    pub fn optimistic_delete_leader_info<S: ResourceStore + ?Sized>(
        &self,
        store: &S,
        mut lease: Lease,
        group: &str,
    ) -> Result<Lease> {
        lease.spec = LeaseSpec {
            lease_transitions: lease.spec.lease_transitions,
            ..LeaseSpec::default()
        };

        let updated = Lease::try_from(compare_and_swap(store, lease.into())?)?;
        info!(name = %updated.metadata.name, group, "Leader released lease");
        Ok(updated)
    }

    /// Writes `renewTime = now` unless the previous renewal is younger than
    /// `min_update_interval_seconds`, in which case no write is issued.
    pub fn refresh_lease_renew_time<S: ResourceStore + ?Sized>(
        &self,
        store: &S,
        mut lease: Lease,
        min_update_interval_seconds: u64,
        now: DateTime<Utc>,
    ) -> Result<Lease> {
        let name = lease.metadata.name.clone();
        let last_renewal =
            decode_timestamp(&name, "renewTime", lease.spec.renew_time.as_deref(), parse_micro_time);

        if let Some(last_renewal) = last_renewal {
            let due = i64::try_from(min_update_interval_seconds)
                .ok()
                .and_then(Duration::try_seconds)
                .and_then(|interval| last_renewal.checked_add_signed(interval))
                .is_some_and(|next_renewal| next_renewal < now);

            if !due {
                debug!(name = %name, %last_renewal, "Renewal throttled");
                return Ok(lease);
            }
        }

        lease.spec.renew_time = Some(format_micro_time(now));
        let updated = Lease::try_from(compare_and_swap(store, lease.into())?)?;
        debug!(name = %updated.metadata.name, "Lease renewed");
        Ok(updated)
    }
}
