use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of who leads an election group, decoded from a lease record.
///
/// `members` is never read from the record; the caller supplies it at decode time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderInfo {
    /// Election group the other fields are scoped to
    pub group: String,
    /// Identity of the recognized leader, if any
    pub leader: Option<String>,
    /// When the current leader record was written
    pub acquire_timestamp: Option<DateTime<Utc>>,
    /// Last heartbeat (structured leases only)
    pub renew_timestamp: Option<DateTime<Utc>>,
    /// Candidate pool
    pub members: BTreeSet<String>,
    /// Lease validity after the last heartbeat (structured leases only)
    pub lease_duration_seconds: Option<i32>,
}

impl LeaderInfo {
    pub fn new(
        group: impl Into<String>,
        leader: Option<String>,
        acquire_timestamp: Option<DateTime<Utc>>,
        members: BTreeSet<String>,
    ) -> Self {
        Self {
            group: group.into(),
            leader,
            acquire_timestamp,
            renew_timestamp: None,
            members,
            lease_duration_seconds: None,
        }
    }

    /// A snapshot with no leader, used whenever a record is missing or unreadable.
    pub fn empty(group: impl Into<String>, members: BTreeSet<String>) -> Self {
        Self::new(group, None, None, members)
    }

    pub fn with_renew_timestamp(mut self, renew_timestamp: Option<DateTime<Utc>>) -> Self {
        self.renew_timestamp = renew_timestamp;
        self
    }

    pub fn with_lease_duration(mut self, lease_duration_seconds: Option<i32>) -> Self {
        self.lease_duration_seconds = lease_duration_seconds;
        self
    }

    pub fn has_empty_leader(&self) -> bool {
        self.leader.as_deref().is_none_or(str::is_empty)
    }

    /// True when the leader is set and belongs to the current candidate pool.
    pub fn has_valid_leader(&self) -> bool {
        match self.leader.as_deref() {
            Some(leader) if !leader.is_empty() => self.members.contains(leader),
            _ => false,
        }
    }

    pub fn is_leader(&self, identity: &str) -> bool {
        self.leader.as_deref() == Some(identity)
    }

    /// The most recent proof of life: renew time if known, else acquire time.
    pub fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.renew_timestamp.or(self.acquire_timestamp)
    }

    /// True when nothing was heard from the leader for at least `seconds`.
    /// An unknown timestamp counts as elapsed.
    pub fn is_time_elapsed_seconds(&self, now: DateTime<Utc>, seconds: i64) -> bool {
        match self.last_seen() {
            Some(seen) => Duration::try_seconds(seconds)
                .and_then(|window| seen.checked_add_signed(window))
                .is_some_and(|deadline| deadline <= now),
            None => true,
        }
    }

    /// Lease expiry for records that carry a duration. Without one, never expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.lease_duration_seconds {
            Some(duration) => self.is_time_elapsed_seconds(now, i64::from(duration)),
            None => false,
        }
    }
}
