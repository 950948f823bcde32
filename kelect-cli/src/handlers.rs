use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use kelect_core::client::LeaseClient;
use kelect_core::config::LockConfiguration;
use kelect_core::types::{LeaderInfo, LeaseRecord};
use kelect_core::LeaseError;

// ─── Storage ────────────────────────────────────────────────────────────────

/// Builds a client over the storage named by `--storage`.
pub fn create_client(storage: &str, config: LockConfiguration) -> Result<LeaseClient, String> {
    if storage == "memory" {
        tracing::info!("Storage backend: in-memory (records will not persist)");
        LeaseClient::new(config).map_err(describe)
    } else if let Some(path) = storage.strip_prefix("sqlite:") {
        #[cfg(feature = "sqlite")]
        {
            tracing::info!(path, "Storage backend: SQLite");
            LeaseClient::with_sqlite(path, config).map_err(describe)
        }
        #[cfg(not(feature = "sqlite"))]
        {
            let _ = (path, config);
            Err("SQLite storage requested but the `sqlite` feature is not enabled. \
                 Rebuild with: cargo build --features sqlite"
                .to_string())
        }
    } else {
        Err(format!(
            "Invalid storage '{}'. Must be one of: memory, sqlite:<path>",
            storage
        ))
    }
}

pub fn describe(err: LeaseError) -> String {
    format!("{} [{}]", err, err.reason())
}

// ─── Response Types ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseStatus {
    pub resource_name: String,
    pub resource_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
    pub leader_info: LeaderInfo,
    pub valid_leader: bool,
    pub expired: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Created,
    Acquired,
    Released,
    Renewed,
    Throttled,
}

#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub action: Action,
    #[serde(flatten)]
    pub status: LeaseStatus,
}

// ─── Commands ───────────────────────────────────────────────────────────────

fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Key-value leases carry no duration, so the configured one stands in.
fn is_expired(client: &LeaseClient, info: &LeaderInfo, now: DateTime<Utc>) -> bool {
    match info.lease_duration_seconds {
        Some(_) => info.is_expired(now),
        None => info.is_time_elapsed_seconds(now, i64::from(client.config().lease_duration_seconds())),
    }
}

fn describe_record(
    client: &LeaseClient,
    group: &str,
    record: Option<&LeaseRecord>,
    members: &BTreeSet<String>,
) -> LeaseStatus {
    let leader_info = client.decode(record, group, members);
    LeaseStatus {
        resource_name: client.resource_name(group),
        resource_type: client.backend().resource_type().to_string(),
        resource_version: record.and_then(LeaseRecord::version_token).map(str::to_owned),
        valid_leader: leader_info.has_valid_leader(),
        expired: !leader_info.has_empty_leader() && is_expired(client, &leader_info, now()),
        leader_info,
    }
}

fn fetch_existing(client: &LeaseClient, group: &str) -> Result<LeaseRecord, String> {
    client.fetch(group).map_err(describe)?.ok_or_else(|| {
        format!(
            "no lease record {}/{} for group '{}'",
            client.config().namespace,
            client.resource_name(group),
            group
        )
    })
}

pub fn status(client: &LeaseClient, group: &str, members: &BTreeSet<String>) -> Result<LeaseStatus, String> {
    let record = client.fetch(group).map_err(describe)?;
    Ok(describe_record(client, group, record.as_ref(), members))
}

/// One attempt at leadership: create when absent, otherwise CAS on top of the
/// current record. No retries.
pub fn acquire(
    client: &LeaseClient,
    group: &str,
    members: &BTreeSet<String>,
    force: bool,
) -> Result<CommandResponse, String> {
    let identity = client.config().identity.as_str();

    let Some(record) = client.fetch(group).map_err(describe)? else {
        let created = client.create(group, members).map_err(describe)?;
        tracing::info!(group, identity, "Leadership acquired on new record");
        return Ok(CommandResponse {
            action: Action::Created,
            status: describe_record(client, group, Some(&created), members),
        });
    };

    let current = client.decode(Some(&record), group, members);
    if let Some(holder) = current.leader.as_deref() {
        let held_by_other = !current.has_empty_leader() && holder != identity;
        if held_by_other && !force && !is_expired(client, &current, now()) {
            return Err(format!(
                "group '{}' is held by '{}' and the lease has not expired (use --force to take it)",
                group, holder
            ));
        }
        if held_by_other {
            tracing::warn!(group, previous = holder, identity, force, "Taking over leadership");
        }
    }

    let updated = client.acquire(group, record, members).map_err(describe)?;
    tracing::info!(group, identity, "Leadership acquired");
    Ok(CommandResponse {
        action: Action::Acquired,
        status: describe_record(client, group, Some(&updated), members),
    })
}

pub fn release(client: &LeaseClient, group: &str, members: &BTreeSet<String>) -> Result<CommandResponse, String> {
    let record = fetch_existing(client, group)?;
    let updated = client.release(group, record).map_err(describe)?;
    Ok(CommandResponse {
        action: Action::Released,
        status: describe_record(client, group, Some(&updated), members),
    })
}

pub fn renew(client: &LeaseClient, group: &str, members: &BTreeSet<String>) -> Result<CommandResponse, String> {
    let record = fetch_existing(client, group)?;
    let before = record.version_token().map(str::to_owned);
    let updated = client.renew(record).map_err(describe)?;

    let action = if updated.version_token() == before.as_deref() {
        Action::Throttled
    } else {
        Action::Renewed
    };
    Ok(CommandResponse {
        action,
        status: describe_record(client, group, Some(&updated), members),
    })
}
