//! SQLite-backed ResourceStore implementation.
//! Provides persistent lease records shared by every process opening the same file.
//!
//! Enable with the `sqlite` feature flag:
//! ```toml
//! kelect-core = { path = "../kelect-core", features = ["sqlite"] }
//! ```

use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{LeaseError, Result};
use crate::infrastructure::ResourceStore;
use crate::types::{LeaseRecord, ResourceKind};

/// A persistent record store backed by SQLite.
///
/// Uses WAL mode so readers do not block the single writer. Version tokens are
/// per-record integers bumped inside the conditional `UPDATE`.
pub struct SqliteResourceStore {
    conn: Mutex<Connection>,
}

impl SqliteResourceStore {
    /// Open (or create) a SQLite database at the given path.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent read performance
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS resources (
                kind             TEXT NOT NULL,
                namespace        TEXT NOT NULL,
                name             TEXT NOT NULL,
                resource_version INTEGER NOT NULL,
                body             TEXT NOT NULL,
                PRIMARY KEY (kind, namespace, name)
            );",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn encode(record: &LeaseRecord) -> Result<String> {
        // The version lives in its own column; the body never carries a stale copy.
        let mut stored = record.clone();
        stored.metadata_mut().resource_version = None;
        Ok(serde_json::to_string(&stored)?)
    }

    fn decode(body: &str, version: i64) -> Result<LeaseRecord> {
        let mut record: LeaseRecord = serde_json::from_str(body)?;
        record.metadata_mut().resource_version = Some(version.to_string());
        Ok(record)
    }

    fn exists(conn: &Connection, kind: ResourceKind, namespace: &str, name: &str) -> Result<bool> {
        let found = conn
            .query_row(
                "SELECT 1 FROM resources WHERE kind = ?1 AND namespace = ?2 AND name = ?3",
                params![kind.as_str(), namespace, name],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

impl ResourceStore for SqliteResourceStore {
    fn get(&self, kind: ResourceKind, namespace: &str, name: &str) -> Result<Option<LeaseRecord>> {
        let conn = self.conn();
        let row: Option<(String, i64)> = conn
            .query_row(
                "SELECT body, resource_version FROM resources
                 WHERE kind = ?1 AND namespace = ?2 AND name = ?3",
                params![kind.as_str(), namespace, name],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        row.map(|(body, version)| Self::decode(&body, version)).transpose()
    }

    fn create(&self, namespace: &str, mut record: LeaseRecord) -> Result<LeaseRecord> {
        record.metadata_mut().namespace = namespace.to_string();
        let body = Self::encode(&record)?;

        let conn = self.conn();
        let inserted = conn.execute(
            "INSERT INTO resources (kind, namespace, name, resource_version, body)
             VALUES (?1, ?2, ?3, 1, ?4)
             ON CONFLICT (kind, namespace, name) DO NOTHING",
            params![record.kind().as_str(), namespace, record.name(), body],
        )?;

        if inserted == 0 {
            return Err(LeaseError::AlreadyExists {
                kind: record.kind(),
                namespace: namespace.to_string(),
                name: record.name().to_string(),
            });
        }

        record.metadata_mut().resource_version = Some("1".to_string());
        Ok(record)
    }

    fn update(&self, namespace: &str, mut record: LeaseRecord, version_token: &str) -> Result<LeaseRecord> {
        record.metadata_mut().namespace = namespace.to_string();
        let body = Self::encode(&record)?;
        let kind = record.kind();
        let name = record.name().to_string();

        let conn = self.conn();
        let missing_or_conflict = |conn: &Connection| -> LeaseError {
            match Self::exists(conn, kind, namespace, &name) {
                Ok(true) => LeaseError::VersionConflict {
                    kind,
                    namespace: namespace.to_string(),
                    name: name.clone(),
                    expected: version_token.to_string(),
                },
                Ok(false) => LeaseError::NotFound {
                    kind,
                    namespace: namespace.to_string(),
                    name: name.clone(),
                },
                Err(e) => e,
            }
        };

        // Tokens this store never issued cannot match any row.
        let Ok(expected) = version_token.parse::<i64>() else {
            return Err(missing_or_conflict(&conn));
        };

        let version: Option<i64> = conn
            .query_row(
                "UPDATE resources SET resource_version = resource_version + 1, body = ?1
                 WHERE kind = ?2 AND namespace = ?3 AND name = ?4 AND resource_version = ?5
                 RETURNING resource_version",
                params![body, kind.as_str(), namespace, name, expected],
                |row| row.get(0),
            )
            .optional()?;

        match version {
            Some(version) => {
                record.metadata_mut().resource_version = Some(version.to_string());
                Ok(record)
            }
            None => Err(missing_or_conflict(&conn)),
        }
    }
}
