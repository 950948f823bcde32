//! # kelect-core
//!
//! Lease backends for leader election on top of a version-stamped resource store.
//! A lease is either a pair of entries in a shared key/value record or a
//! dedicated structured record; every write is a compare-and-swap on the
//! record's version token.

pub mod backend;
#[path = "backend_key_value.rs"]
pub mod backend_key_value;
#[path = "backend_structured.rs"]
pub mod backend_structured;
pub mod client;
pub mod config;
pub mod error;
pub mod infrastructure;
#[path = "infrastructure_in_memory.rs"]
pub mod infrastructure_in_memory;
#[cfg(feature = "sqlite")]
#[path = "infrastructure_sqlite.rs"]
pub mod infrastructure_sqlite;
pub mod naming;
pub mod timestamp;
pub mod types;

pub use backend::{LeaseBackend, LeaseResourceType};
pub use error::{LeaseError, Result};

#[cfg(test)]
mod test_utils;
#[cfg(test)]
mod naming_test;
#[cfg(test)]
mod leader_test;
#[cfg(test)]
mod backend_test;
