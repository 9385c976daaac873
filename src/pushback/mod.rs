//! Pushback state: "this exact request was already pushed back once".
//!
//! Keyed by request hash so unrelated requests never clobber each other's
//! retry state. Records expire after a TTL, so a request abandoned after one
//! pushback eventually gets a fresh review.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One outstanding pushback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushbackRecord {
    pub request_hash: String,
    pub created_at: DateTime<Utc>,
}

impl PushbackRecord {
    pub fn new(request_hash: &str) -> Self {
        Self {
            request_hash: request_hash.to_string(),
            created_at: Utc::now(),
        }
    }

    /// A record from the future (clock skew) is never expired.
    pub fn is_expired(&self, ttl: Duration) -> bool {
        is_older_than(self.created_at, ttl)
    }
}

pub(crate) fn is_older_than(created_at: DateTime<Utc>, ttl: Duration) -> bool {
    Utc::now()
        .signed_duration_since(created_at)
        .to_std()
        .map_or(false, |age| age >= ttl)
}

/// Keyed pushback store.
pub trait PushbackStore: Send + Sync {
    /// Whether an unexpired record exists for `hash`.
    fn contains(&self, hash: &str) -> Result<bool>;

    /// Create a record if none exists. Returns `true` when this call created
    /// it and `false` when an unexpired record was already there.
    fn record(&self, hash: &str) -> Result<bool>;

    /// Remove the record for `hash`. Clearing a missing record is not an error.
    fn clear(&self, hash: &str) -> Result<()>;

    /// All unexpired records, oldest first.
    fn list(&self) -> Result<Vec<PushbackRecord>>;

    /// Drop expired records. Returns how many were removed.
    fn purge_expired(&self) -> Result<usize>;
}

/// Request hashes are lowercase hex. Anything else is rejected before it can
/// reach the filesystem as a file name.
pub fn validate_hash(hash: &str) -> Result<()> {
    if hash.is_empty() || hash.len() > 128 || !hash.bytes().all(|b| b.is_ascii_hexdigit()) {
        bail!("Invalid request hash: {:?}", hash);
    }
    Ok(())
}
