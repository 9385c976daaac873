use crate::pushback::{is_older_than, PushbackRecord, PushbackStore};
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// In-process store for tests and dry runs.
pub struct MemoryStore {
    records: Mutex<HashMap<String, DateTime<Utc>>>,
    ttl: Duration,
}

impl MemoryStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, DateTime<Utc>>>> {
        self.records
            .lock()
            .map_err(|_| anyhow!("pushback store lock poisoned"))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(600))
    }
}

impl PushbackStore for MemoryStore {
    fn contains(&self, hash: &str) -> Result<bool> {
        let mut records = self.lock()?;
        match records.get(hash) {
            Some(created) if is_older_than(*created, self.ttl) => {
                records.remove(hash);
                Ok(false)
            }
            Some(_) => Ok(true),
            None => Ok(false),
        }
    }

    fn record(&self, hash: &str) -> Result<bool> {
        let mut records = self.lock()?;
        if let Some(created) = records.get(hash) {
            if !is_older_than(*created, self.ttl) {
                return Ok(false);
            }
        }
        records.insert(hash.to_string(), Utc::now());
        Ok(true)
    }

    fn clear(&self, hash: &str) -> Result<()> {
        self.lock()?.remove(hash);
        Ok(())
    }

    fn list(&self) -> Result<Vec<PushbackRecord>> {
        let records = self.lock()?;
        let mut out: Vec<PushbackRecord> = records
            .iter()
            .filter(|(_, created)| !is_older_than(**created, self.ttl))
            .map(|(hash, created)| PushbackRecord {
                request_hash: hash.clone(),
                created_at: *created,
            })
            .collect();
        out.sort_by_key(|r| r.created_at);
        Ok(out)
    }

    fn purge_expired(&self) -> Result<usize> {
        let mut records = self.lock()?;
        let before = records.len();
        records.retain(|_, created| !is_older_than(*created, self.ttl));
        Ok(before - records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_is_create_if_absent() {
        let store = MemoryStore::default();
        assert!(!store.contains("aa").unwrap());
        assert!(store.record("aa").unwrap());
        assert!(!store.record("aa").unwrap());
        assert!(store.contains("aa").unwrap());
    }

    #[test]
    fn test_keys_are_independent() {
        let store = MemoryStore::default();
        store.record("aa").unwrap();
        store.record("bb").unwrap();
        store.clear("aa").unwrap();
        assert!(!store.contains("aa").unwrap());
        assert!(store.contains("bb").unwrap());
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_expired_records_read_as_absent() {
        let store = MemoryStore::new(Duration::ZERO);
        assert!(store.record("aa").unwrap());
        assert!(!store.contains("aa").unwrap());
        assert!(store.record("aa").unwrap());
        assert!(store.list().unwrap().is_empty());
        assert_eq!(store.purge_expired().unwrap(), 1);
    }

    #[test]
    fn test_clear_missing_is_ok() {
        let store = MemoryStore::default();
        assert!(store.clear("nothing").is_ok());
    }
}
