// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Cachemark Contributors

//! In-process store implementing the backend capability surface.
//!
//! Used by the engine integration tests and for dry runs without live
//! servers. Every operation succeeds; TTLs are honored lazily on read.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::error::OperationError;

use super::CacheConnection;

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    map: Mutex<HashMap<String, Entry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.map.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CacheConnection for InMemoryStore {
    fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), OperationError> {
        let expires_at = if ttl_secs > 0 {
            Some(Instant::now() + Duration::from_secs(ttl_secs))
        } else {
            None
        };
        self.map().insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, OperationError> {
        let now = Instant::now();
        let mut map = self.map();
        match map.get(key) {
            Some(entry) if entry.is_expired(now) => {
                map.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    fn delete(&self, key: &str) -> Result<bool, OperationError> {
        Ok(self.map().remove(key).is_some())
    }

    fn exists(&self, key: &str) -> Result<bool, OperationError> {
        self.get(key).map(|v| v.is_some())
    }

    fn bulk_set(&self, items: &BTreeMap<String, String>) -> Result<(), OperationError> {
        let mut map = self.map();
        for (key, value) in items {
            map.insert(
                key.clone(),
                Entry {
                    value: value.clone(),
                    expires_at: None,
                },
            );
        }
        Ok(())
    }

    fn bulk_get(&self, keys: &[String]) -> Result<HashMap<String, String>, OperationError> {
        let now = Instant::now();
        let map = self.map();
        let mut found = HashMap::new();
        for key in keys {
            if let Some(entry) = map.get(key) {
                if !entry.is_expired(now) {
                    found.insert(key.clone(), entry.value.clone());
                }
            }
        }
        Ok(found)
    }

    fn flush_all(&self) -> Result<(), OperationError> {
        self.map().clear();
        Ok(())
    }

    fn ping(&self) -> Result<(), OperationError> {
        Ok(())
    }

    fn stats(&self) -> Result<HashMap<String, String>, OperationError> {
        let map = self.map();
        let bytes: usize = map
            .iter()
            .map(|(k, entry)| k.len() + entry.value.len())
            .sum();

        let mut stats = HashMap::new();
        stats.insert("mem_bytes".to_string(), bytes.to_string());
        stats.insert("items".to_string(), map.len().to_string());
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_delete() {
        let store = InMemoryStore::new();
        store.set("k", "v", 0).unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v".to_string()));
        assert!(store.exists("k").unwrap());
        assert!(store.delete("k").unwrap());
        assert!(!store.delete("k").unwrap());
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_bulk_roundtrip() {
        let store = InMemoryStore::new();
        let mut items = BTreeMap::new();
        items.insert("a".to_string(), "1".to_string());
        items.insert("b".to_string(), "2".to_string());
        store.bulk_set(&items).unwrap();

        let keys = vec!["a".to_string(), "b".to_string(), "missing".to_string()];
        let found = store.bulk_get(&keys).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found["a"], "1");
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let store = InMemoryStore::new();
        store.set("k", "v", 1).unwrap();
        // Force expiry without sleeping.
        if let Some(entry) = store.map().get_mut("k") {
            entry.expires_at = Some(Instant::now() - Duration::from_secs(1));
        }
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_flush_and_stats() {
        let store = InMemoryStore::new();
        store.set("key", "value", 0).unwrap();
        let stats = store.stats().unwrap();
        assert_eq!(stats["items"], "1");
        assert_eq!(stats["mem_bytes"], "8");

        store.flush_all().unwrap();
        assert_eq!(store.stats().unwrap()["items"], "0");
    }
}
