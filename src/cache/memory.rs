//! In-process [`KeyValueStore`] with Redis-compatible TTL semantics.
//!
//! Backs the test suite and cacheless development deployments. Expiry uses
//! `tokio::time::Instant`, so tests running under a paused runtime can advance
//! the clock deterministically instead of sleeping.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

use super::{KeyValueStore, StoreError, StoreResult};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop an expired entry on access, mirroring Redis lazy expiry
    fn live_value(entries: &mut HashMap<String, Entry>, key: &str, now: Instant) -> Option<Entry> {
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.clone()),
            None => None,
        }
    }
}

/// Glob match supporting the `*` wildcard only, which is all the repository's
/// pattern invalidation uses
fn glob_match(pattern: &str, key: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == key;
    }

    let mut remaining = key;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            match remaining.strip_prefix(part) {
                Some(rest) => remaining = rest,
                None => return false,
            }
        } else if i == parts.len() - 1 {
            return remaining.ends_with(part);
        } else {
            match remaining.find(part) {
                Some(pos) => remaining = &remaining[pos + part.len()..],
                None => return false,
            }
        }
    }
    true
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        Ok(Self::live_value(&mut entries, key, now).map(|e| e.value))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()> {
        let entry = Entry {
            value: value.to_string(),
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.entries.lock().insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> StoreResult<u64> {
        let mut entries = self.entries.lock();
        let mut removed = 0;
        for key in keys {
            if entries.remove(key).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        let now = Instant::now();
        let entries = self.entries.lock();
        Ok(entries
            .iter()
            .filter(|(key, entry)| !entry.is_expired(now) && glob_match(pattern, key))
            .map(|(key, _)| key.clone())
            .collect())
    }

    async fn incr(&self, key: &str) -> StoreResult<i64> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let current = match Self::live_value(&mut entries, key, now) {
            Some(entry) => entry
                .value
                .parse::<i64>()
                .map_err(|_| StoreError::Protocol(format!("key {key} holds a non-integer")))?,
            None => 0,
        };
        let next = current + 1;
        // A fresh counter has no expiry until the caller arms one, as in Redis
        let expires_at = entries.get(key).and_then(|e| e.expires_at);
        entries.insert(
            key.to_string(),
            Entry {
                value: next.to_string(),
                expires_at,
            },
        );
        Ok(next)
    }

    async fn ttl(&self, key: &str) -> StoreResult<Option<Duration>> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        Ok(Self::live_value(&mut entries, key, now)
            .and_then(|e| e.expires_at)
            .map(|at| at.saturating_duration_since(now)))
    }

    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<bool> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        if Self::live_value(&mut entries, key, now).is_none() {
            return Ok(false);
        }
        if let Some(entry) = entries.get_mut(key) {
            entry.expires_at = Some(now + ttl);
        }
        Ok(true)
    }
}
