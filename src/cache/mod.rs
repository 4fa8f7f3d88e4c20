//! # Key-Value Cache Store
//!
//! Thin contract over a networked key-value cache plus two implementations:
//! a Redis-backed store for deployments and an in-process store for tests and
//! cacheless development. Every consumer (repository, rate limiter) depends on
//! the [`KeyValueStore`] trait, never on a concrete store.
//!
//! Store failures are a distinct error type from the crate taxonomy on
//! purpose: callers decide locally whether a store failure degrades (cache
//! path), fails open (limiter), or propagates.

pub mod keys;
pub mod memory;
pub mod redis_store;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors from the key-value store. Never surfaced to API callers directly.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key-value store unavailable: {0}")]
    Unavailable(String),

    #[error("key-value store protocol error: {0}")]
    Protocol(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Contract for the networked key-value cache.
///
/// `incr` must be a single atomic round trip against the store: the fixed
/// window limiter's correctness depends on concurrent increments never losing
/// an update.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()>;

    /// Delete the given keys, returning how many existed
    async fn delete(&self, keys: &[String]) -> StoreResult<u64>;

    /// List keys matching a glob-style pattern (`*` wildcard)
    async fn keys(&self, pattern: &str) -> StoreResult<Vec<String>>;

    /// Atomically increment a counter, creating it at 1 if absent
    async fn incr(&self, key: &str) -> StoreResult<i64>;

    /// Remaining time-to-live; `None` when the key is absent or has no expiry
    async fn ttl(&self, key: &str) -> StoreResult<Option<Duration>>;

    /// Set a key's expiry; returns false when the key does not exist
    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<bool>;
}
