//! # Process-Local Response Cache
//!
//! TTL-based cache for successful responses to idempotent, side-effect-free
//! requests, keyed by the full request URL. Independent of the shared
//! key-value store: per-process only, safe to lose on restart, a latency
//! optimization rather than a correctness mechanism.
//!
//! There is no background eviction. Stale entries are overwritten on the next
//! miss-and-refetch, and memory stays bounded because request-key cardinality
//! is bounded by the small set of parameterized catalog endpoints this
//! protects. Failed computations are never stored.
//!
//! Constructed explicitly and injected into the application state, not a
//! module-level singleton, so its lifetime is tied to process startup.

use dashmap::DashMap;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::error::Result;

struct Entry {
    payload: Value,
    stored_at: Instant,
}

/// Concurrent-safe response cache shared by all in-flight requests
#[derive(Default)]
pub struct ResponseCache {
    entries: DashMap<String, Entry>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached payload for `request_key` when fresher than `ttl`;
    /// otherwise run `compute`, store its success, and return it. Errors from
    /// `compute` propagate and leave any prior entry untouched.
    pub async fn fetch_with_cache<F, Fut>(
        &self,
        request_key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        if let Some(entry) = self.entries.get(request_key) {
            if entry.stored_at.elapsed() < ttl {
                debug!(key = %request_key, "response cache hit");
                return Ok(entry.payload.clone());
            }
        }

        let payload = compute().await?;

        self.entries.insert(
            request_key.to_string(),
            Entry {
                payload: payload.clone(),
                stored_at: Instant::now(),
            },
        );
        debug!(key = %request_key, "response cache populated");
        Ok(payload)
    }

    /// Number of entries currently held, fresh and stale alike
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
