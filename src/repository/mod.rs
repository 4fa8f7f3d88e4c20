//! # Cache-Aside Repository
//!
//! Read-through caching over the relational store with explicit invalidation
//! on mutation. Entities and cached lists travel as `serde_json::Value`, keyed
//! through [`crate::cache::keys`] so the read and invalidation paths share one
//! source of key truth.
//!
//! The cache is best-effort, never a correctness dependency: a store failure
//! on read is treated as a miss and the relational store answers; a store
//! failure on write-through or invalidation is logged and swallowed, at the
//! cost of a stale window bounded by the entry TTL.

mod relational;

pub use relational::{PgRelationalStore, RelationalStore};

use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::cache::{keys, KeyValueStore};
use crate::error::{PrintgateError, Result};

/// Sort direction for list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Filter/sort/paging options for a list query.
///
/// Filters live in a `BTreeMap` so canonicalization is deterministic: two
/// logically equal option sets always serialize identically, and therefore
/// always hit the same cache key.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub filters: BTreeMap<String, Value>,
    pub order_by: Option<(String, SortDirection)>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl QueryOptions {
    pub fn filter(mut self, column: impl Into<String>, value: Value) -> Self {
        self.filters.insert(column.into(), value);
        self
    }

    pub fn order(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by = Some((column.into(), direction));
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Canonical JSON form of the full option set, used for cache keys
    pub fn canonical(&self) -> Value {
        json!({
            "filters": self.filters,
            "order": self.order_by.as_ref().map(|(col, dir)| json!([col, dir.as_str()])),
            "limit": self.limit,
            "offset": self.offset,
        })
    }
}

/// Per-call caching options
#[derive(Debug, Clone, Copy)]
pub struct CacheOptions {
    pub use_cache: bool,
    /// Entry TTL; `None` uses the repository default (300s)
    pub ttl: Option<Duration>,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            ttl: None,
        }
    }
}

impl CacheOptions {
    pub fn uncached() -> Self {
        Self {
            use_cache: false,
            ttl: None,
        }
    }
}

/// Repository wrapping the relational store with cache-aside reads and
/// explicit invalidation on mutation
pub struct CacheAsideRepository {
    store: Arc<dyn KeyValueStore>,
    relational: Arc<dyn RelationalStore>,
    default_ttl: Duration,
    enabled: bool,
}

impl CacheAsideRepository {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        relational: Arc<dyn RelationalStore>,
        default_ttl: Duration,
    ) -> Self {
        Self {
            store,
            relational,
            default_ttl,
            enabled: true,
        }
    }

    /// Disable caching repository-wide: every read goes straight to the
    /// relational store and mutations skip invalidation. Per-call
    /// [`CacheOptions`] cannot re-enable it.
    pub fn without_cache(mut self) -> Self {
        self.enabled = false;
        self
    }

    fn caching(&self, options: CacheOptions) -> bool {
        self.enabled && options.use_cache
    }

    /// Fetch one entity by primary key, read-through cached under `{table}:{id}`.
    ///
    /// A relational miss is `NotFound` and is never cached, so a row created
    /// after a miss is visible immediately.
    pub async fn get_by_id(&self, table: &str, id: i64, options: CacheOptions) -> Result<Value> {
        let key = keys::entity(table, id);
        let caching = self.caching(options);

        if caching {
            if let Some(hit) = self.cache_read(&key).await {
                debug!(key = %key, "cache hit");
                return Ok(hit);
            }
        }

        let entity = self
            .relational
            .fetch_by_id(table, id)
            .await?
            .ok_or_else(|| PrintgateError::not_found(format!("{table} {id}")))?;

        if caching {
            self.cache_write(&key, &entity, options.ttl).await;
        }
        Ok(entity)
    }

    /// Fetch a filtered/sorted/paginated list, cached whole under a canonical
    /// query key. Individual rows inside a cached list are never invalidated
    /// piecemeal; mutations drop the whole list key.
    pub async fn query(
        &self,
        table: &str,
        query: &QueryOptions,
        options: CacheOptions,
    ) -> Result<Vec<Value>> {
        let key = keys::query(table, &query.canonical());
        let caching = self.caching(options);

        if caching {
            if let Some(hit) = self.cache_read(&key).await {
                debug!(key = %key, "cache hit");
                if let Value::Array(rows) = hit {
                    return Ok(rows);
                }
                // A non-list payload under a query key means the entry is
                // corrupt; fall through and overwrite it
                warn!(key = %key, "cached query entry was not a list, refetching");
            }
        }

        let rows = self.relational.fetch_query(table, query).await?;

        if caching {
            self.cache_write(&key, &Value::Array(rows.clone()), options.ttl)
                .await;
        }
        Ok(rows)
    }

    /// Like [`Self::query`], but cached under a caller-named scope key
    /// instead of the canonical query hash. Aggregate views (one user's
    /// projects) use this so mutations can invalidate them by name.
    pub async fn query_scoped(
        &self,
        table: &str,
        query: &QueryOptions,
        scope_key: &str,
        options: CacheOptions,
    ) -> Result<Vec<Value>> {
        let caching = self.caching(options);

        if caching {
            if let Some(Value::Array(rows)) = self.cache_read(scope_key).await {
                debug!(key = %scope_key, "cache hit");
                return Ok(rows);
            }
        }

        let rows = self.relational.fetch_query(table, query).await?;

        if caching {
            self.cache_write(scope_key, &Value::Array(rows.clone()), options.ttl)
                .await;
        }
        Ok(rows)
    }

    /// Update an entity, then invalidate its entity key plus every scope key
    /// the caller names. Over-invalidation is the accepted cost of keeping
    /// aggregate views consistent.
    pub async fn update(
        &self,
        table: &str,
        id: i64,
        changes: &Value,
        scope_keys: &[String],
    ) -> Result<Value> {
        let updated = self
            .relational
            .update(table, id, changes)
            .await?
            .ok_or_else(|| PrintgateError::not_found(format!("{table} {id}")))?;

        self.invalidate(table, id).await;
        for key in scope_keys {
            self.invalidate_scope(key).await;
        }
        Ok(updated)
    }

    /// Insert a new entity. The fresh row has no entity key to drop, but any
    /// cached list for the table could now be missing it, so all of the
    /// table's query keys plus the named scope keys are invalidated.
    pub async fn insert(&self, table: &str, data: &Value, scope_keys: &[String]) -> Result<Value> {
        let inserted = self.relational.insert(table, data).await?;

        self.invalidate_pattern(&keys::table_queries(table)).await;
        for key in scope_keys {
            self.invalidate_scope(key).await;
        }
        Ok(inserted)
    }

    /// Delete an entity and drop its entity key plus the named scope keys
    pub async fn delete_row(&self, table: &str, id: i64, scope_keys: &[String]) -> Result<()> {
        let existed = self.relational.delete(table, id).await?;
        if !existed {
            return Err(PrintgateError::not_found(format!("{table} {id}")));
        }

        self.invalidate(table, id).await;
        self.invalidate_pattern(&keys::table_queries(table)).await;
        for key in scope_keys {
            self.invalidate_scope(key).await;
        }
        Ok(())
    }

    /// Drop the exact entity key for `{table}:{id}`
    pub async fn invalidate(&self, table: &str, id: i64) {
        self.invalidate_scope(&keys::entity(table, id)).await;
    }

    /// Drop one exact key. Failures are logged and swallowed: the entry will
    /// age out at its TTL.
    pub async fn invalidate_scope(&self, key: &str) {
        if !self.enabled {
            return;
        }
        if let Err(e) = self.store.delete(&[key.to_string()]).await {
            warn!(key = %key, error = %e, "cache invalidation failed, entry will expire by ttl");
        }
    }

    /// Drop every key matching a glob pattern, e.g. all cached queries for a
    /// table after a bulk import
    pub async fn invalidate_pattern(&self, pattern: &str) {
        if !self.enabled {
            return;
        }
        let matched = match self.store.keys(pattern).await {
            Ok(matched) => matched,
            Err(e) => {
                warn!(pattern = %pattern, error = %e, "cache pattern lookup failed");
                return;
            }
        };
        if matched.is_empty() {
            return;
        }
        if let Err(e) = self.store.delete(&matched).await {
            warn!(pattern = %pattern, error = %e, "cache pattern invalidation failed");
        }
    }

    async fn cache_read(&self, key: &str) -> Option<Value> {
        match self.store.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(key = %key, error = %e, "cached entry was not valid json, treating as miss");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                // Cache availability is best-effort; fall through to the
                // relational store
                warn!(key = %key, error = %e, "cache read failed, falling through to database");
                None
            }
        }
    }

    async fn cache_write(&self, key: &str, value: &Value, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.default_ttl);
        if let Err(e) = self.store.set(key, &value.to_string(), Some(ttl)).await {
            warn!(key = %key, error = %e, "cache write failed, result still served from database");
        }
    }
}
