//! Typed cache-key builder.
//!
//! Every key the repository reads is built here, and every key a mutation
//! invalidates is built here, so the read path and the invalidation path can
//! never drift apart. Query keys hash a canonicalized option set: the JSON is
//! produced from ordered maps, so equal option sets always produce equal keys
//! and distinct filter/sort/paging combinations never collide.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Key for a single entity row: `{table}:{id}`
pub fn entity(table: &str, id: i64) -> String {
    format!("{table}:{id}")
}

/// Key for a cached list query: `{table}:query:{canonical-options-hash}`
pub fn query(table: &str, canonical_options: &Value) -> String {
    format!("{table}:query:{}", hash_options(canonical_options))
}

/// Aggregate view of one user's projects
pub fn user_projects(user_id: i64) -> String {
    format!("projects:user:{user_id}")
}

/// Fixed-window counter for a (client, endpoint) pair
pub fn rate_limit(endpoint: &str, client_id: &str) -> String {
    format!("rate-limit:{endpoint}:{client_id}")
}

/// Glob pattern matching every cached list query for a table. Mutations that
/// can change list membership drop everything this matches.
pub fn table_queries(table: &str) -> String {
    format!("{table}:query:*")
}

fn hash_options(options: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(options.to_string().as_bytes());
    let digest = hasher.finalize();
    // 16 hex chars keep keys short; collisions at this cardinality are moot
    hex_prefix(&digest, 8)
}

fn hex_prefix(bytes: &[u8], n: usize) -> String {
    bytes.iter().take(n).map(|b| format!("{b:02x}")).collect()
}
