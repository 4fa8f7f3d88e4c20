//! Redis-backed [`KeyValueStore`] using a shared multiplexed connection.
//!
//! The [`ConnectionManager`] reconnects on failure and is cheap to clone, so
//! each operation clones the handle rather than holding a pool.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::debug;

use super::{KeyValueStore, StoreError, StoreResult};

pub struct RedisStore {
    manager: ConnectionManager,
}

impl RedisStore {
    /// Connect to Redis at the given URL
    pub async fn connect(redis_url: &str) -> StoreResult<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| StoreError::Protocol(format!("invalid redis url: {e}")))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        debug!(url = %redis_url, "connected to redis");
        Ok(Self { manager })
    }
}

fn map_err(err: redis::RedisError) -> StoreError {
    if err.is_io_error() || err.is_connection_refusal() || err.is_timeout() {
        StoreError::Unavailable(err.to_string())
    } else {
        StoreError::Protocol(err.to_string())
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.manager.clone();
        conn.get(key).await.map_err(map_err)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()> {
        let mut conn = self.manager.clone();
        match ttl {
            Some(ttl) => conn
                .set_ex::<_, _, ()>(key, value, ttl.as_secs())
                .await
                .map_err(map_err),
            None => conn.set::<_, _, ()>(key, value).await.map_err(map_err),
        }
    }

    async fn delete(&self, keys: &[String]) -> StoreResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.manager.clone();
        conn.del(keys.to_vec()).await.map_err(map_err)
    }

    async fn keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        let mut conn = self.manager.clone();
        conn.keys(pattern).await.map_err(map_err)
    }

    async fn incr(&self, key: &str) -> StoreResult<i64> {
        let mut conn = self.manager.clone();
        // Single INCR round trip: the limiter relies on this atomicity
        conn.incr(key, 1i64).await.map_err(map_err)
    }

    async fn ttl(&self, key: &str) -> StoreResult<Option<Duration>> {
        let mut conn = self.manager.clone();
        let seconds: i64 = conn.ttl(key).await.map_err(map_err)?;
        // Redis reports -2 for a missing key and -1 for no expiry
        if seconds < 0 {
            Ok(None)
        } else {
            Ok(Some(Duration::from_secs(seconds as u64)))
        }
    }

    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<bool> {
        let mut conn = self.manager.clone();
        conn.expire(key, ttl.as_secs() as i64).await.map_err(map_err)
    }
}
