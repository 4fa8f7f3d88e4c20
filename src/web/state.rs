//! # Web Application State
//!
//! Shared state for the HTTP surface. Every component is constructed
//! explicitly at startup and injected here behind its trait where one exists,
//! so tests assemble the same state from stubs.

use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::cache::{KeyValueStore, RedisStore};
use crate::config::PrintgateConfig;
use crate::error::{PrintgateError, Result};
use crate::limiter::RateLimiter;
use crate::poller::JobPoller;
use crate::provider::{MockupProvider, PrintProviderClient};
use crate::repository::{CacheAsideRepository, PgRelationalStore, RelationalStore};
use crate::response_cache::ResponseCache;

/// Shared application state, cloned per request
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<PrintgateConfig>,
    pub repository: Arc<CacheAsideRepository>,
    pub limiter: Arc<RateLimiter>,
    pub response_cache: Arc<ResponseCache>,
    pub provider: Arc<dyn MockupProvider>,
    pub poller: Arc<JobPoller>,
}

impl AppState {
    /// Build production state: Postgres pool, Redis store, provider client
    pub async fn from_config(config: PrintgateConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .acquire_timeout(Duration::from_secs(config.database.connect_timeout_seconds))
            .connect(&config.database.url)
            .await
            .map_err(|e| PrintgateError::internal(format!("database connection failed: {e}")))?;

        info!(
            max_connections = config.database.max_connections,
            "database pool ready"
        );

        let store: Arc<dyn KeyValueStore> = Arc::new(
            RedisStore::connect(&config.cache.redis_url)
                .await
                .map_err(|e| PrintgateError::internal(format!("redis connection failed: {e}")))?,
        );

        let relational: Arc<dyn RelationalStore> = Arc::new(PgRelationalStore::new(pool));
        let provider: Arc<dyn MockupProvider> =
            Arc::new(PrintProviderClient::new(config.provider.clone())?);

        Ok(Self::assemble(config, store, relational, provider))
    }

    /// Assemble state from pre-built components. Tests use this with the
    /// memory store and stub provider/relational implementations.
    pub fn assemble(
        config: PrintgateConfig,
        store: Arc<dyn KeyValueStore>,
        relational: Arc<dyn RelationalStore>,
        provider: Arc<dyn MockupProvider>,
    ) -> Self {
        let mut repository =
            CacheAsideRepository::new(store.clone(), relational, config.cache.default_ttl());
        if !config.cache.enabled {
            repository = repository.without_cache();
        }
        let repository = Arc::new(repository);
        let limiter = Arc::new(RateLimiter::new(store, config.rate_limits.clone()));
        let poller = Arc::new(JobPoller::new(provider.clone(), &config.provider));

        Self {
            config: Arc::new(config),
            repository,
            limiter,
            response_cache: Arc::new(ResponseCache::new()),
            provider,
            poller,
        }
    }
}
