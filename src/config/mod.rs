//! # Printgate Configuration System
//!
//! Typed configuration for every component: web bind address, database pool,
//! cache store, per-operation rate limits, and the print-provider client.
//! Configuration loads from an optional TOML file plus `PRINTGATE_`-prefixed
//! environment overrides; every section carries explicit defaults so a bare
//! environment still produces a runnable development configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{PrintgateError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PrintgateConfig {
    pub web: WebConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub rate_limits: RateLimitsConfig,
    pub provider: ProviderConfig,
    pub response_cache: ResponseCacheConfig,
}

impl Default for PrintgateConfig {
    fn default() -> Self {
        Self {
            web: WebConfig::default(),
            database: DatabaseConfig::default(),
            cache: CacheConfig::default(),
            rate_limits: RateLimitsConfig::default(),
            provider: ProviderConfig::default(),
            response_cache: ResponseCacheConfig::default(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WebConfig {
    pub bind_address: String,
    pub request_timeout_ms: u64,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_ms: 30_000,
        }
    }
}

/// Database connection and pooling configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/printgate_development".to_string(),
            max_connections: 10,
            connect_timeout_seconds: 5,
        }
    }
}

/// Key-value cache store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    pub redis_url: String,
    /// Default TTL for cache-aside entries, seconds
    pub default_ttl_seconds: u64,
    /// When false, the repository skips the cache entirely (memory-only dev mode)
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            default_ttl_seconds: 300,
            enabled: true,
        }
    }
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_seconds)
    }
}

/// A single fixed-window rate limit: N requests per window
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct RateLimitRule {
    pub limit: u32,
    pub window_seconds: u64,
}

/// Per-operation rate limit table with a fallback default rule
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitsConfig {
    pub enabled: bool,
    pub default: RateLimitRule,
    /// Operation name -> rule, e.g. "mockup-generation" -> {limit: 10, window: 60}
    pub operations: HashMap<String, RateLimitRule>,
}

impl Default for RateLimitsConfig {
    fn default() -> Self {
        let mut operations = HashMap::new();
        operations.insert(
            "mockup-generation".to_string(),
            RateLimitRule {
                limit: 10,
                window_seconds: 60,
            },
        );
        operations.insert(
            "catalog".to_string(),
            RateLimitRule {
                limit: 120,
                window_seconds: 60,
            },
        );
        Self {
            enabled: true,
            default: RateLimitRule {
                limit: 60,
                window_seconds: 60,
            },
            operations,
        }
    }
}

impl RateLimitsConfig {
    /// Resolve the rule for an operation, falling back to the default rule
    pub fn rule_for(&self, operation: &str) -> RateLimitRule {
        self.operations
            .get(operation)
            .copied()
            .unwrap_or(self.default)
    }
}

/// Print-provider API client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    /// Static bearer credential attached to every provider call
    pub api_token: String,
    pub request_timeout_ms: u64,
    /// Fixed delay between mockup-task status polls
    pub poll_interval_ms: u64,
    /// Poll budget before a generation attempt times out
    pub max_poll_attempts: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.printful.com".to_string(),
            api_token: String::new(),
            request_timeout_ms: 15_000,
            poll_interval_ms: 1_000,
            max_poll_attempts: 10,
        }
    }
}

impl ProviderConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Process-local response cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResponseCacheConfig {
    pub ttl_seconds: u64,
}

impl Default for ResponseCacheConfig {
    fn default() -> Self {
        // One hour: catalog/variant payloads change rarely
        Self { ttl_seconds: 3600 }
    }
}

impl ResponseCacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

impl PrintgateConfig {
    /// Load configuration from `PRINTGATE_CONFIG` (TOML file, optional) with
    /// `PRINTGATE_`-prefixed environment overrides layered on top
    pub fn load() -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Ok(path) = std::env::var("PRINTGATE_CONFIG") {
            builder = builder.add_source(config::File::with_name(&path));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix("PRINTGATE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| PrintgateError::internal(format!("configuration error: {e}")))?;

        settings
            .try_deserialize()
            .map_err(|e| PrintgateError::internal(format!("configuration error: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_runnable() {
        let config = PrintgateConfig::default();
        assert_eq!(config.cache.default_ttl_seconds, 300);
        assert_eq!(config.provider.max_poll_attempts, 10);
        assert_eq!(config.provider.poll_interval_ms, 1_000);
        assert_eq!(config.response_cache.ttl_seconds, 3600);
    }

    #[test]
    fn rate_limit_table_falls_back_to_default_rule() {
        let config = RateLimitsConfig::default();
        let known = config.rule_for("mockup-generation");
        assert_eq!(known.limit, 10);

        let unknown = config.rule_for("no-such-operation");
        assert_eq!(unknown.limit, config.default.limit);
        assert_eq!(unknown.window_seconds, config.default.window_seconds);
    }
}
