//! # Fixed-Window Rate Limiter
//!
//! Distributed admission control per (client identity, endpoint) pair built on
//! [`KeyValueStore`] primitives. Deliberately fixed-window, not sliding:
//! sliding-window would change observable admission behavior, and the known
//! fixed-window imprecision (a window racing its own expiry can run slightly
//! long) is accepted.
//!
//! The counter increment is a single atomic round trip against the store.
//! Rejected requests still increment, so a throttled client cannot reset its
//! own window by being rejected, and every decision reports `remaining` and
//! `reset_seconds` so clients can back off intelligently.
//!
//! Policy on store outage: **fail open** with a logged warning. Unavailability
//! of a shared limiter must not take the service down; the provider's own
//! quotas are the backstop.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::cache::{keys, KeyValueStore};
use crate::config::{RateLimitRule, RateLimitsConfig};
use crate::error::{PrintgateError, Result};

/// Outcome of one admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub admitted: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Seconds until the current window resets
    pub reset_seconds: u64,
}

impl RateLimitDecision {
    fn open(limit: u32, window_seconds: u64) -> Self {
        Self {
            admitted: true,
            limit,
            remaining: limit,
            reset_seconds: window_seconds,
        }
    }
}

pub struct RateLimiter {
    store: Arc<dyn KeyValueStore>,
    config: RateLimitsConfig,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn KeyValueStore>, config: RateLimitsConfig) -> Self {
        Self { store, config }
    }

    /// Admission check using the configured rule for `operation`
    pub async fn check(&self, client_id: &str, operation: &str) -> RateLimitDecision {
        let rule = self.config.rule_for(operation);
        if !self.config.enabled {
            return RateLimitDecision::open(rule.limit, rule.window_seconds);
        }
        self.allow(client_id, operation, rule).await
    }

    /// Fixed-window admission: atomically increment the window counter, arm
    /// the expiry exactly once (on the first request of a fresh window), and
    /// admit iff the post-increment count is within the limit.
    pub async fn allow(
        &self,
        client_id: &str,
        endpoint: &str,
        rule: RateLimitRule,
    ) -> RateLimitDecision {
        let key = keys::rate_limit(endpoint, client_id);
        let window = Duration::from_secs(rule.window_seconds);

        let count = match self.store.incr(&key).await {
            Ok(count) => count,
            Err(e) => {
                warn!(key = %key, error = %e, "rate limit store unavailable, failing open");
                return RateLimitDecision::open(rule.limit, rule.window_seconds);
            }
        };

        // count == 1 means this request opened a fresh window; arm the expiry
        // exactly once. Re-arming on later counts would stretch the window.
        if count == 1 {
            if let Err(e) = self.store.expire(&key, window).await {
                warn!(key = %key, error = %e, "failed to arm rate limit window expiry");
            }
        }

        let reset_seconds = match self.store.ttl(&key).await {
            Ok(Some(ttl)) => ttl.as_secs(),
            // No TTL reported: either the expire call raced the increment or
            // the window lapsed between the two reads. Report a full window.
            Ok(None) => rule.window_seconds,
            Err(e) => {
                warn!(key = %key, error = %e, "rate limit ttl read failed");
                rule.window_seconds
            }
        };

        let admitted = count <= i64::from(rule.limit);
        let remaining = u32::try_from((i64::from(rule.limit) - count).max(0)).unwrap_or(0);

        debug!(
            key = %key,
            count = count,
            limit = rule.limit,
            admitted = admitted,
            reset_seconds = reset_seconds,
            "rate limit decision"
        );

        RateLimitDecision {
            admitted,
            limit: rule.limit,
            remaining,
            reset_seconds,
        }
    }

    /// Convenience wrapper turning a rejection into the crate error type
    pub async fn enforce(&self, client_id: &str, operation: &str) -> Result<RateLimitDecision> {
        let decision = self.check(client_id, operation).await;
        if decision.admitted {
            Ok(decision)
        } else {
            Err(PrintgateError::RateLimited {
                limit: decision.limit,
                remaining: decision.remaining,
                reset_seconds: decision.reset_seconds,
            })
        }
    }
}
