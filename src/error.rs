//! # Error Taxonomy
//!
//! Crate-wide error type shared by the repository, limiter, poller, and the
//! web surface. Cache-store failures never appear here at the caller boundary:
//! the cache path recovers locally and degrades to skip-cache behavior.

use thiserror::Error;

/// Errors surfaced by printgate components
#[derive(Debug, Error)]
pub enum PrintgateError {
    /// Relational lookup miss. A valid outcome, not a fault.
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// Network or HTTP failure talking to the print provider or cache store
    #[error("upstream unavailable: {message}")]
    UpstreamUnavailable {
        message: String,
        /// HTTP status from the provider, when it supplied one
        status: Option<u16>,
    },

    /// Admission denied by the fixed-window rate limiter
    #[error("rate limit exceeded: {limit} requests per window")]
    RateLimited {
        limit: u32,
        remaining: u32,
        reset_seconds: u64,
    },

    /// Poll budget exhausted without a terminal upstream state. Retryable:
    /// the task id allows the caller to resume polling out-of-band.
    #[error("mockup generation timed out (task {task_id})")]
    Timeout { task_id: String },

    /// Malformed caller input
    #[error("validation failed: {0}")]
    Validation(String),

    /// Anything unclassified
    #[error("internal error: {0}")]
    Internal(String),
}

impl PrintgateError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            message: message.into(),
            status: None,
        }
    }

    pub fn upstream_status(message: impl Into<String>, status: u16) -> Self {
        Self::UpstreamUnavailable {
            message: message.into(),
            status: Some(status),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// True when the caller can meaningfully retry the same operation
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::UpstreamUnavailable { .. } | Self::RateLimited { .. }
        )
    }
}

impl From<sqlx::Error> for PrintgateError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::not_found("row"),
            sqlx::Error::PoolTimedOut => Self::upstream("database pool timed out"),
            other => Self::Internal(format!("database error: {other}")),
        }
    }
}

impl From<serde_json::Error> for PrintgateError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("serialization error: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, PrintgateError>;
