#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # printgate
//!
//! Integration core between a product-customization application and a slow,
//! rate-limited, occasionally asynchronous print-on-demand provider. The
//! interesting engineering lives in four cooperating mechanisms:
//!
//! - [`repository`] — cache-aside data access over the relational store with
//!   explicit invalidation on mutation
//! - [`limiter`] — distributed fixed-window rate limiting per (client,
//!   endpoint) pair, built on atomic key-value store primitives
//! - [`response_cache`] — process-local TTL cache for idempotent provider
//!   responses
//! - [`poller`] — bounded submit-then-poll orchestration for asynchronous
//!   mockup-generation tasks
//!
//! A request enters, the limiter admits or rejects it, the response cache may
//! short-circuit it, and the repository or poller does the actual work,
//! driving calls to the provider as needed. Mutations invalidate every cache
//! key that could hold a view of the changed entity.
//!
//! ## Failure posture
//!
//! The key-value store is best-effort: read failures degrade to a cache miss,
//! write failures are logged and swallowed, and a limiter store outage fails
//! open. Provider failures surface with their status preserved, and a poll
//! timeout is a distinct, retryable error carrying the upstream task id.

pub mod cache;
pub mod config;
pub mod error;
pub mod limiter;
pub mod logging;
pub mod poller;
pub mod provider;
pub mod repository;
pub mod response_cache;
pub mod web;

pub use config::PrintgateConfig;
pub use error::{PrintgateError, Result};
pub use limiter::{RateLimitDecision, RateLimiter};
pub use poller::JobPoller;
pub use provider::{Mockup, MockupProvider, MockupRequest, PrintProviderClient, TaskState};
pub use repository::{CacheAsideRepository, CacheOptions, QueryOptions, SortDirection};
pub use response_cache::ResponseCache;
