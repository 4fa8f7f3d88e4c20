//! End-to-end tests over the axum router with stubbed upstream and database:
//! admission control, cached reads, invalidating writes, and error mapping.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::atomic::Ordering;
use tower::ServiceExt;

use common::{test_state, MockupBehavior, NoDatabase, StubProvider, StubRelational};
use printgate::config::{PrintgateConfig, RateLimitRule, RateLimitsConfig};
use printgate::web::build_router;

fn config_with_limit(limit: u32, window_seconds: u64) -> PrintgateConfig {
    let mut config = PrintgateConfig::default();
    config.rate_limits = RateLimitsConfig {
        enabled: true,
        default: RateLimitRule {
            limit,
            window_seconds,
        },
        operations: Default::default(),
    };
    config
}

fn unlimited_config() -> PrintgateConfig {
    let mut config = PrintgateConfig::default();
    config.rate_limits.enabled = false;
    config
}

async fn get(router: &Router, path: &str, client_id: &str) -> (StatusCode, Value, Option<String>) {
    let request = Request::builder()
        .uri(path)
        .header("x-client-id", client_id)
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let remaining = response
        .headers()
        .get("x-ratelimit-remaining")
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body, remaining)
}

#[tokio::test]
async fn health_is_always_available() {
    let provider = StubProvider::new(MockupBehavior::ReadyOnFirstPoll);
    let router = build_router(test_state(
        config_with_limit(0, 60),
        StubRelational::new(),
        provider,
    ));

    // Zero-limit config would reject everything behind the limiter, but
    // health sits outside it
    let (status, body, _) = get(&router, "/health", "client-a").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn catalog_reads_are_served_from_the_response_cache() {
    let provider = StubProvider::new(MockupBehavior::ReadyOnFirstPoll);
    let router = build_router(test_state(
        unlimited_config(),
        std::sync::Arc::new(NoDatabase),
        provider.clone(),
    ));

    for _ in 0..3 {
        let (status, body, _) = get(&router, "/v1/catalog/products/71", "client-a").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Unisex Tee");
    }
    // One upstream call; the other two were response-cache hits
    assert_eq!(provider.catalog_calls.load(Ordering::SeqCst), 1);

    // A different product is a different request key
    let (status, body, _) = get(&router, "/v1/catalog/products/72/variants/4012", "client-a").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["size"], "M");
    assert_eq!(provider.catalog_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn non_numeric_identifiers_are_rejected_with_400() {
    let provider = StubProvider::new(MockupBehavior::ReadyOnFirstPoll);
    let router = build_router(test_state(
        unlimited_config(),
        std::sync::Arc::new(NoDatabase),
        provider,
    ));

    let (status, body, _) = get(&router, "/v1/catalog/products/not-a-number", "client-a").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("product id"));
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn missing_project_is_404_with_structured_body() {
    let provider = StubProvider::new(MockupBehavior::ReadyOnFirstPoll);
    let router = build_router(test_state(
        unlimited_config(),
        StubRelational::new(),
        provider,
    ));

    let (status, body, _) = get(&router, "/v1/projects/999", "client-a").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"));
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn project_update_invalidates_cached_reads() {
    let provider = StubProvider::new(MockupBehavior::ReadyOnFirstPoll);
    let relational = StubRelational::new();
    let router = build_router(test_state(
        unlimited_config(),
        relational.clone(),
        provider,
    ));

    // Prime the entity cache
    let (status, body, _) = get(&router, "/v1/projects/7", "client-a").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "summer tee");

    let (_, _, _) = get(&router, "/v1/projects/7", "client-a").await;
    assert_eq!(relational.fetches.load(Ordering::SeqCst), 1);

    // Mutate through the API
    let request = Request::builder()
        .method("PUT")
        .uri("/v1/projects/7")
        .header("content-type", "application/json")
        .body(Body::from(json!({"title": "winter tee"}).to_string()))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The stale cached copy was dropped: the read refetches and sees the change
    let (status, body, _) = get(&router, "/v1/projects/7", "client-a").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "winter tee");
    assert_eq!(relational.fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn disabling_the_cache_sends_every_read_to_the_database() {
    let provider = StubProvider::new(MockupBehavior::ReadyOnFirstPoll);
    let relational = StubRelational::new();
    let mut config = unlimited_config();
    config.cache.enabled = false;
    let router = build_router(test_state(config, relational.clone(), provider));

    let (status, body, _) = get(&router, "/v1/projects/7", "client-a").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "summer tee");

    let (status, _, _) = get(&router, "/v1/projects/7", "client-a").await;
    assert_eq!(status, StatusCode::OK);
    // No read-through caching: both requests reached the relational store
    assert_eq!(relational.fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn malformed_json_bodies_get_a_structured_400() {
    let provider = StubProvider::new(MockupBehavior::ReadyOnFirstPoll);
    let router = build_router(test_state(
        unlimited_config(),
        std::sync::Arc::new(NoDatabase),
        provider,
    ));

    let request = Request::builder()
        .method("POST")
        .uri("/v1/mockups")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The rejection body is JSON like every other failure, never plain text
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].as_str().unwrap().contains("not valid JSON"));
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn user_project_lists_are_scope_cached_and_invalidated() {
    let provider = StubProvider::new(MockupBehavior::ReadyOnFirstPoll);
    let relational = StubRelational::new();
    let router = build_router(test_state(
        unlimited_config(),
        relational.clone(),
        provider,
    ));

    let (status, body, _) = get(&router, "/v1/users/3/projects", "client-a").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let _ = get(&router, "/v1/users/3/projects", "client-a").await;
    assert_eq!(relational.fetches.load(Ordering::SeqCst), 1);

    // Updating the project drops the owner's aggregate list too
    let request = Request::builder()
        .method("PUT")
        .uri("/v1/projects/7")
        .header("content-type", "application/json")
        .body(Body::from(json!({"status": "published"}).to_string()))
        .unwrap();
    router.clone().oneshot(request).await.unwrap();

    let (_, body, _) = get(&router, "/v1/users/3/projects", "client-a").await;
    assert_eq!(body[0]["status"], "published");
    assert_eq!(relational.fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn mockup_generation_timeout_is_408_with_task_key() {
    let provider = StubProvider::new(MockupBehavior::NeverReady);
    let router = build_router(test_state(
        unlimited_config(),
        std::sync::Arc::new(NoDatabase),
        provider.clone(),
    ));

    let request = Request::builder()
        .method("POST")
        .uri("/v1/mockups")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "product_id": 71,
                "variant_id": 4012,
                "image_url": "https://cdn.example/design.png",
                "placement": "front",
            })
            .to_string(),
        ))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["task_id"], "task-stub-1");
    assert_eq!(body["retryable"], true);
    // Exactly the configured poll budget, never more
    assert_eq!(provider.status_calls.load(Ordering::SeqCst), 10);
}

#[tokio::test(start_paused = true)]
async fn mockup_generation_succeeds_when_upstream_completes() {
    let provider = StubProvider::new(MockupBehavior::ReadyOnFirstPoll);
    let router = build_router(test_state(
        unlimited_config(),
        std::sync::Arc::new(NoDatabase),
        provider,
    ));

    let request = Request::builder()
        .method("POST")
        .uri("/v1/mockups")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "product_id": 71,
                "variant_id": 4012,
                "image_url": "https://cdn.example/design.png",
                "placement": "front",
            })
            .to_string(),
        ))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["mockups"][0]["mockup_url"], "https://cdn.example/mockup.jpg");
}

#[tokio::test(start_paused = true)]
async fn requests_past_the_deadline_get_408_with_structured_body() {
    let provider = StubProvider::new(MockupBehavior::NeverReady);
    let mut config = unlimited_config();
    // Budget shorter than a single poll interval, so the deadline fires first
    config.web.request_timeout_ms = 500;
    let router = build_router(test_state(
        config,
        std::sync::Arc::new(NoDatabase),
        provider.clone(),
    ));

    let request = Request::builder()
        .method("POST")
        .uri("/v1/mockups")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "product_id": 71,
                "variant_id": 4012,
                "image_url": "https://cdn.example/design.png",
                "placement": "front",
            })
            .to_string(),
        ))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "request timed out");
    assert!(body["timestamp"].is_string());
    // Unlike a poll-budget timeout there is no task to resume
    assert!(body.get("task_id").is_none());
    // The handler was dropped before its first poll completed
    assert_eq!(provider.status_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn requests_over_the_limit_get_429_with_backoff_headers() {
    let provider = StubProvider::new(MockupBehavior::ReadyOnFirstPoll);
    let router = build_router(test_state(
        config_with_limit(2, 60),
        std::sync::Arc::new(NoDatabase),
        provider,
    ));

    let (status, _, remaining) = get(&router, "/v1/catalog/products/71", "client-a").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(remaining.as_deref(), Some("1"));

    let (status, _, remaining) = get(&router, "/v1/catalog/products/71", "client-a").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(remaining.as_deref(), Some("0"));

    let (status, body, remaining) = get(&router, "/v1/catalog/products/71", "client-a").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(remaining.as_deref(), Some("0"));
    assert!(body["timestamp"].is_string());
    assert_eq!(body["limit"], 2);
}

#[tokio::test]
async fn throttling_one_client_leaves_another_untouched() {
    let provider = StubProvider::new(MockupBehavior::ReadyOnFirstPoll);
    let router = build_router(test_state(
        config_with_limit(1, 60),
        std::sync::Arc::new(NoDatabase),
        provider,
    ));

    // Exhaust client A
    let (status, _, _) = get(&router, "/v1/catalog/products/71", "client-a").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, _) = get(&router, "/v1/catalog/products/71", "client-a").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    // Client B has its own window with the full budget
    let (status, _, remaining) = get(&router, "/v1/catalog/products/71", "client-b").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(remaining.as_deref(), Some("0"));
}
