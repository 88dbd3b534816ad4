//! Tests for per-IP rate limiting of the collection endpoint.
//!
//! The in-process transport carries no peer address, so client identity
//! comes from forwarding headers with the limiter configured as proxied.

use api::middleware::RateLimitConfig;
use axum::http::StatusCode;
use axum_test::{TestResponse, TestServer};
use integration_tests::{fixtures, setup::TestContext};
use serde_json::Value;
use std::time::Duration;

async fn track_from(server: &TestServer, ip: &str) -> TestResponse {
    server
        .post("/api/analytics/track")
        .content_type("application/json")
        .add_header("X-Forwarded-For", ip)
        .bytes(fixtures::payload(&fixtures::analytics_event("page_view")).into())
        .await
}

/// Requests over the limit get RATE_001 with Retry-After
#[tokio::test]
async fn test_limit_returns_429() {
    let ctx = TestContext::with_rate_limit(RateLimitConfig::new(2, 60_000).behind_proxy());
    let server = ctx.server();

    track_from(&server, "203.0.113.1").await.assert_status_ok();
    track_from(&server, "203.0.113.1").await.assert_status_ok();

    let response = track_from(&server, "203.0.113.1").await;
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    let body: Value = response.json();
    assert_eq!(body["code"], "RATE_001");
    assert_eq!(response.header("retry-after"), "60");

    // Rejected requests are not collected
    assert_eq!(ctx.state.collected.len(), 2);
}

/// Each client IP has its own window
#[tokio::test]
async fn test_clients_are_independent() {
    let ctx = TestContext::with_rate_limit(RateLimitConfig::new(1, 60_000).behind_proxy());
    let server = ctx.server();

    track_from(&server, "203.0.113.1").await.assert_status_ok();
    track_from(&server, "203.0.113.1")
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);

    track_from(&server, "203.0.113.2").await.assert_status_ok();
    assert_eq!(ctx.state.rate_limiter.tracked_keys(), 2);
}

/// Quota returns once the window has passed
#[tokio::test]
async fn test_window_expiry_restores_quota() {
    let ctx = TestContext::with_rate_limit(RateLimitConfig::new(2, 60_000).behind_proxy());
    let server = ctx.server();

    track_from(&server, "203.0.113.1").await.assert_status_ok();
    track_from(&server, "203.0.113.1").await.assert_status_ok();
    track_from(&server, "203.0.113.1")
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);

    ctx.advance(Duration::from_millis(59_999));
    track_from(&server, "203.0.113.1")
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);

    ctx.advance(Duration::from_millis(1));
    track_from(&server, "203.0.113.1").await.assert_status_ok();
}

/// Rejected requests do not push the window forward
#[tokio::test]
async fn test_rejected_requests_not_spent() {
    let ctx = TestContext::with_rate_limit(RateLimitConfig::new(1, 10_000).behind_proxy());
    let server = ctx.server();

    track_from(&server, "203.0.113.1").await.assert_status_ok();

    for _ in 0..5 {
        ctx.advance(Duration::from_millis(1_000));
        let response = track_from(&server, "203.0.113.1").await;
        response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    }

    // 5s in, the only admitted request expires 5s from now
    let response = track_from(&server, "203.0.113.1").await;
    assert_eq!(response.header("retry-after"), "5");

    ctx.advance(Duration::from_millis(5_000));
    track_from(&server, "203.0.113.1").await.assert_status_ok();
}

/// Reset clears a client's window immediately
#[tokio::test]
async fn test_reset_restores_quota() {
    let ctx = TestContext::with_rate_limit(RateLimitConfig::new(1, 60_000).behind_proxy());
    let server = ctx.server();

    track_from(&server, "203.0.113.1").await.assert_status_ok();
    track_from(&server, "203.0.113.1")
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);

    ctx.state.rate_limiter.reset("203.0.113.1");
    track_from(&server, "203.0.113.1").await.assert_status_ok();
}

/// Forwarding headers are ignored unless the limiter runs behind a proxy,
/// so rotating them does not buy a client fresh quota
#[tokio::test]
async fn test_untrusted_forwarded_headers_ignored() {
    let ctx = TestContext::with_rate_limit(RateLimitConfig::new(1, 60_000));
    let server = ctx.server();

    track_from(&server, "203.0.113.1").await.assert_status_ok();
    track_from(&server, "203.0.113.2")
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert!(ctx.state.rate_limiter.retry_after("203.0.113.1").is_none());
}

/// Health probes are not rate limited
#[tokio::test]
async fn test_health_not_rate_limited() {
    let ctx = TestContext::with_rate_limit(RateLimitConfig::new(1, 60_000).behind_proxy());
    let server = ctx.server();

    for _ in 0..5 {
        server
            .get("/health/live")
            .add_header("X-Forwarded-For", "203.0.113.1")
            .await
            .assert_status_ok();
    }
    assert_eq!(ctx.state.rate_limiter.tracked_keys(), 0);
}

/// Rate limited responses still carry the security headers
#[tokio::test]
async fn test_429_has_security_headers() {
    let ctx = TestContext::with_rate_limit(RateLimitConfig::new(1, 60_000).behind_proxy());
    let server = ctx.server();

    track_from(&server, "203.0.113.1").await.assert_status_ok();
    let response = track_from(&server, "203.0.113.1").await;

    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.header("x-frame-options"), "DENY");
    assert_eq!(
        response.header("permissions-policy"),
        "camera=(), microphone=(), geolocation=()"
    );
}
