//! Tests for health check endpoints.

use axum::http::StatusCode;
use integration_tests::{fixtures, setup::TestContext};
use serde_json::Value;

/// /health returns the expected structure
#[tokio::test]
async fn test_health_endpoint_structure() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server.get("/health").await;
    response.assert_status_ok();

    let body: Value = response.json();
    for field in ["status", "sink_connected", "tracked_clients", "collected_events"] {
        assert!(body.get(field).is_some(), "Response should have '{field}' field");
    }
}

/// With a healthy sink the service reports healthy
#[tokio::test]
async fn test_health_endpoint_healthy() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let body: Value = server.get("/health").await.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["sink_connected"], true);
}

/// Counts reflect collected events and tracked clients
#[tokio::test]
async fn test_health_counts() {
    let ctx = TestContext::new();
    let server = ctx.server();

    server
        .post("/api/analytics/track")
        .content_type("application/json")
        .bytes(fixtures::payload(&fixtures::analytics_event("page_view")).into())
        .await
        .assert_status_ok();

    let body: Value = server.get("/health").await.json();
    assert_eq!(body["collected_events"], 1);
    assert_eq!(body["tracked_clients"], 1);
}

#[tokio::test]
async fn test_ready_endpoint() {
    let ctx = TestContext::new();
    let server = ctx.server();

    server.get("/health/ready").await.assert_status_ok();
}

/// /health/live always returns 200 when the service is running
#[tokio::test]
async fn test_live_endpoint() {
    let ctx = TestContext::new();
    let server = ctx.server();

    server.get("/health/live").await.assert_status_ok();
}

/// Security headers are applied to every response, including unknown routes
#[tokio::test]
async fn test_security_headers_everywhere() {
    let ctx = TestContext::new();
    let server = ctx.server();

    for path in ["/health", "/health/live", "/does-not-exist"] {
        let response = server.get(path).await;
        for header in nexus_core::SECURITY_HEADERS {
            assert_eq!(
                response.header(header.name),
                header.value,
                "{} missing on {}",
                header.name,
                path
            );
        }
    }

    let response = server.get("/does-not-exist").await;
    response.assert_status(StatusCode::NOT_FOUND);
}

/// /metrics exposes the in-process counters
#[tokio::test]
async fn test_metrics_endpoint() {
    let ctx = TestContext::new();
    let server = ctx.server();

    server
        .post("/api/analytics/track")
        .content_type("application/json")
        .bytes(fixtures::payload(&fixtures::analytics_event("page_view")).into())
        .await
        .assert_status_ok();

    let response = server.get("/metrics").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["events_collected"].as_u64().unwrap() >= 1);
    assert!(body.get("rate_limited_requests").is_some());
    assert!(body.get("timestamp").is_some());
    assert_eq!(body["collect_latency_buckets"].as_array().map(Vec::len), Some(11));
}
