//! Tests for the analytics collection endpoints.

use axum::http::StatusCode;
use integration_tests::{fixtures, setup::TestContext};
use serde_json::{json, Value};
use std::time::Duration;

/// A valid event is accepted and can be read back
#[tokio::test]
async fn test_track_accepts_valid_event() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let event = fixtures::analytics_event("pool_interaction");
    let response = server
        .post("/api/analytics/track")
        .content_type("application/json")
        .bytes(fixtures::payload(&event).into())
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert!(body["timestamp"].as_i64().unwrap() > 0);

    let response = server.get("/api/analytics/events").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["count"], 1);
    assert_eq!(body["events"][0]["name"], "pool_interaction");
    assert_eq!(body["events"][0]["userAgent"], "Mozilla/5.0 (Test)");
    assert_eq!(body["events"][0]["customParameters"]["bin_step"], 20);
}

/// Labels are sanitized before they are stored
#[tokio::test]
async fn test_track_sanitizes_label() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let event = fixtures::event_with("label", json!("  <script>SOL-USDC</script> "));
    server
        .post("/api/analytics/track")
        .content_type("application/json")
        .bytes(fixtures::payload(&event).into())
        .await
        .assert_status_ok();

    let stored = ctx.state.collected.recent(1);
    assert_eq!(stored[0].event.label.as_deref(), Some("scriptSOL-USDC/script"));
}

/// Malformed JSON returns VALID_001
#[tokio::test]
async fn test_invalid_json_returns_400() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server
        .post("/api/analytics/track")
        .content_type("application/json")
        .bytes("{not json".into())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALID_001");
}

/// Missing required fields return VALID_001
#[tokio::test]
async fn test_missing_field_returns_400() {
    let ctx = TestContext::new();
    let server = ctx.server();

    for field in ["name", "category", "action", "timestamp", "url", "userAgent"] {
        let event = fixtures::event_without(field);
        let response = server
            .post("/api/analytics/track")
            .content_type("application/json")
            .bytes(fixtures::payload(&event).into())
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["code"], "VALID_001", "missing {field}");
    }

    assert!(ctx.state.collected.is_empty());
}

/// Field constraints are enforced
#[tokio::test]
async fn test_field_validation_returns_400() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let invalid = [
        fixtures::event_with("name", json!("")),
        fixtures::event_with("action", json!("x".repeat(101))),
        fixtures::event_with("label", json!("x".repeat(501))),
        fixtures::event_with("value", json!(1e20)),
        fixtures::event_with("value", json!("12")),
        fixtures::event_with("timestamp", json!(-1)),
        fixtures::oversized_parameters_event(),
    ];

    for event in invalid {
        let response = server
            .post("/api/analytics/track")
            .content_type("application/json")
            .bytes(fixtures::payload(&event).into())
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["code"], "VALID_001");
    }

    assert!(ctx.state.collected.is_empty());
}

/// Payloads over the size limit return VALID_002
#[tokio::test]
async fn test_oversized_payload_returns_413() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server
        .post("/api/analytics/track")
        .content_type("application/json")
        .bytes(fixtures::payload(&fixtures::oversized_event()).into())
        .await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALID_002");
}

/// The events listing honours its limit and returns the newest events
#[tokio::test]
async fn test_events_limit() {
    let ctx = TestContext::new();
    let server = ctx.server();

    for name in ["first", "second", "third"] {
        server
            .post("/api/analytics/track")
            .content_type("application/json")
            .bytes(fixtures::payload(&fixtures::analytics_event(name)).into())
            .await
            .assert_status_ok();
    }

    let body: Value = server.get("/api/analytics/events?limit=2").await.json();
    assert_eq!(body["count"], 2);
    assert_eq!(body["events"][0]["name"], "second");
    assert_eq!(body["events"][1]["name"], "third");
}

/// Events forwarded by the recorder are accepted by the collection endpoint
#[tokio::test]
async fn test_recorder_payload_round_trips_through_endpoint() {
    let ctx = TestContext::new();
    let server = ctx.server();

    ctx.analytics.track_pool_interaction("SOL-USDC", "deposit");
    ctx.analytics.track_user_interaction("swap-button", "click", Some(2.0));
    assert!(ctx.mock_sink.wait_for(2, Duration::from_secs(1)).await);

    for event in ctx.mock_sink.captured_events() {
        server
            .post("/api/analytics/track")
            .content_type("application/json")
            .json(&event)
            .await
            .assert_status_ok();
    }

    let collected = ctx.state.collected.recent(10);
    let recorded = ctx.analytics.events();
    assert_eq!(collected.len(), recorded.len());
    for event in &recorded {
        assert!(collected.contains(event), "{} not collected", event.event.name);
    }
}

/// A failing sink does not affect recording
#[tokio::test]
async fn test_sink_failure_is_not_propagated() {
    let ctx = TestContext::new();
    ctx.mock_sink.set_should_fail(true);

    ctx.analytics.track_wallet_connection("Phantom", true);
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(ctx.analytics.event_count(), 1);
    assert_eq!(ctx.mock_sink.event_count(), 0);
    ctx.mock_sink.set_should_fail(false);
}

/// Collection responses carry the security headers
#[tokio::test]
async fn test_collect_response_has_security_headers() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server
        .post("/api/analytics/track")
        .content_type("application/json")
        .bytes(fixtures::payload(&fixtures::analytics_event("page_view")).into())
        .await;

    response.assert_status_ok();
    assert_eq!(response.header("x-frame-options"), "DENY");
    assert_eq!(response.header("x-content-type-options"), "nosniff");
    assert_eq!(
        response.header("strict-transport-security"),
        "max-age=63072000; includeSubDomains; preload"
    );
}
