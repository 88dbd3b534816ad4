//! Test fixtures and event generators.

use chrono::Utc;
use serde_json::{json, Value};

/// A valid enriched event as the recorder's HTTP sink posts it.
pub fn analytics_event(name: &str) -> Value {
    json!({
        "name": name,
        "category": "pools",
        "action": "deposit",
        "label": "SOL-USDC",
        "value": 125.5,
        "customParameters": { "bin_step": 20 },
        "timestamp": Utc::now().timestamp_millis(),
        "url": "https://nexus.example/pools/sol-usdc",
        "userAgent": "Mozilla/5.0 (Test)"
    })
}

/// The same event with one field replaced.
pub fn event_with(field: &str, value: Value) -> Value {
    let mut event = analytics_event("pool_interaction");
    event[field] = value;
    event
}

/// The same event with one field removed.
pub fn event_without(field: &str) -> Value {
    let mut event = analytics_event("pool_interaction");
    if let Some(obj) = event.as_object_mut() {
        obj.remove(field);
    }
    event
}

/// Serialize a fixture as a request body.
pub fn payload(event: &Value) -> String {
    event.to_string()
}

/// An event larger than the 32KB request limit.
pub fn oversized_event() -> Value {
    event_with(
        "customParameters",
        json!({ "blob": "x".repeat(40_000) }),
    )
}

/// An event under the request limit whose parameters exceed 16KB.
pub fn oversized_parameters_event() -> Value {
    event_with(
        "customParameters",
        json!({ "blob": "x".repeat(20_000) }),
    )
}
