//! Analytics collection endpoints.
//!
//! `POST /api/analytics/track` accepts one enriched event as posted by the
//! recorder's HTTP sink: `{name, category, action, label?, value?,
//! customParameters?, timestamp, url, userAgent}`.

use axum::{
    body::Bytes,
    extract::{Query, State},
    Json,
};
use nexus_core::{
    error::ValidationErrorCode, limits::MAX_EVENT_SIZE_BYTES, sanitize_input,
    validate_enriched_event, EnrichedEvent, Error,
};
use serde::Deserialize;
use std::time::Instant;
use telemetry::metrics;
use tracing::{debug, warn};

use crate::extractors::ClientIp;
use crate::response::{ApiError, CollectResponse, EventsResponse};
use crate::state::AppState;

const DEFAULT_EVENTS_LIMIT: usize = 100;
const MAX_EVENTS_LIMIT: usize = 1000;

/// POST /api/analytics/track - Collect a single analytics event.
pub async fn track_handler(
    State(state): State<AppState>,
    client_ip: ClientIp,
    body: Bytes,
) -> Result<Json<CollectResponse>, ApiError> {
    let start = Instant::now();

    if body.len() > MAX_EVENT_SIZE_BYTES {
        metrics().events_rejected.inc();
        return Err(Error::validation_code(
            ValidationErrorCode::PayloadTooLarge,
            format!(
                "Payload size {}KB exceeds {}KB limit",
                body.len() / 1024,
                MAX_EVENT_SIZE_BYTES / 1024
            ),
        )
        .into());
    }

    let mut event: EnrichedEvent = serde_json::from_slice(&body).map_err(|e| {
        metrics().events_rejected.inc();
        warn!(error = %e, "Failed to parse analytics event");
        ApiError::bad_request(format!("Invalid JSON: {}", e))
    })?;

    if let Err(e) = validate_enriched_event(&event) {
        metrics().events_rejected.inc();
        warn!(error = %e, name = %event.event.name, "Analytics event failed validation");
        return Err(e.into());
    }

    event.event.label = event.event.label.as_deref().map(sanitize_input);

    let client = client_ip.resolve(state.rate_limiter.config().trust_forwarded_headers);
    debug!(
        client_ip = client.as_deref().unwrap_or("unknown"),
        name = %event.event.name,
        category = %event.event.category,
        action = %event.event.action,
        "Collected analytics event"
    );

    state.collected.push(event);
    metrics().events_collected.inc();
    metrics()
        .collect_latency_ms
        .observe(start.elapsed().as_millis() as u64);

    Ok(Json(CollectResponse::success()))
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub limit: Option<usize>,
}

/// GET /api/analytics/events - Most recently collected events, oldest first.
pub async fn events_handler(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Json<EventsResponse> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_EVENTS_LIMIT)
        .min(MAX_EVENTS_LIMIT);
    let events = state.collected.recent(limit);

    Json(EventsResponse {
        count: events.len(),
        events,
    })
}
