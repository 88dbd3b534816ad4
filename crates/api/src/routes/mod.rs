//! API routes.

pub mod collect;
pub mod health;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::middleware::{apply_security_headers, enforce_rate_limit};
use crate::state::AppState;

/// Creates the API router.
///
/// Only the analytics routes are rate limited; health probes and metrics
/// are not.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let analytics_routes = Router::new()
        .route("/api/analytics/track", post(collect::track_handler))
        .route("/api/analytics/events", get(collect::events_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            enforce_rate_limit,
        ));

    Router::new()
        .merge(analytics_routes)
        .route("/health", get(health::health_handler))
        .route("/health/ready", get(health::ready_handler))
        .route("/health/live", get(health::live_handler))
        .route("/metrics", get(health::metrics_handler))
        .layer(middleware::from_fn(apply_security_headers))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
