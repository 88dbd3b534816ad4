//! Application state shared across handlers.

use analytics::Analytics;
use nexus_core::limits::MAX_COLLECTED_EVENTS;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::buffer::EventBuffer;
use crate::middleware::rate_limit::{Clock, RateLimitConfig, RateLimiter, SharedRateLimiter};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Recorder for events produced by this process
    pub analytics: Arc<Analytics>,
    /// Per-IP limiter guarding the collection endpoint
    pub rate_limiter: SharedRateLimiter,
    /// Events received from clients
    pub collected: Arc<EventBuffer>,
}

impl AppState {
    pub fn new(analytics: Arc<Analytics>, rate_config: RateLimitConfig) -> Self {
        Self {
            analytics,
            rate_limiter: Arc::new(RateLimiter::new(rate_config)),
            collected: Arc::new(EventBuffer::new(MAX_COLLECTED_EVENTS)),
        }
    }

    /// Create with an explicit clock for the rate limiter.
    pub fn with_clock(
        analytics: Arc<Analytics>,
        rate_config: RateLimitConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            analytics,
            rate_limiter: Arc::new(RateLimiter::with_clock(rate_config, clock)),
            collected: Arc::new(EventBuffer::new(MAX_COLLECTED_EVENTS)),
        }
    }

    /// Start the rate limiter cleanup background task.
    /// Returns a handle that can be used to cancel the task.
    pub fn start_rate_limiter_cleanup(&self) -> tokio::task::JoinHandle<()> {
        let rate_limiter = self.rate_limiter.clone();
        let period = Duration::from_secs(rate_limiter.config().cleanup_interval_secs.max(1));
        info!(interval_secs = period.as_secs(), "Starting rate limiter cleanup task");

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // First tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                rate_limiter.cleanup();
            }
        })
    }
}
