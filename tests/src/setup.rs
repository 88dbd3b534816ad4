//! Common test setup functions.

use analytics::{Analytics, ClientContext, EventSink};
use api::middleware::rate_limit::{Clock, ManualClock, RateLimitConfig};
use api::{router, state::AppState};
use axum::Router;
use axum_test::TestServer;
use nexus_core::RuntimeMode;
use std::sync::Arc;
use std::time::Duration;
use telemetry::health;

use crate::mocks::MockSink;

/// Test context around the real router.
///
/// - The real Axum router with all middleware
/// - A production-mode recorder forwarding into a `MockSink`
/// - A `ManualClock` driving the rate limiter, so windows can be skipped
pub struct TestContext {
    pub analytics: Arc<Analytics>,
    pub mock_sink: Arc<MockSink>,
    pub clock: Arc<ManualClock>,
    pub state: AppState,
    pub router: Router,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_rate_limit(RateLimitConfig::default())
    }

    pub fn with_rate_limit(config: RateLimitConfig) -> Self {
        health().http.set_healthy();
        health().sink.set_healthy();

        let mock_sink = Arc::new(MockSink::new());
        let analytics = Arc::new(Analytics::new(
            RuntimeMode::Production,
            mock_sink.clone() as Arc<dyn EventSink>,
            ClientContext::new("https://nexus.example/", "Mozilla/5.0 (Test)"),
        ));

        let clock = Arc::new(ManualClock::new(0));
        let state = AppState::with_clock(
            analytics.clone(),
            config,
            clock.clone() as Arc<dyn Clock>,
        );
        let router = router(state.clone());

        Self {
            analytics,
            mock_sink,
            clock,
            state,
            router,
        }
    }

    pub fn server(&self) -> TestServer {
        TestServer::new(self.router.clone()).expect("Failed to create test server")
    }

    /// Move the rate limiter's clock forward.
    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
