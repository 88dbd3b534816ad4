//! Mock implementations for testing.

use analytics::EventSink;
use async_trait::async_trait;
use nexus_core::error::SinkErrorCode;
use nexus_core::{EnrichedEvent, Error, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Sink that captures forwarded events in memory.
///
/// Implements the same `EventSink` trait as the HTTP sink, so tests see
/// exactly what would have been posted to the collection endpoint.
#[derive(Clone)]
pub struct MockSink {
    events: Arc<Mutex<Vec<EnrichedEvent>>>,
    should_fail: Arc<Mutex<bool>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            should_fail: Arc::new(Mutex::new(false)),
        }
    }

    /// Get all captured events.
    pub fn captured_events(&self) -> Vec<EnrichedEvent> {
        self.events.lock().clone()
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().len()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    /// Set failure mode for testing error handling.
    pub fn set_should_fail(&self, fail: bool) {
        *self.should_fail.lock() = fail;
    }

    /// Wait until at least `count` events were captured. Forwarding runs on
    /// spawned tasks, so captures lag behind `track_event`.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if self.event_count() >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        self.event_count() >= count
    }
}

impl Default for MockSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventSink for MockSink {
    async fn send(&self, event: &EnrichedEvent) -> Result<()> {
        if *self.should_fail.lock() {
            return Err(Error::sink(SinkErrorCode::ForwardFailed, "Mock sink failure"));
        }

        self.events.lock().push(event.clone());
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        !*self.should_fail.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_core::AnalyticsEvent;

    fn event() -> EnrichedEvent {
        EnrichedEvent {
            event: AnalyticsEvent::new("page_view", "navigation", "view"),
            timestamp: 0,
            url: "https://nexus.example/".into(),
            user_agent: "test".into(),
        }
    }

    #[tokio::test]
    async fn test_mock_sink_captures() {
        let sink = MockSink::new();
        sink.send(&event()).await.unwrap();
        assert_eq!(sink.event_count(), 1);

        sink.clear();
        assert_eq!(sink.event_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_sink_failure() {
        let sink = MockSink::new();
        sink.set_should_fail(true);

        let err = sink.send(&event()).await.unwrap_err();
        assert_eq!(err.error_code(), Some("SINK_001"));
        assert!(!sink.is_healthy());
        assert_eq!(sink.event_count(), 0);
    }
}
