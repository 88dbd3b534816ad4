//! Destinations for enriched analytics events.

use async_trait::async_trait;
use nexus_core::error::SinkErrorCode;
use nexus_core::{EnrichedEvent, Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use telemetry::metrics;
use tracing::{debug, warn};

use crate::config::AnalyticsConfig;

/// Receiver of forwarded events.
///
/// The recorder holds an `Arc<dyn EventSink>`, so tests can swap the HTTP
/// sink for an in-memory one.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Deliver a single event.
    async fn send(&self, event: &EnrichedEvent) -> Result<()>;

    /// Whether the last delivery succeeded.
    fn is_healthy(&self) -> bool {
        true
    }
}

/// Posts events as JSON to a collection endpoint.
pub struct HttpSink {
    url: String,
    http_client: reqwest::Client,
    healthy: AtomicBool,
}

impl HttpSink {
    /// Fails with a config error when no sink URL is configured.
    pub fn new(config: &AnalyticsConfig) -> Result<Self> {
        let url = config
            .sink_url()
            .ok_or_else(|| Error::config("analytics.sink_url is required to forward events"))?
            .to_string();

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            url,
            http_client,
            healthy: AtomicBool::new(true),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Probe the collection endpoint. Any HTTP response counts as reachable.
    pub async fn check_connection(&self) -> bool {
        match self.http_client.head(&self.url).send().await {
            Ok(response) => {
                debug!(status = %response.status(), url = %self.url, "Analytics sink reachable");
                true
            }
            Err(e) => {
                warn!(error = %e, url = %self.url, "Analytics sink unreachable");
                false
            }
        }
    }

    fn fail(&self, msg: String) -> Error {
        self.healthy.store(false, Ordering::Relaxed);
        Error::sink(SinkErrorCode::ForwardFailed, msg)
    }
}

#[async_trait]
impl EventSink for HttpSink {
    async fn send(&self, event: &EnrichedEvent) -> Result<()> {
        let start = Instant::now();

        let response = self
            .http_client
            .post(&self.url)
            .json(event)
            .send()
            .await
            .map_err(|e| self.fail(format!("Failed to reach {}: {}", self.url, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(self.fail(format!("Sink returned {}: {}", status, body)));
        }

        self.healthy.store(true, Ordering::Relaxed);
        metrics()
            .forward_latency_ms
            .observe(start.elapsed().as_millis() as u64);

        Ok(())
    }

    fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

#[async_trait]
impl EventSink for NoopSink {
    async fn send(&self, _event: &EnrichedEvent) -> Result<()> {
        Ok(())
    }
}
