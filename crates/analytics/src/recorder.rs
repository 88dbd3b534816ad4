//! In-memory analytics recorder.

use nexus_core::{
    AnalyticsEvent, CustomParameters, EnrichedEvent, PerformanceMetrics, RuntimeMode,
};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use telemetry::{health, metrics};
use tokio::runtime::Handle;
use tracing::{debug, error, warn};

use crate::config::AnalyticsConfig;
use crate::sink::EventSink;
use crate::vitals::WebVitalReport;

/// Location and agent stamped onto every recorded event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientContext {
    pub url: String,
    pub user_agent: String,
}

impl ClientContext {
    pub fn new(url: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            user_agent: user_agent.into(),
        }
    }

    /// Path component of the current URL.
    pub fn path(&self) -> String {
        url::Url::parse(&self.url)
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| self.url.clone())
    }
}

/// An error as reported to analytics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub name: String,
    pub message: String,
    pub stack: Option<String>,
}

impl ErrorReport {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: None,
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Name is the error's type name; the source chain, if any, becomes
    /// the stack.
    pub fn from_error<E: std::error::Error>(err: &E) -> Self {
        let type_name = std::any::type_name::<E>();
        let name = type_name.rsplit("::").next().unwrap_or(type_name);

        let mut chain = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            chain.push(format!("caused by: {}", cause));
            source = cause.source();
        }

        Self {
            name: name.to_string(),
            message: err.to_string(),
            stack: (!chain.is_empty()).then(|| chain.join("\n")),
        }
    }
}

/// Records analytics events for the lifetime of the process.
///
/// Events are enriched with the current [`ClientContext`] and a Unix
/// millisecond timestamp, appended to an in-memory log, and forwarded to the
/// sink in production mode. Forwarding is spawned on the current Tokio
/// runtime and never awaited; failures are logged and counted.
pub struct Analytics {
    mode: RuntimeMode,
    sink: Arc<dyn EventSink>,
    context: RwLock<ClientContext>,
    events: Mutex<Vec<EnrichedEvent>>,
    performance: Mutex<PerformanceMetrics>,
    initialized: AtomicBool,
}

impl Analytics {
    pub fn new(mode: RuntimeMode, sink: Arc<dyn EventSink>, context: ClientContext) -> Self {
        Self {
            mode,
            sink,
            context: RwLock::new(context),
            events: Mutex::new(Vec::new()),
            performance: Mutex::new(PerformanceMetrics::default()),
            initialized: AtomicBool::new(false),
        }
    }

    pub fn from_config(
        mode: RuntimeMode,
        sink: Arc<dyn EventSink>,
        config: &AnalyticsConfig,
    ) -> Self {
        Self::new(
            mode,
            sink,
            ClientContext::new(&config.base_url, &config.user_agent),
        )
    }

    pub fn mode(&self) -> RuntimeMode {
        self.mode
    }

    pub fn sink_healthy(&self) -> bool {
        self.sink.is_healthy()
    }

    pub fn context(&self) -> ClientContext {
        self.context.read().clone()
    }

    pub fn set_url(&self, url: impl Into<String>) {
        self.context.write().url = url.into();
    }

    /// Record an event.
    pub fn track_event(&self, event: AnalyticsEvent) {
        let enriched = {
            let context = self.context.read();
            EnrichedEvent {
                event,
                timestamp: chrono::Utc::now().timestamp_millis(),
                url: context.url.clone(),
                user_agent: context.user_agent.clone(),
            }
        };

        debug!(
            name = %enriched.event.name,
            category = %enriched.event.category,
            action = %enriched.event.action,
            "Analytics event tracked"
        );

        self.events.lock().push(enriched.clone());
        metrics().events_tracked.inc();

        if self.mode.is_production() {
            self.forward(enriched);
        }
    }

    fn forward(&self, event: EnrichedEvent) {
        let Ok(handle) = Handle::try_current() else {
            warn!(name = %event.event.name, "No runtime available, analytics event not forwarded");
            return;
        };

        let sink = Arc::clone(&self.sink);
        handle.spawn(async move {
            match sink.send(&event).await {
                Ok(()) => {
                    metrics().events_forwarded.inc();
                    health().sink.set_healthy();
                }
                Err(e) => {
                    metrics().forward_errors.inc();
                    health().sink.set_unhealthy(e.to_string());
                    error!(error = %e, name = %event.event.name, "Failed to send analytics event");
                }
            }
        });
    }

    pub fn track_page_view(&self, page: &str, params: Option<CustomParameters>) {
        self.track_event(
            AnalyticsEvent::new("page_view", "navigation", "view")
                .with_label(page)
                .with_parameters(params),
        );
    }

    pub fn track_user_interaction(&self, element: &str, action: &str, value: Option<f64>) {
        self.track_event(
            AnalyticsEvent::new("user_interaction", "engagement", action)
                .with_label(element)
                .with_value(value),
        );
    }

    /// Context entries are merged after `error_name`/`error_stack` and win on
    /// key collisions.
    pub fn track_error(&self, error: &ErrorReport, context: Option<CustomParameters>) {
        let mut params = CustomParameters::new();
        params.insert("error_name".into(), Value::String(error.name.clone()));
        if let Some(stack) = &error.stack {
            params.insert("error_stack".into(), Value::String(stack.clone()));
        }
        if let Some(context) = context {
            params.extend(context);
        }

        self.track_event(
            AnalyticsEvent::new("error", "error", "occurred")
                .with_label(error.message.as_str())
                .with_parameters(Some(params)),
        );
    }

    pub fn track_wallet_connection(&self, wallet: &str, success: bool) {
        let action = if success { "connected" } else { "failed" };
        self.track_event(
            AnalyticsEvent::new("wallet_connection", "wallet", action).with_label(wallet),
        );
    }

    pub fn track_pool_interaction(&self, pool: &str, action: &str) {
        self.track_event(AnalyticsEvent::new("pool_interaction", "pools", action).with_label(pool));
    }

    pub fn track_analytics_filter(&self, filter: &str, value: &str) {
        self.track_event(
            AnalyticsEvent::new("analytics_filter", "analytics", "filter_applied")
                .with_label(format!("{}: {}", filter, value)),
        );
    }

    pub fn track_strategy_interaction(&self, strategy: &str, action: &str) {
        self.track_event(
            AnalyticsEvent::new("strategy_interaction", "strategies", action)
                .with_label(strategy),
        );
    }

    /// Store a web-vitals report and track it as a `web_vital` event.
    pub fn handle_web_vital(&self, report: &WebVitalReport) {
        self.performance.lock().set(report.metric, report.value);
        metrics().web_vitals_reported.inc();

        let mut params = CustomParameters::new();
        params.insert("metric_id".into(), Value::String(report.id.clone()));
        params.insert(
            "metric_name".into(),
            Value::String(report.metric.label().to_string()),
        );
        params.insert("metric_value".into(), serde_json::json!(report.value));
        params.insert(
            "metric_rating".into(),
            Value::String(report.rating.as_str().to_string()),
        );
        params.insert(
            "navigation_type".into(),
            Value::String(report.navigation_type.clone()),
        );

        let rounded = (report.value * 1000.0).round() / 1000.0;
        self.track_event(
            AnalyticsEvent::new("web_vital", "performance", report.metric.label())
                .with_value(Some(rounded))
                .with_parameters(Some(params)),
        );
    }

    /// Track a page view for the new location and remember it.
    pub fn navigate(&self, url: impl Into<String>) {
        self.set_url(url);
        let path = self.context.read().path();
        self.track_page_view(&path, None);
    }

    /// Track the initial page view. Later calls do nothing.
    pub fn initialize(&self) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return;
        }
        let path = self.context.read().path();
        self.track_page_view(&path, None);
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn performance_metrics(&self) -> PerformanceMetrics {
        self.performance.lock().clone()
    }

    pub fn events(&self) -> Vec<EnrichedEvent> {
        self.events.lock().clone()
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().len()
    }

    pub fn clear_events(&self) {
        self.events.lock().clear();
    }

    /// Return to the freshly constructed state.
    pub fn reset(&self) {
        self.clear_events();
        *self.performance.lock() = PerformanceMetrics::default();
        self.initialized.store(false, Ordering::SeqCst);
    }
}
