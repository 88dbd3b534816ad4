//! Meteora Nexus service.
//!
//! Hosts the analytics collection endpoint behind a per-IP sliding-window
//! rate limiter, applies the security headers to every response, and runs
//! the process's own analytics recorder.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};

use analytics::{
    forward_panics, Analytics, AnalyticsConfig, AnalyticsProvider, EventSink, HostEvents,
    HttpSink, NoopSink,
};
use api::middleware::RateLimitConfig;
use api::{router, AppState};
use nexus_core::RuntimeMode;
use telemetry::{health, init_tracing_from_env};

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,

    /// development, production or test
    #[serde(default)]
    environment: RuntimeMode,

    #[serde(default)]
    rate_limit: RateLimitConfig,

    #[serde(default)]
    analytics: AnalyticsConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: RuntimeMode::default(),
            rate_limit: RateLimitConfig::default(),
            analytics: AnalyticsConfig::default(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing_from_env();

    info!("Starting Meteora Nexus v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    validate_config(&config)?;

    info!(
        environment = %config.environment,
        max_requests = config.rate_limit.max_requests,
        window_ms = config.rate_limit.window_ms,
        trust_forwarded_headers = config.rate_limit.trust_forwarded_headers,
        sink_url = config.analytics.sink_url().unwrap_or("<unset>"),
        "Loaded configuration"
    );

    let sink = build_sink(&config).await?;
    health().http.set_healthy();

    let analytics = Arc::new(Analytics::from_config(
        config.environment,
        sink,
        &config.analytics,
    ));

    // Host events: panics are reported as errors, navigation as page views
    let host_events = HostEvents::default();
    forward_panics(host_events.clone());
    let subscription = AnalyticsProvider::attach(analytics.clone(), &host_events);
    analytics.initialize();

    let state = AppState::new(analytics.clone(), config.rate_limit.clone());

    let _rate_limiter_cleanup = state.start_rate_limiter_cleanup();

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    // Peer addresses key the rate limiter when forwarding headers are not trusted
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Shutting down...");

    subscription.unsubscribe();

    let snapshot = telemetry::metrics().snapshot();
    info!(
        events_tracked = snapshot.events_tracked,
        events_collected = snapshot.events_collected,
        rate_limited = snapshot.rate_limited_requests,
        forward_errors = snapshot.forward_errors,
        "Shutdown complete"
    );
    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        // Start with defaults
        .add_source(config::Config::try_from(&Config::default())?)
        // Load from config file if exists
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // Override with environment variables
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("NEXUS")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    // The config crate splits nested keys on `_` inconsistently; read the
    // common overrides directly.
    if let Ok(environment) = std::env::var("NEXUS_ENVIRONMENT") {
        config.environment = environment
            .parse()
            .context("Invalid NEXUS_ENVIRONMENT")?;
    }
    if let Ok(max_requests) = std::env::var("NEXUS_RATE_LIMIT_MAX_REQUESTS") {
        config.rate_limit.max_requests = max_requests
            .parse()
            .context("Invalid NEXUS_RATE_LIMIT_MAX_REQUESTS")?;
    }
    if let Ok(window_ms) = std::env::var("NEXUS_RATE_LIMIT_WINDOW_MS") {
        config.rate_limit.window_ms = window_ms
            .parse()
            .context("Invalid NEXUS_RATE_LIMIT_WINDOW_MS")?;
    }
    if let Ok(trust) = std::env::var("NEXUS_RATE_LIMIT_TRUST_FORWARDED_HEADERS") {
        config.rate_limit.trust_forwarded_headers = trust
            .parse()
            .context("Invalid NEXUS_RATE_LIMIT_TRUST_FORWARDED_HEADERS")?;
    }
    if let Ok(sink_url) = std::env::var("NEXUS_ANALYTICS_SINK_URL") {
        config.analytics.sink_url = Some(sink_url);
    }

    Ok(config)
}

/// Reject configurations the server cannot run with.
fn validate_config(config: &Config) -> Result<()> {
    config
        .rate_limit
        .validate()
        .context("Invalid rate limit configuration")?;

    if config.environment.is_production() && config.analytics.sink_url().is_none() {
        anyhow::bail!(
            "analytics.sink_url must point at an external collector in production \
             (set NEXUS_ANALYTICS_SINK_URL)"
        );
    }

    Ok(())
}

/// Choose the analytics sink. Events only leave the process in production.
async fn build_sink(config: &Config) -> Result<Arc<dyn EventSink>> {
    if !config.environment.is_production() {
        health().sink.set_healthy();
        info!(environment = %config.environment, "Analytics forwarding disabled");
        return Ok(Arc::new(NoopSink));
    }

    let sink = HttpSink::new(&config.analytics).context("Failed to create analytics sink")?;

    if sink.check_connection().await {
        health().sink.set_healthy();
        info!(url = %sink.url(), "Analytics sink: healthy");
    } else {
        // Keep serving; forwarding failures are logged per event
        health().sink.set_unhealthy("Connection failed");
        warn!(url = %sink.url(), "Analytics sink: unreachable");
    }

    Ok(Arc::new(sink))
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
