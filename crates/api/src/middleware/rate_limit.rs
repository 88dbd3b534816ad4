//! Sliding-window rate limiting.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use telemetry::metrics;
use tracing::{debug, warn};

use crate::extractors::ClientIp;
use crate::response::ApiError;
use crate::state::AppState;

/// Source of monotonic milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Milliseconds since the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Clock moved by hand, for tests.
#[derive(Debug, Default)]
pub struct ManualClock(AtomicU64);

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self(AtomicU64::new(start_ms))
    }

    pub fn advance(&self, by: Duration) {
        self.0.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set(&self, ms: u64) {
        self.0.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests allowed per window
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    /// Window length in milliseconds
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
    /// New keys seen before an opportunistic cleanup
    #[serde(default = "default_cleanup_after_keys")]
    pub cleanup_after_keys: usize,
    /// Interval of the background cleanup task
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
    /// Key clients by `X-Forwarded-For`/`X-Real-IP` instead of the peer
    /// address. Only enable behind a proxy that overwrites those headers.
    #[serde(default)]
    pub trust_forwarded_headers: bool,
}

fn default_max_requests() -> u32 {
    100
}

fn default_window_ms() -> u64 {
    60_000
}

fn default_cleanup_after_keys() -> usize {
    1000
}

fn default_cleanup_interval_secs() -> u64 {
    300
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_ms: default_window_ms(),
            cleanup_after_keys: default_cleanup_after_keys(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
            trust_forwarded_headers: false,
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window_ms: u64) -> Self {
        Self {
            max_requests,
            window_ms,
            ..Self::default()
        }
    }

    /// Key clients by the forwarding headers a fronting proxy sets.
    pub fn behind_proxy(mut self) -> Self {
        self.trust_forwarded_headers = true;
        self
    }

    pub fn validate(&self) -> nexus_core::Result<()> {
        if self.max_requests == 0 {
            return Err(nexus_core::Error::config("rate_limit.max_requests must be > 0"));
        }
        if self.window_ms == 0 {
            return Err(nexus_core::Error::config("rate_limit.window_ms must be > 0"));
        }
        Ok(())
    }
}

#[derive(Default)]
struct Windows {
    requests: HashMap<String, VecDeque<u64>>,
    /// Keys inserted since the last cleanup
    new_keys: usize,
}

/// Per-key sliding-window rate limiter.
///
/// Each key keeps the timestamps of its admitted requests. A timestamp
/// leaves the window once `now - t >= window_ms`. Rejected requests are not
/// recorded, so they never use up quota.
pub struct RateLimiter {
    windows: Mutex<Windows>,
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: Mutex::new(Windows::default()),
            config,
            clock,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Admit a request for `key` if it has quota left in the current window.
    pub fn is_allowed(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        let window_ms = self.config.window_ms;
        let mut windows = self.windows.lock();

        let allowed = match windows.requests.get_mut(key) {
            Some(timestamps) => {
                prune(timestamps, now, window_ms);
                if timestamps.len() >= self.config.max_requests as usize {
                    false
                } else {
                    timestamps.push_back(now);
                    true
                }
            }
            None => {
                if self.config.max_requests == 0 {
                    return false;
                }
                windows.requests.insert(key.to_string(), VecDeque::from([now]));
                windows.new_keys += 1;
                metrics().tracked_clients.set(windows.requests.len() as u64);
                true
            }
        };

        if windows.new_keys >= self.config.cleanup_after_keys {
            self.cleanup_locked(&mut windows, now);
        }

        allowed
    }

    /// Forget `key`, restoring its full quota.
    pub fn reset(&self, key: &str) {
        let mut windows = self.windows.lock();
        windows.requests.remove(key);
        metrics().tracked_clients.set(windows.requests.len() as u64);
    }

    /// Drop expired timestamps for every key and remove keys left empty.
    pub fn cleanup(&self) {
        let now = self.clock.now_ms();
        let mut windows = self.windows.lock();
        self.cleanup_locked(&mut windows, now);
    }

    fn cleanup_locked(&self, windows: &mut Windows, now: u64) {
        let window_ms = self.config.window_ms;
        let before = windows.requests.len();

        windows.requests.retain(|_, timestamps| {
            prune(timestamps, now, window_ms);
            !timestamps.is_empty()
        });
        windows.new_keys = 0;

        let after = windows.requests.len();
        metrics().rate_limiter_cleanups.inc();
        metrics().tracked_clients.set(after as u64);
        debug!(removed = before - after, remaining = after, "Rate limiter cleanup");
    }

    /// Time until `key` regains a slot, `None` if it has one now.
    pub fn retry_after(&self, key: &str) -> Option<Duration> {
        let now = self.clock.now_ms();
        let window_ms = self.config.window_ms;
        let windows = self.windows.lock();

        let timestamps = windows.requests.get(key)?;
        let live: Vec<u64> = timestamps
            .iter()
            .copied()
            .filter(|t| now.saturating_sub(*t) < window_ms)
            .collect();

        if live.len() < self.config.max_requests as usize {
            return None;
        }

        // The slot frees when the oldest request that keeps the key at its
        // limit expires.
        let idx = live.len() - self.config.max_requests as usize;
        let expires_at = live.get(idx)? + window_ms;
        Some(Duration::from_millis(expires_at.saturating_sub(now)))
    }

    /// Number of keys currently stored.
    pub fn tracked_keys(&self) -> usize {
        self.windows.lock().requests.len()
    }
}

fn prune(timestamps: &mut VecDeque<u64>, now: u64, window_ms: u64) {
    while let Some(&oldest) = timestamps.front() {
        if now.saturating_sub(oldest) >= window_ms {
            timestamps.pop_front();
        } else {
            break;
        }
    }
}

/// Shared rate limiter state.
pub type SharedRateLimiter = Arc<RateLimiter>;

/// Whole seconds for a `Retry-After` header, at least 1.
pub fn retry_after_secs(wait: Duration) -> u64 {
    let ms = wait.as_millis() as u64;
    ms.div_ceil(1000).max(1)
}

/// Reject requests from clients over their quota with `429 RATE_001`.
///
/// Clients are keyed by peer address, or by the forwarded client address
/// when the limiter trusts forwarding headers. Requests with neither share
/// the `unknown` key.
pub async fn enforce_rate_limit(
    State(state): State<AppState>,
    client_ip: ClientIp,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let key = client_ip
        .resolve(state.rate_limiter.config().trust_forwarded_headers)
        .unwrap_or_else(|| "unknown".to_string());

    if state.rate_limiter.is_allowed(&key) {
        return Ok(next.run(request).await);
    }

    metrics().rate_limited_requests.inc();
    let retry_after = state
        .rate_limiter
        .retry_after(&key)
        .map(retry_after_secs)
        .unwrap_or(1);

    warn!(client = %key, retry_after, "Rate limit exceeded");

    Err(ApiError::rate_limited(
        "Too many requests, please try again later",
        Some(retry_after),
    ))
}
