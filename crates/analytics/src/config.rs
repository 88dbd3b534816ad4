//! Analytics sink configuration.

use serde::{Deserialize, Serialize};

/// Where and how enriched events are forwarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Collection endpoint events are posted to. Must point at an external
    /// collector; production startup fails while it is unset.
    #[serde(default)]
    pub sink_url: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// User agent recorded on events produced by this process
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Location the recorder reports as its current page
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("meteora-nexus/{}", env!("CARGO_PKG_VERSION"))
}

fn default_base_url() -> String {
    "http://localhost:8080/".to_string()
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            sink_url: None,
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            base_url: default_base_url(),
        }
    }
}

impl AnalyticsConfig {
    /// The configured sink URL, ignoring blank values.
    pub fn sink_url(&self) -> Option<&str> {
        self.sink_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Path component of `base_url`, `/` when it cannot be parsed.
    pub fn base_path(&self) -> String {
        url::Url::parse(&self.base_url)
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| "/".to_string())
    }
}
