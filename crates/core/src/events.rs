//! Analytics event and web-vitals types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use validator::{Validate, ValidationError};

use crate::error::{Error, Result};
use crate::limits::MAX_CUSTOM_PARAMETERS_BYTES;
use crate::validation::is_safe_number;

/// Free-form parameters attached to an event.
pub type CustomParameters = Map<String, Value>;

/// Validates custom parameters JSON size.
fn validate_parameters_size(params: &CustomParameters) -> std::result::Result<(), ValidationError> {
    if params.is_empty() {
        return Ok(());
    }

    let size = serde_json::to_vec(params).map(|v| v.len()).unwrap_or(0);

    if size > MAX_CUSTOM_PARAMETERS_BYTES {
        let mut err = ValidationError::new("parameters_too_large");
        err.message = Some(
            format!(
                "customParameters {}KB exceeds {}KB limit",
                size / 1024,
                MAX_CUSTOM_PARAMETERS_BYTES / 1024
            )
            .into(),
        );
        return Err(err);
    }
    Ok(())
}

/// An analytics event as produced by the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[validate(length(min = 1, max = 100))]
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 500))]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_parameters_size"))]
    pub custom_parameters: Option<CustomParameters>,
}

impl AnalyticsEvent {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            action: action.into(),
            label: None,
            value: None,
            custom_parameters: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_value(mut self, value: Option<f64>) -> Self {
        self.value = value;
        self
    }

    pub fn with_parameters(mut self, params: Option<CustomParameters>) -> Self {
        self.custom_parameters = params;
        self
    }
}

/// An event after enrichment at record time.
///
/// Serializes flat: `{name, category, action, label?, value?,
/// customParameters?, timestamp, url, userAgent}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedEvent {
    #[serde(flatten)]
    #[validate(nested)]
    pub event: AnalyticsEvent,
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    #[validate(length(max = 2048))]
    pub url: String,
    #[validate(length(max = 512))]
    pub user_agent: String,
}

/// Validate an enriched event received from a client.
pub fn validate_enriched_event(event: &EnrichedEvent) -> Result<()> {
    event
        .validate()
        .map_err(|e| Error::validation(format!("{}", e)))?;

    if let Some(value) = event.event.value {
        if !is_safe_number(value) {
            return Err(Error::validation("value must be a finite, safe number"));
        }
    }
    if event.timestamp < 0 {
        return Err(Error::validation("timestamp cannot be negative"));
    }

    Ok(())
}

/// Web-vitals metric names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricName {
    Cls,
    Fid,
    Fcp,
    Lcp,
    Ttfb,
}

impl MetricName {
    pub const ALL: [MetricName; 5] = [Self::Cls, Self::Fid, Self::Fcp, Self::Lcp, Self::Ttfb];

    /// Lowercase key used in the metrics map.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cls => "cls",
            Self::Fid => "fid",
            Self::Fcp => "fcp",
            Self::Lcp => "lcp",
            Self::Ttfb => "ttfb",
        }
    }

    /// Uppercase name reported as the web_vital event action.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cls => "CLS",
            Self::Fid => "FID",
            Self::Fcp => "FCP",
            Self::Lcp => "LCP",
            Self::Ttfb => "TTFB",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cls" => Ok(Self::Cls),
            "fid" => Ok(Self::Fid),
            "fcp" => Ok(Self::Fcp),
            "lcp" => Ok(Self::Lcp),
            "ttfb" => Ok(Self::Ttfb),
            _ => Err(Error::UnknownMetric(s.to_string())),
        }
    }
}

/// Latest reported value per web-vitals metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cls: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fid: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fcp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lcp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttfb: Option<f64>,
}

impl PerformanceMetrics {
    fn slot(&mut self, name: MetricName) -> &mut Option<f64> {
        match name {
            MetricName::Cls => &mut self.cls,
            MetricName::Fid => &mut self.fid,
            MetricName::Fcp => &mut self.fcp,
            MetricName::Lcp => &mut self.lcp,
            MetricName::Ttfb => &mut self.ttfb,
        }
    }

    /// Store a value, replacing any earlier report of the same metric.
    pub fn set(&mut self, name: MetricName, value: f64) {
        *self.slot(name) = Some(value);
    }

    pub fn get(&self, name: MetricName) -> Option<f64> {
        match name {
            MetricName::Cls => self.cls,
            MetricName::Fid => self.fid,
            MetricName::Fcp => self.fcp,
            MetricName::Lcp => self.lcp,
            MetricName::Ttfb => self.ttfb,
        }
    }

    /// Reported metrics in a fixed order.
    pub fn iter(&self) -> impl Iterator<Item = (MetricName, f64)> + '_ {
        MetricName::ALL
            .into_iter()
            .filter_map(|name| self.get(name).map(|value| (name, value)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}
