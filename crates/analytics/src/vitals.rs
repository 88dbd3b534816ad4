//! Web-vitals reports and their ratings.

use nexus_core::MetricName;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rating bucket for a metric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetricRating {
    Good,
    NeedsImprovement,
    Poor,
}

impl MetricRating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::NeedsImprovement => "needs-improvement",
            Self::Poor => "poor",
        }
    }
}

impl fmt::Display for MetricRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upper bounds (inclusive) for `good` and `needs-improvement`.
pub fn thresholds(metric: MetricName) -> (f64, f64) {
    match metric {
        MetricName::Cls => (0.1, 0.25),
        MetricName::Fid => (100.0, 300.0),
        MetricName::Fcp => (1800.0, 3000.0),
        MetricName::Lcp => (2500.0, 4000.0),
        MetricName::Ttfb => (800.0, 1800.0),
    }
}

pub fn rate(metric: MetricName, value: f64) -> MetricRating {
    let (good, needs_improvement) = thresholds(metric);
    if value <= good {
        MetricRating::Good
    } else if value <= needs_improvement {
        MetricRating::NeedsImprovement
    } else {
        MetricRating::Poor
    }
}

/// Display form: CLS is unitless with 3 decimals, the rest are rounded
/// milliseconds.
pub fn format_metric(metric: MetricName, value: f64) -> String {
    match metric {
        MetricName::Cls => format!("{:.3}", value),
        _ => format!("{}ms", value.round()),
    }
}

/// A single report from the web-vitals source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebVitalReport {
    pub metric: MetricName,
    pub value: f64,
    /// Unique id of this metric instance
    pub id: String,
    pub rating: MetricRating,
    pub navigation_type: String,
}

impl WebVitalReport {
    /// Build a report, rating the value from the standard thresholds.
    pub fn new(metric: MetricName, value: f64, id: impl Into<String>) -> Self {
        Self {
            metric,
            value,
            id: id.into(),
            rating: rate(metric, value),
            navigation_type: "navigate".to_string(),
        }
    }
}
