//! Telemetry for Meteora Nexus: in-process metrics, component health and
//! tracing setup.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::*;
pub use metrics::*;
pub use tracing_setup::*;
