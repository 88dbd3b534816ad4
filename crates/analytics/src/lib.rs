//! Analytics recorder for Meteora Nexus.
//!
//! [`Analytics`] keeps the event log and web-vitals metrics, [`EventSink`]
//! abstracts the collection endpoint, and [`AnalyticsProvider`] feeds host
//! events (navigation, errors, panics) into the recorder.

pub mod config;
pub mod provider;
pub mod recorder;
pub mod sink;
pub mod vitals;

pub use config::*;
pub use provider::*;
pub use recorder::*;
pub use sink::*;
pub use vitals::*;
