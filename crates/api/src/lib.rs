//! HTTP API for Meteora Nexus: the rate-limited analytics collection
//! endpoint and health probes, with security headers on every response.

pub mod buffer;
pub mod extractors;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::AppState;
