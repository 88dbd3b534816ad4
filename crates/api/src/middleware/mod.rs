//! Request middleware.

pub mod rate_limit;
pub mod security_headers;

pub use rate_limit::{enforce_rate_limit, RateLimitConfig, RateLimiter, SharedRateLimiter};
pub use security_headers::apply_security_headers;
