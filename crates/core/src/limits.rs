//! Size and magnitude limits.
//!
//! Field limits on [`crate::events::AnalyticsEvent`] are repeated as
//! literals inside the `#[validate]` attributes, which cannot reference
//! constants. Keep both in sync when modifying.

// === Numeric Bounds ===

/// Largest integer an IEEE-754 double represents exactly (2^53 - 1).
///
/// Values whose magnitude exceeds this are indistinguishable from their
/// neighbours and are rejected by the numeric validators.
pub const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Below this magnitude `format_number` renders a threshold marker instead of digits.
pub const MIN_DISPLAY_MAGNITUDE: f64 = 0.01;

// === Text Limits (chars) ===

/// Search queries are cut to this many characters after sanitization.
pub const MAX_SEARCH_QUERY_LEN: usize = 100;

/// Event name/category/action max length.
pub const MAX_EVENT_FIELD_LEN: usize = 100;

/// Event label max length.
pub const MAX_LABEL_LEN: usize = 500;

/// Page URL max length.
pub const MAX_URL_LEN: usize = 2048;

/// User agent string max length.
pub const MAX_USER_AGENT_LEN: usize = 512;

// === Payload Limits ===

/// Maximum size of a single collected event body (32KB).
pub const MAX_EVENT_SIZE_BYTES: usize = 32 * 1024;

/// Maximum serialized size of `customParameters` (16KB).
pub const MAX_CUSTOM_PARAMETERS_BYTES: usize = 16 * 1024;

/// Collected events kept in memory by the collection endpoint.
pub const MAX_COLLECTED_EVENTS: usize = 10_000;

// === Address Limits ===

/// Base58 encoded Solana public keys are 32 to 44 characters.
pub const MIN_SOLANA_ADDRESS_LEN: usize = 32;
pub const MAX_SOLANA_ADDRESS_LEN: usize = 44;
