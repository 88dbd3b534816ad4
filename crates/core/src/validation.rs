//! Input validators.
//!
//! Validators are total predicates: malformed input is a `false`, never an
//! error. The `&Value` variants do the runtime type check at the boundary
//! and hand back a narrowed `f64` via [`as_safe_number`].

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::limits::{MAX_SAFE_INTEGER, MAX_SOLANA_ADDRESS_LEN, MIN_SOLANA_ADDRESS_LEN};

static SOLANA_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^[1-9A-HJ-NP-Za-km-z]{{{},{}}}$",
        MIN_SOLANA_ADDRESS_LEN, MAX_SOLANA_ADDRESS_LEN
    ))
    .expect("base58 address pattern")
});

/// Finite and no larger in magnitude than `MAX_SAFE_INTEGER`.
pub fn is_safe_number(value: f64) -> bool {
    value.is_finite() && value.abs() <= MAX_SAFE_INTEGER
}

/// [`is_safe_number`] restricted to non-negative values (monetary amounts).
pub fn is_safe_amount(value: f64) -> bool {
    is_safe_number(value) && value >= 0.0
}

/// Narrow a JSON value to a safe number.
pub fn as_safe_number(value: &Value) -> Option<f64> {
    value.as_f64().filter(|n| is_safe_number(*n))
}

/// Narrow a JSON value to a safe non-negative amount.
pub fn as_safe_amount(value: &Value) -> Option<f64> {
    value.as_f64().filter(|n| is_safe_amount(*n))
}

/// True iff `value` is a JSON number that is finite and within the safe bound.
pub fn is_valid_numeric(value: &Value) -> bool {
    as_safe_number(value).is_some()
}

/// Like [`is_valid_numeric`] but also rejects negative numbers.
pub fn is_valid_amount(value: &Value) -> bool {
    as_safe_amount(value).is_some()
}

/// Base58 Solana address, 32 to 44 characters.
pub fn is_valid_solana_address(address: &str) -> bool {
    SOLANA_ADDRESS.is_match(address)
}

/// Absolute `http` or `https` URL.
pub fn is_valid_url(input: &str) -> bool {
    url::Url::parse(input)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}
