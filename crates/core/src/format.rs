//! Display formatting for numbers, currency, percentages and addresses.
//!
//! Every formatter is total. Input that cannot be read as a finite number
//! renders as the formatter's zero value.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::limits::MIN_DISPLAY_MAGNITUDE;

/// Default fraction digits for [`format_number`].
pub const DEFAULT_DECIMALS: usize = 2;

/// Default head/tail length for [`truncate_address`].
pub const DEFAULT_ADDRESS_CHARS: usize = 4;

/// Default currency for [`format_currency`].
pub const DEFAULT_CURRENCY: &str = "USD";

const UNIT_SUFFIXES: [&str; 4] = ["", "K", "M", "B"];
const UNIT_DIVISORS: [f64; 4] = [1.0, 1e3, 1e6, 1e9];

/// Largest scale a `Decimal` holds.
const MAX_DECIMAL_SCALE: usize = 28;

/// A raw value as it arrives from an API response: a number or a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl RawValue {
    /// The finite numeric value, if there is one.
    pub fn as_f64(&self) -> Option<f64> {
        let n = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        n.is_finite().then_some(n)
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<f32> for RawValue {
    fn from(n: f32) -> Self {
        Self::Number(n as f64)
    }
}

impl From<i32> for RawValue {
    fn from(n: i32) -> Self {
        Self::Number(n as f64)
    }
}

impl From<i64> for RawValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<u32> for RawValue {
    fn from(n: u32) -> Self {
        Self::Number(n as f64)
    }
}

impl From<u64> for RawValue {
    fn from(n: u64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&serde_json::Value> for RawValue {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Self::Text(s.clone()),
            _ => Self::Number(f64::NAN),
        }
    }
}

/// [`format_number_with`] using two fraction digits.
pub fn format_number(value: impl Into<RawValue>) -> String {
    format_number_with(value, DEFAULT_DECIMALS)
}

/// Compact number with a `K`/`M`/`B` suffix and exactly `decimals` fraction digits.
///
/// `0` renders as `"0"`. Magnitudes below 0.01 render as `"< 0.01"`, or
/// `"> -0.01"` when negative. The unit is chosen from the unrounded
/// magnitude, so `999_999` is `"1000.00K"`.
pub fn format_number_with(value: impl Into<RawValue>, decimals: usize) -> String {
    let Some(n) = value.into().as_f64() else {
        return "0".to_string();
    };

    if n == 0.0 {
        return "0".to_string();
    }
    if n.abs() < MIN_DISPLAY_MAGNITUDE {
        return if n > 0.0 { "< 0.01" } else { "> -0.01" }.to_string();
    }

    let unit = UNIT_DIVISORS
        .iter()
        .rposition(|divisor| n.abs() >= *divisor)
        .unwrap_or(0);
    let scaled = n / UNIT_DIVISORS[unit];

    let sign = if scaled < 0.0 { "-" } else { "" };
    format!(
        "{}{}{}",
        sign,
        to_fixed(scaled.abs(), decimals, Digits::Exact),
        UNIT_SUFFIXES[unit]
    )
}

/// Which decimal expansion of a float gets rounded.
#[derive(Debug, Clone, Copy)]
enum Digits {
    /// The float's exact binary value: `1.005` is just below the tie.
    Exact,
    /// The shortest decimal that reads back as the same float: `1.005`.
    Shortest,
}

/// Non-negative `value` with exactly `decimals` fraction digits, ties
/// rounded away from zero.
fn to_fixed(value: f64, decimals: usize, digits: Digits) -> String {
    let parsed = match digits {
        Digits::Exact => Decimal::from_f64_retain(value),
        Digits::Shortest => value.to_string().parse::<Decimal>().ok(),
    };
    let Some(parsed) = parsed else {
        // Beyond Decimal's range there is no fraction left to round
        return format!("{:.*}", decimals, value);
    };

    let scale = decimals.min(MAX_DECIMAL_SCALE);
    let mut rounded =
        parsed.round_dp_with_strategy(scale as u32, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(scale as u32);

    let mut out = rounded.abs().to_string();
    out.extend(std::iter::repeat('0').take(decimals - scale));
    out
}

/// [`format_currency_in`] for US dollars.
pub fn format_currency(value: impl Into<RawValue>) -> String {
    format_currency_in(value, DEFAULT_CURRENCY)
}

/// Currency amount with thousands grouping.
///
/// Two fraction digits, except that amounts below 1 in magnitude keep up to
/// six so small token prices do not collapse to `0.00`. The sign goes before
/// the symbol: `-$123.45`.
pub fn format_currency_in(value: impl Into<RawValue>, currency_code: &str) -> String {
    let code = currency_code.trim().to_ascii_uppercase();
    let n = value.into().as_f64().unwrap_or(0.0);

    let max_fraction = if n.abs() < 1.0 { 6 } else { 2 };
    let digits = trim_fraction(to_fixed(n.abs(), max_fraction, Digits::Shortest), 2);
    let negative = n < 0.0 && digits.bytes().any(|b| matches!(b, b'1'..=b'9'));

    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits.as_str(), ""));
    let amount = if frac_part.is_empty() {
        group_thousands(int_part)
    } else {
        format!("{}.{}", group_thousands(int_part), frac_part)
    };

    let sign = if negative { "-" } else { "" };
    match currency_symbol(&code) {
        Some(symbol) => format!("{sign}{symbol}{amount}"),
        None => format!("{sign}{code} {amount}"),
    }
}

fn currency_symbol(code: &str) -> Option<&'static str> {
    match code {
        "USD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "JPY" => Some("¥"),
        "SOL" => Some("◎"),
        _ => None,
    }
}

/// Drop trailing fraction zeros but keep at least `min_fraction` digits.
fn trim_fraction(mut digits: String, min_fraction: usize) -> String {
    if let Some(dot) = digits.find('.') {
        let min_len = dot + 1 + min_fraction;
        while digits.len() > min_len && digits.ends_with('0') {
            digits.pop();
        }
    }
    digits
}

fn group_thousands(int_part: &str) -> String {
    let len = int_part.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Signed percentage with two fraction digits: `+5.00%`, `-5.00%`, `+0.00%`.
pub fn format_percentage(value: impl Into<RawValue>) -> String {
    let n = value.into().as_f64().unwrap_or(0.0);
    // -0.0 >= 0.0, so negative zero also gets '+'
    let sign = if n >= 0.0 { '+' } else { '-' };
    format!("{}{}%", sign, to_fixed(n.abs(), 2, Digits::Exact))
}

/// [`truncate_address_with`] keeping four characters on each side.
pub fn truncate_address(address: &str) -> String {
    truncate_address_with(address, DEFAULT_ADDRESS_CHARS)
}

/// `head...tail` of an address.
///
/// Slicing is unconditional: short inputs repeat overlapping characters
/// (`"abc"` with 2 gives `"ab...bc"`). A tail of zero characters keeps the
/// whole address, like a `-0` slice.
pub fn truncate_address_with(address: &str, chars: usize) -> String {
    let total = address.chars().count();
    let head: String = address.chars().take(chars).collect();
    let tail: String = if chars == 0 {
        address.to_string()
    } else {
        address.chars().skip(total.saturating_sub(chars)).collect()
    };
    format!("{head}...{tail}")
}
