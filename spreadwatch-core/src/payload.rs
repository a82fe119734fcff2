//! Helpers for reading loosely typed provider JSON.
//!
//! Prices are converted through their decimal text, never through `f64`, so
//! `"60000.10"` and `60000.1` both land on the exact decimal value.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

const EXCERPT_LEN: usize = 120;

/// Short name of a JSON value's type.
#[must_use]
pub const fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// `kind: excerpt` description of a value for error messages.
#[must_use]
pub fn describe(v: &Value) -> String {
    let mut text = v.to_string();
    if text.len() > EXCERPT_LEN {
        let mut cut = EXCERPT_LEN;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
        text.push('…');
    }
    format!("{}: {text}", json_kind(v))
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim();
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

/// Numeric value of a JSON number or numeric string.
#[must_use]
pub fn number_like(v: &Value) -> Option<Decimal> {
    match v {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s),
        _ => None,
    }
}

/// Read a close price.
///
/// `null` is an absent close. Numbers and numeric strings become decimals.
///
/// # Errors
/// Returns a description of the offending value for any other input.
pub fn close_from_json(v: &Value) -> Result<Option<Decimal>, String> {
    if v.is_null() {
        return Ok(None);
    }
    number_like(v).map(Some).ok_or_else(|| describe(v))
}

/// Read an epoch timestamp in milliseconds.
///
/// With `seconds_below = Some(t)`, values smaller than `t` are taken as seconds.
/// Fractional milliseconds are truncated.
#[must_use]
pub fn timestamp_from_json(v: &Value, seconds_below: Option<Decimal>) -> Option<DateTime<Utc>> {
    let raw = number_like(v)?;
    let millis = match seconds_below {
        Some(limit) if raw < limit => raw.checked_mul(Decimal::ONE_THOUSAND)?,
        _ => raw,
    };
    let millis = i64::try_from(millis.trunc()).ok()?;
    DateTime::from_timestamp_millis(millis)
}
