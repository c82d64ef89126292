//! Loose conversions used by casts and by the wire encoders.
//!
//! These follow the conversions web clients apply to untyped input
//! (`Number(x)`, `Boolean(x)`, `String(x)`), so that casts accept the same
//! inputs a browser or Node.js peer would.

use serde_json::{Number, Value};

/// Largest integer exactly representable as `f64`.
pub const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Numeric conversion. `None` means not-a-number.
pub fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Null => Some(0.0),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s),
        Value::Array(_) => parse_number(&to_display_string(value)),
        Value::Object(_) => None,
    }
}

/// Parse a numeric literal the way untyped string input is read: surrounding
/// whitespace is ignored, a blank string is zero, and `0x`/`0o`/`0b`
/// prefixes and `Infinity` are understood.
pub fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return Some(0.0);
    }

    match s {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }

    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = s.strip_prefix(prefix) {
            return u64::from_str_radix(digits, radix).ok().map(|n| n as f64);
        }
    }

    // `str::parse::<f64>` also accepts `inf`, `nan` and friends; only plain
    // decimal literals are numbers here.
    if !s
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
    {
        return None;
    }
    s.parse::<f64>().ok()
}

/// Truthiness: `null`, `false`, `0` and `""` are false, everything else true.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Wrap a finite `f64` as a JSON number, preferring the integer form when
/// the value is integral and safe. Non-finite values have no JSON form.
pub fn number_value(n: f64) -> Option<Value> {
    if !n.is_finite() {
        return None;
    }
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        return Some(Value::from(n as i64));
    }
    Number::from_f64(n).map(Value::Number)
}

/// Render a number without a trailing `.0` when it is integral.
pub fn format_number(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER => (f as i64).to_string(),
        _ => n.to_string(),
    }
}

/// String conversion: `null` is empty, arrays join their items with `,`,
/// objects become `[object Object]`.
pub fn to_display_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(to_display_string)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".into(),
    }
}
