//! Value semantics shared by the evaluator, verifier, and analyzer.
//!
//! Values are `serde_json::Value`: the closed sum of null, boolean,
//! number, string, array, and object. Dates travel as strings and are
//! parsed on demand. These helpers localize every coercion rule in one
//! place so the operator table stays declarative.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;

/// JSON-logic truthiness: null, false, 0, "", [] and {} are falsy.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Numeric coercion. Numbers only; strings are never silently converted.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Equality with coercion: if both operands are numbers, compare
/// numerically; otherwise compare string representations. Null equals
/// only null.
///
/// The string fallback can produce surprising matches (a string that
/// happens to spell an array's JSON text equals that array). This is a
/// compatibility guarantee, not an accident; hosts that need strict
/// equality should compare typed values themselves.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    if a.is_null() && b.is_null() {
        return true;
    }
    if a.is_null() || b.is_null() {
        return false;
    }
    if let (Some(x), Some(y)) = (as_number(a), as_number(b)) {
        return x == y;
    }
    display_string(a) == display_string(b)
}

/// Render a value the way the equality fallback sees it: bare text for
/// strings, JSON text for everything else.
pub fn display_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse a date value. Accepts RFC 3339, date-time without zone, and
/// date-only; anything else (including non-strings) is None.
pub fn parse_date(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::String(s) => parse_date_str(s),
        _ => None,
    }
}

/// Parse a date string in one of the three accepted formats.
pub fn parse_date_str(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d.and_time(NaiveTime::MIN));
    }
    None
}

/// Infer a definition type for a rule-created field.
pub fn infer_type(value: &Value) -> &'static str {
    match value {
        Value::String(_) => "string",
        Value::Number(_) => "number",
        Value::Bool(_) => "boolean",
        _ => "string",
    }
}
