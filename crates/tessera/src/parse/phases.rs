//! Phase-list parsing: `[1,2,3]`, `"1-3"` or `"1,2,3"`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::ParseError;

/// `start-end`, both non-negative integers.
static RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\s*-\s*(\d+)$").expect("valid range pattern"));

/// Ranges wider than this are rejected rather than expanded.
const MAX_RANGE_SPAN: i64 = 1000;

/// Parse a cell as a list of phase numbers.
///
/// Any bad token fails the whole cell; partial results are never returned.
pub fn parse_phases(value: &Value) -> Result<Vec<i64>, ParseError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Number(_) => phase_from_value(value).map(|p| vec![p]),
        Value::Array(items) => items.iter().map(phase_from_value).collect(),
        Value::String(s) => parse_phase_text(s),
        _ => Err(ParseError::NonNumeric(value.to_string())),
    }
}

fn parse_phase_text(text: &str) -> Result<Vec<i64>, ParseError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if trimmed.starts_with('[') {
        return match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::Array(items)) => items.iter().map(phase_from_value).collect(),
            Ok(_) => Err(ParseError::InvalidArrayFormat),
            Err(_) => Err(ParseError::MalformedArray),
        };
    }

    // A dash after the first character means a range; a leading dash is a
    // negative number and is left to the comma path.
    if !trimmed.contains(',') && trimmed.chars().skip(1).any(|c| c == '-') {
        return parse_range(trimmed);
    }

    trimmed
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(phase_from_token)
        .collect()
}

fn parse_range(text: &str) -> Result<Vec<i64>, ParseError> {
    let caps = RANGE.captures(text).ok_or(ParseError::InvalidRange)?;
    let start: i64 = caps[1].parse().map_err(|_| ParseError::InvalidRange)?;
    let end: i64 = caps[2].parse().map_err(|_| ParseError::InvalidRange)?;

    if start > end || end - start > MAX_RANGE_SPAN {
        return Err(ParseError::InvalidRange);
    }

    Ok((start..=end).collect())
}

fn phase_from_token(token: &str) -> Result<i64, ParseError> {
    token
        .parse::<f64>()
        .ok()
        .and_then(integral)
        .ok_or_else(|| ParseError::NonNumeric(token.to_string()))
}

fn phase_from_value(value: &Value) -> Result<i64, ParseError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .and_then(integral)
            .ok_or_else(|| ParseError::NonNumeric(n.to_string())),
        Value::String(s) => phase_from_token(s.trim()),
        other => Err(ParseError::NonNumeric(other.to_string())),
    }
}

fn integral(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0).then_some(f as i64)
}
