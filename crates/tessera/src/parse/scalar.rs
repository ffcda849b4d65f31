//! Lists, JSON objects and numbers from loosely formatted cells.

use serde_json::{Map, Value};

use crate::schema::fields::cell_to_string;

use super::ParseError;

/// Parse a cell as a list of strings.
///
/// Accepted forms:
/// - a JSON list value (elements are stringified)
/// - a JSON array literal such as `["a","b"]`
/// - comma- or newline-separated text; entries are trimmed and empties dropped
///
/// Null and empty cells yield an empty list.
pub fn parse_list(value: &Value) -> Result<Vec<String>, ParseError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items.iter().map(cell_to_string).collect()),
        Value::Object(_) => Err(ParseError::InvalidArrayFormat),
        Value::Number(_) | Value::Bool(_) => Ok(vec![value.to_string()]),
        Value::String(s) => parse_list_text(s),
    }
}

fn parse_list_text(text: &str) -> Result<Vec<String>, ParseError> {
    let trimmed = text.trim();
    if trimmed.starts_with('[') {
        return match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::Array(items)) => Ok(items.iter().map(cell_to_string).collect()),
            Ok(_) => Err(ParseError::InvalidArrayFormat),
            Err(_) => Err(ParseError::MalformedArray),
        };
    }

    Ok(trimmed
        .split(['\n', ','])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect())
}

/// Render a list in the comma-separated form [`parse_list`] accepts.
pub fn format_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(",")
}

/// Parse a cell as a JSON object.
///
/// Null and empty cells yield `Ok(None)`; any other non-object content is an
/// error.
pub fn parse_object(value: &Value) -> Result<Option<Map<String, Value>>, ParseError> {
    match value {
        Value::Null => Ok(None),
        Value::Object(map) => Ok(Some(map.clone())),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => match serde_json::from_str::<Value>(s.trim()) {
            Ok(Value::Object(map)) => Ok(Some(map)),
            _ => Err(ParseError::InvalidObject),
        },
        _ => Err(ParseError::InvalidObject),
    }
}

/// Coerce a cell to a number.
///
/// Anything that is not a number or numeric text becomes `NaN`, and `NaN`
/// fails every comparison, so bound checks on it always report.
pub fn to_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

/// Whether `value` lies in `[min, max]`. `NaN` is never in range.
pub fn in_range(value: f64, min: f64, max: f64) -> bool {
    value >= min && value <= max
}

/// Format a number for messages, without a trailing `.0` for integers.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
