//! Strict validation of model replies.
//!
//! Model output is untrusted text. It is first cleaned (markdown code
//! fences stripped, the outermost `[` .. `]` slice taken, since models
//! routinely add prose around the payload), then parsed as a JSON array of
//! flat objects. Anything else is a `Parse` error; untyped data is never
//! passed through.

use crate::types::StructuredRow;
use crate::{DocpipeError, Result};
use serde_json::Value;

/// Parse a model reply into structured rows.
///
/// # Errors
///
/// Returns `DocpipeError::Parse` if no JSON array can be located, the JSON
/// is invalid, an element is not an object, or an object value is nested
/// (arrays and objects are rejected; scalars are stringified).
pub fn parse_rows(reply: &str) -> Result<Vec<StructuredRow>> {
    let payload = extract_json_array(reply)?;

    let value: Value = serde_json::from_str(payload)
        .map_err(|e| DocpipeError::parse_with_source("reply is not valid JSON", e))?;

    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(DocpipeError::parse(format!(
                "expected a JSON array, got {}",
                json_kind(&other)
            )));
        }
    };

    let mut rows = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let Value::Object(object) = item else {
            return Err(DocpipeError::parse(format!(
                "array element {index} is not an object"
            )));
        };

        let mut row = StructuredRow::new();
        for (key, value) in object {
            row.insert(key.clone(), scalar_to_cell(&key, &value)?);
        }
        rows.push(row);
    }

    Ok(rows)
}

/// Locate the JSON array inside a possibly decorated reply.
fn extract_json_array(reply: &str) -> Result<&str> {
    let trimmed = strip_code_fences(reply);

    let start = trimmed
        .find('[')
        .ok_or_else(|| DocpipeError::parse("no JSON array found in reply"))?;
    let end = trimmed
        .rfind(']')
        .filter(|&end| end > start)
        .ok_or_else(|| DocpipeError::parse("unterminated JSON array in reply"))?;

    Ok(&trimmed[start..=end])
}

/// Drop surrounding ``` fences, with or without a language tag.
fn strip_code_fences(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn scalar_to_cell(key: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        Value::Array(_) | Value::Object(_) => Err(DocpipeError::parse(format!(
            "field {key:?} holds a nested {}, rows must be flat",
            json_kind(value)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
