//! Argument extraction with coercion.
//!
//! The `<param>value</param>` invocation form only produces strings, so every
//! typed accessor also accepts the string spelling of its type.

use serde_json::Value;
use steward_core::error::ToolError;
use steward_core::tool::ToolInput;

pub(crate) fn required_str<'a>(input: &'a ToolInput, key: &str) -> Result<&'a str, ToolError> {
    optional_str(input, key)?
        .ok_or_else(|| ToolError::InvalidArguments(format!("missing required argument '{key}'")))
}

pub(crate) fn optional_str<'a>(
    input: &'a ToolInput,
    key: &str,
) -> Result<Option<&'a str>, ToolError> {
    match input.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(ToolError::InvalidArguments(format!(
            "argument '{key}' must be a string"
        ))),
    }
}

pub(crate) fn optional_bool(input: &ToolInput, key: &str) -> Result<Option<bool>, ToolError> {
    match input.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(Value::String(s)) => match s.trim() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            _ => Err(ToolError::InvalidArguments(format!(
                "argument '{key}' must be true or false"
            ))),
        },
        Some(_) => Err(ToolError::InvalidArguments(format!(
            "argument '{key}' must be a boolean"
        ))),
    }
}

pub(crate) fn required_bool(input: &ToolInput, key: &str) -> Result<bool, ToolError> {
    optional_bool(input, key)?
        .ok_or_else(|| ToolError::InvalidArguments(format!("missing required argument '{key}'")))
}

pub(crate) fn optional_u64(input: &ToolInput, key: &str) -> Result<Option<u64>, ToolError> {
    let invalid = || ToolError::InvalidArguments(format!("argument '{key}' must be a non-negative integer"));
    match input.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_u64().map(Some).ok_or_else(invalid),
        Some(Value::String(s)) => s.trim().parse::<u64>().map(Some).map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

pub(crate) fn optional_usize(input: &ToolInput, key: &str) -> Result<Option<usize>, ToolError> {
    Ok(optional_u64(input, key)?.map(|value| value as usize))
}

/// A list argument: a JSON array, or a string holding one.
pub(crate) fn required_array(input: &ToolInput, key: &str) -> Result<Vec<Value>, ToolError> {
    match input.get(key) {
        None | Some(Value::Null) => Err(ToolError::InvalidArguments(format!(
            "missing required argument '{key}'"
        ))),
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(Value::String(s)) => match serde_json::from_str::<Value>(s.trim()) {
            Ok(Value::Array(items)) => Ok(items),
            _ => Err(ToolError::InvalidArguments(format!(
                "argument '{key}' must be a JSON array"
            ))),
        },
        Some(_) => Err(ToolError::InvalidArguments(format!(
            "argument '{key}' must be an array"
        ))),
    }
}

/// A list of strings: a JSON array of strings, a JSON-array string, or a
/// single comma-separated string.
pub(crate) fn optional_string_list(
    input: &ToolInput,
    key: &str,
) -> Result<Vec<String>, ToolError> {
    let invalid = || ToolError::InvalidArguments(format!("argument '{key}' must be a list of strings"));
    let from_values = |items: Vec<Value>| -> Result<Vec<String>, ToolError> {
        items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                _ => Err(invalid()),
            })
            .collect()
    };

    match input.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => from_values(items.clone()),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.starts_with('[') {
                match serde_json::from_str::<Value>(trimmed) {
                    Ok(Value::Array(items)) => from_values(items),
                    _ => Err(invalid()),
                }
            } else {
                Ok(trimmed
                    .split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(String::from)
                    .collect())
            }
        }
        Some(_) => Err(invalid()),
    }
}
