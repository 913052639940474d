//! Size checks over strings and collections.

use serde_json::Value;

/// Size of a string (in chars), array, or object.
fn measure(value: &Value, null_as_zero: bool) -> Result<usize, String> {
    match value {
        Value::String(s) => Ok(s.chars().count()),
        Value::Array(items) => Ok(items.len()),
        Value::Object(map) => Ok(map.len()),
        Value::Null if null_as_zero => Ok(0),
        Value::Null => Err("The value is null and has no length.".into()),
        Value::Bool(_) | Value::Number(_) => Err("The value has no length.".into()),
    }
}

pub(super) fn check_length(
    value: &Value,
    min: Option<usize>,
    max: Option<usize>,
    null_as_zero: bool,
) -> Result<(), String> {
    let length = measure(value, null_as_zero)?;
    match (min, max) {
        (Some(min), Some(max)) if length < min || length > max => Err(format!(
            "The length must be between {min} and {max}, got {length}."
        )),
        (Some(min), None) if length < min => {
            Err(format!("The length must be at least {min}, got {length}."))
        }
        (None, Some(max)) if length > max => {
            Err(format!("The length must be at most {max}, got {length}."))
        }
        _ => Ok(()),
    }
}

pub(super) fn check_at_least(value: &Value, count: usize, null_as_zero: bool) -> Result<(), String> {
    let length = measure(value, null_as_zero)?;
    if length >= count {
        Ok(())
    } else {
        Err(format!(
            "The collection must contain at least {count} item(s), got {length}."
        ))
    }
}
