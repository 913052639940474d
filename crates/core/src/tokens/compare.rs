//! Value comparison plus the nullity, emptiness, equality and ordering checks.

use std::cmp::Ordering;

use serde_json::{Number, Value};

/// Which side of a comparison the value must fall on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl Comparison {
    fn holds(self, ordering: Ordering) -> bool {
        match self {
            Self::GreaterThan => ordering == Ordering::Greater,
            Self::GreaterThanOrEqual => ordering != Ordering::Less,
            Self::LessThan => ordering == Ordering::Less,
            Self::LessThanOrEqual => ordering != Ordering::Greater,
        }
    }

    fn phrase(self) -> &'static str {
        match self {
            Self::GreaterThan => "greater than",
            Self::GreaterThanOrEqual => "greater than or equal to",
            Self::LessThan => "less than",
            Self::LessThanOrEqual => "less than or equal to",
        }
    }
}

/// Order two values of the same family.
///
/// Numbers compare numerically whatever their representation, strings and
/// booleans compare naturally, and any other pair is incomparable.
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn compare_numbers(x: &Number, y: &Number) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return Some(a.cmp(&b));
    }
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return Some(a.cmp(&b));
    }
    x.as_f64()?.partial_cmp(&y.as_f64()?)
}

/// Equality where `1` and `1.0` are the same value.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y) == Some(Ordering::Equal),
        _ => a == b,
    }
}

/// Null, blank strings, and empty collections are empty.
pub(crate) fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

pub(super) fn check_null(value: &Value) -> Result<(), String> {
    if value.is_null() {
        Ok(())
    } else {
        Err("The value must be null.".into())
    }
}

pub(super) fn check_not_null(value: &Value) -> Result<(), String> {
    if value.is_null() {
        Err("The value must not be null.".into())
    } else {
        Ok(())
    }
}

pub(super) fn check_empty(value: &Value) -> Result<(), String> {
    if is_empty(value) {
        Ok(())
    } else {
        Err("The value must be empty.".into())
    }
}

pub(super) fn check_not_empty(value: &Value) -> Result<(), String> {
    if is_empty(value) {
        Err("The value must not be empty.".into())
    } else {
        Ok(())
    }
}

pub(super) fn check_equal(value: &Value, expected: &Value) -> Result<(), String> {
    if values_equal(value, expected) {
        Ok(())
    } else {
        Err(format!("The value must be equal to {expected}."))
    }
}

pub(super) fn check_not_equal(value: &Value, expected: &Value) -> Result<(), String> {
    if values_equal(value, expected) {
        Err(format!("The value must not be equal to {expected}."))
    } else {
        Ok(())
    }
}

pub(super) fn check_compare(
    value: &Value,
    bound: &Value,
    comparison: Comparison,
) -> Result<(), String> {
    match compare(value, bound) {
        Some(ordering) if comparison.holds(ordering) => Ok(()),
        Some(_) => Err(format!("The value must be {} {bound}.", comparison.phrase())),
        None => Err(format!("The value cannot be compared with {bound}.")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_compare_across_representations() {
        assert_eq!(compare(&json!(1), &json!(1.0)), Some(Ordering::Equal));
        assert_eq!(compare(&json!(-1), &json!(u64::MAX)), Some(Ordering::Less));
        assert!(values_equal(&json!(2), &json!(2.0)));
        assert!(!values_equal(&json!("2"), &json!(2)));
    }

    #[test]
    fn mixed_families_are_incomparable() {
        assert_eq!(compare(&json!("a"), &json!(1)), None);
        assert!(check_compare(&json!("a"), &json!(1), Comparison::GreaterThan)
            .unwrap_err()
            .contains("cannot be compared"));
    }

    #[test]
    fn emptiness_covers_blank_strings_and_collections() {
        assert!(is_empty(&json!(null)));
        assert!(is_empty(&json!("  ")));
        assert!(is_empty(&json!([])));
        assert!(!is_empty(&json!(0)));
        assert!(check_not_empty(&json!({"a": 1})).is_ok());
    }

    #[test]
    fn comparisons_respect_strictness() {
        assert!(check_compare(&json!(5), &json!(5), Comparison::GreaterThanOrEqual).is_ok());
        assert!(check_compare(&json!(5), &json!(5), Comparison::GreaterThan).is_err());
        assert!(check_compare(&json!("b"), &json!("c"), Comparison::LessThan).is_ok());
    }
}
