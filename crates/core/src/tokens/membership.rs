//! In / NotIn membership over a fixed reference collection.

use serde_json::Value;

use super::compare::values_equal;

fn contains(reference: &[Value], value: &Value) -> bool {
    reference.iter().any(|candidate| values_equal(candidate, value))
}

/// The value itself, or any element of it when it is an array, is in
/// `reference`.
fn hits(reference: &[Value], value: &Value) -> bool {
    if contains(reference, value) {
        return true;
    }
    match value {
        Value::Array(items) => items.iter().any(|item| contains(reference, item)),
        _ => false,
    }
}

pub(super) fn check_in(value: &Value, reference: &[Value]) -> Result<(), String> {
    if hits(reference, value) {
        Ok(())
    } else {
        Err("The value is not contained in the given collection.".into())
    }
}

pub(super) fn check_not_in(value: &Value, reference: &[Value]) -> Result<(), String> {
    if hits(reference, value) {
        Err("The value is contained in the given collection.".into())
    } else {
        Ok(())
    }
}
