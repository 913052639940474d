//! Any / All quantifiers over collection elements.

use serde_json::Value;

use super::predicate::guarded;
use super::ItemPredicate;

const NOT_A_COLLECTION: &str = "The value is not a collection or an array.";

fn elements(value: &Value) -> Option<Vec<&Value>> {
    match value {
        Value::Array(items) => Some(items.iter().collect()),
        Value::Object(map) => Some(map.values().collect()),
        _ => None,
    }
}

pub(super) fn check_any(name: &str, value: &Value, predicate: &ItemPredicate) -> Result<(), String> {
    let items = elements(value).ok_or_else(|| NOT_A_COLLECTION.to_string())?;
    let matched = guarded(name, || items.iter().copied().any(|item| predicate(item)))?;
    if matched {
        Ok(())
    } else {
        Err("There are no members that meet the condition in the collection.".into())
    }
}

pub(super) fn check_all(name: &str, value: &Value, predicate: &ItemPredicate) -> Result<(), String> {
    let items = elements(value).ok_or_else(|| NOT_A_COLLECTION.to_string())?;
    let matched = guarded(name, || items.iter().copied().all(|item| predicate(item)))?;
    if matched {
        Ok(())
    } else {
        Err("Not all members of the collection meet the condition.".into())
    }
}
