//! Caller-supplied predicates, isolated from panics.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{FuncCheck, ValuePredicate};

/// Run `f`, converting a panic into an error carrying the panic message.
pub(crate) fn guarded<R>(token: &str, f: impl FnOnce() -> R) -> Result<R, String> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let message = panic_message(payload.as_ref());
        tracing::warn!(token, error = %message, "Custom rule panicked during evaluation");
        message
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "The custom rule panicked.".to_string()
    }
}

pub(super) fn check_must(
    token: &str,
    value: &Value,
    predicate: &ValuePredicate,
    message: &str,
) -> Result<(), String> {
    if guarded(token, || predicate(value))? {
        Ok(())
    } else {
        Err(message.to_string())
    }
}

pub(super) fn check_func(token: &str, value: &Value, func: &FuncCheck) -> Result<(), String> {
    let outcome = guarded(token, || func(value))?;
    if outcome.is_valid {
        Ok(())
    } else {
        Err(outcome
            .message
            .unwrap_or_else(|| "The value did not satisfy the custom rule.".to_string()))
    }
}

/// Deserialize `value` into `V` before handing it to a typed predicate.
pub(super) fn typed<V: DeserializeOwned>(value: &Value) -> Result<V, String> {
    serde_json::from_value(value.clone()).map_err(|e| {
        format!(
            "The value cannot be read as {}: {e}",
            std::any::type_name::<V>()
        )
    })
}
