//! Bridges `validator` derive rules into the custom-validator tier.
//!
//! Register a [`ValidatorSink<T>`] on a provider and every verification of a
//! `T` also runs `T::validate()`. Field errors become failures reported
//! under the field name, in contract order; nested struct and list errors
//! are flattened to dotted paths (`address.city`, `items[2].sku`).

use std::marker::PhantomData;

use serde_json::Value;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};
use vouch_core::{
    Contract, CustomValidator, ObjectContext, ValidatorTier, Verifiable, VerifyError,
    VerifyFailure, VerifyResult,
};

/// Default name under which a sink registers.
pub const SINK_NAME: &str = "Validator";

/// Custom validator running the `validator` rules of `T`.
pub struct ValidatorSink<T> {
    name: String,
    _marker: PhantomData<fn(&T)>,
}

impl<T> Default for ValidatorSink<T>
where
    T: Validate + Verifiable,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ValidatorSink<T>
where
    T: Validate + Verifiable,
{
    /// A sink registered as `Validator<TypeName>`, so one sink per type can
    /// coexist on a provider.
    pub fn new() -> Self {
        Self::named(format!("{SINK_NAME}<{}>", std::any::type_name::<T>()))
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            _marker: PhantomData,
        }
    }
}

impl<T> CustomValidator for ValidatorSink<T>
where
    T: Validate + Verifiable,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn verify(&self, context: &ObjectContext<'_>) -> Option<VerifyResult> {
        let instance = context.instance::<T>()?;
        let result = match instance.validate() {
            Ok(()) => VerifyResult::success(),
            Err(errors) => to_verify_result(context, &errors),
        };
        if !result.is_valid() {
            tracing::debug!(
                sink = %self.name,
                failures = result.errors().len(),
                "Validator rules rejected instance",
            );
        }
        Some(result)
    }
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

/// Convert `errors` into a verification result for the object in `context`.
pub fn to_verify_result(context: &ObjectContext<'_>, errors: &ValidationErrors) -> VerifyResult {
    let mut failures = Vec::new();
    collect(context, None, errors, &mut failures);
    sort_by_contract(context.contract(), &mut failures);
    VerifyResult::from_failures(failures)
}

fn collect(
    context: &ObjectContext<'_>,
    prefix: Option<&str>,
    errors: &ValidationErrors,
    failures: &mut Vec<VerifyFailure>,
) {
    for (field, kind) in errors.errors() {
        let path = match prefix {
            Some(prefix) => format!("{prefix}.{field}"),
            None => field.to_string(),
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                let value = if prefix.is_none() {
                    context.value(&path).unwrap_or(Value::Null)
                } else {
                    Value::Null
                };
                let details = list.iter().map(to_verify_error).collect();
                failures.push(VerifyFailure::new(path, value, details));
            }
            ValidationErrorsKind::Struct(nested) => {
                collect(context, Some(&path), nested, failures);
            }
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect(context, Some(&format!("{path}[{index}]")), nested, failures);
                }
            }
        }
    }
}

fn to_verify_error(error: &ValidationError) -> VerifyError {
    let message = match &error.message {
        Some(message) => message.to_string(),
        None => format!("The value failed the '{}' check.", error.code),
    };
    VerifyError::new(message, error.code.to_string(), ValidatorTier::Custom)
}

/// `validator` reports from a hash map; order by the root member's contract
/// position, then by path.
fn sort_by_contract(contract: &Contract, failures: &mut [VerifyFailure]) {
    failures.sort_by(|a, b| {
        let rank = |failure: &VerifyFailure| {
            let root = failure
                .member_name
                .split(['.', '['])
                .next()
                .unwrap_or_default();
            contract.position(root).unwrap_or(usize::MAX)
        };
        rank(a)
            .cmp(&rank(b))
            .then_with(|| a.member_name.cmp(&b.member_name))
    });
}
