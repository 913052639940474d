//! Custom validators (the second tier) and their registry.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::context::{MemberContext, ObjectContext};
use crate::result::VerifyResult;

/// A named validator consulted for every verification.
///
/// Each validator decides for itself whether a context concerns it and
/// returns `None` to opt out.
pub trait CustomValidator: Send + Sync {
    fn name(&self) -> &str;

    fn verify(&self, context: &ObjectContext<'_>) -> Option<VerifyResult>;

    /// Verify a single member value. Validators that only understand whole
    /// objects opt out.
    fn verify_one(&self, _member: &MemberContext<'_>) -> Option<VerifyResult> {
        None
    }
}

/// Stand-in returned for unknown names. Opts out of everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct SealedValidator;

impl CustomValidator for SealedValidator {
    fn name(&self) -> &str {
        "Sealed"
    }

    fn verify(&self, _context: &ObjectContext<'_>) -> Option<VerifyResult> {
        None
    }
}

// ---------------------------------------------------------------------------
// FnValidator
// ---------------------------------------------------------------------------

/// A closure validator for instances of `T`. Contexts that do not wrap a `T`
/// are skipped.
pub struct FnValidator<T, F> {
    name: String,
    verify: F,
    _marker: PhantomData<fn(&T)>,
}

impl<T, F> FnValidator<T, F>
where
    T: 'static,
    F: Fn(&T) -> VerifyResult + Send + Sync,
{
    pub fn new(name: impl Into<String>, verify: F) -> Self {
        Self {
            name: name.into(),
            verify,
            _marker: PhantomData,
        }
    }
}

impl<T, F> CustomValidator for FnValidator<T, F>
where
    T: 'static,
    F: Fn(&T) -> VerifyResult + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn verify(&self, context: &ObjectContext<'_>) -> Option<VerifyResult> {
        context.instance::<T>().map(|instance| (self.verify)(instance))
    }
}

// ---------------------------------------------------------------------------
// CustomValidatorManager
// ---------------------------------------------------------------------------

/// Registry of custom validators, keyed by name, in registration order.
#[derive(Default)]
pub struct CustomValidatorManager {
    validators: RwLock<IndexMap<String, Arc<dyn CustomValidator>>>,
}

impl CustomValidatorManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `validator`. A name already taken keeps its first validator
    /// and this call returns `false`.
    pub fn register(&self, validator: Arc<dyn CustomValidator>) -> bool {
        let name = validator.name().to_string();
        let mut validators = self.validators.write();
        if validators.contains_key(&name) {
            tracing::debug!(validator = %name, "Custom validator already registered, keeping the first");
            return false;
        }
        tracing::debug!(validator = %name, "Custom validator registered");
        validators.insert(name, validator);
        true
    }

    /// The validator named `name`, or a [`SealedValidator`].
    pub fn resolve(&self, name: &str) -> Arc<dyn CustomValidator> {
        self.validators
            .read()
            .get(name)
            .cloned()
            .unwrap_or_else(|| Arc::new(SealedValidator))
    }

    /// Every validator, in registration order.
    pub fn resolve_all(&self) -> Vec<Arc<dyn CustomValidator>> {
        self.validators.read().values().cloned().collect()
    }

    /// Validators accepted by `filter`, in registration order.
    pub fn resolve_by<F>(&self, filter: F) -> Vec<Arc<dyn CustomValidator>>
    where
        F: Fn(&dyn CustomValidator) -> bool,
    {
        self.validators
            .read()
            .values()
            .filter(|validator| filter(validator.as_ref()))
            .cloned()
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.validators.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.validators.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.read().is_empty()
    }
}

impl fmt::Debug for CustomValidatorManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomValidatorManager")
            .field("validators", &self.validators.read().keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{Contract, MemberDescriptor};
    use crate::result::{ValidatorTier, VerifyFailure};
    use crate::types::TypeKey;
    use serde_json::{json, Map, Value};

    struct Named(&'static str, &'static str);

    impl CustomValidator for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn verify(&self, _context: &ObjectContext<'_>) -> Option<VerifyResult> {
            Some(VerifyResult::from_failure(VerifyFailure::single(
                "x",
                Value::Null,
                self.1,
                self.0,
                ValidatorTier::Custom,
            )))
        }
    }

    #[test]
    fn first_registration_wins() {
        let manager = CustomValidatorManager::new();
        assert!(manager.register(Arc::new(Named("Audit", "first"))));
        assert!(!manager.register(Arc::new(Named("Audit", "second"))));
        assert_eq!(manager.len(), 1);

        let contract = Arc::new(Contract::basic(TypeKey::of::<i32>()));
        let value = json!(1);
        let context = ObjectContext::for_value(contract, &value);
        let result = manager.resolve("Audit").verify(&context).unwrap();
        assert_eq!(result.errors()[0].message, "first");
    }

    #[test]
    fn unknown_names_resolve_to_sealed() {
        let manager = CustomValidatorManager::new();
        let validator = manager.resolve("Missing");
        assert_eq!(validator.name(), "Sealed");
        let record = Map::new();
        let contract = Arc::new(Contract::from_map(TypeKey::named("R").unwrap(), &record));
        assert!(validator.verify(&ObjectContext::for_key_value(contract, &record)).is_none());
    }

    #[test]
    fn resolve_all_keeps_registration_order() {
        let manager = CustomValidatorManager::new();
        manager.register(Arc::new(Named("B", "")));
        manager.register(Arc::new(Named("A", "")));
        manager.register(Arc::new(Named("C", "")));
        let names: Vec<_> = manager
            .resolve_all()
            .iter()
            .map(|v| v.name().to_string())
            .collect();
        assert_eq!(names, vec!["B", "A", "C"]);
        assert_eq!(manager.resolve_by(|v| v.name() != "A").len(), 2);
    }

    struct Point {
        x: i32,
    }

    #[test]
    fn fn_validator_only_sees_its_type() {
        let validator = FnValidator::new("PositiveX", |p: &Point| {
            if p.x > 0 {
                VerifyResult::success()
            } else {
                VerifyResult::from_failure(VerifyFailure::single(
                    "x",
                    json!(p.x),
                    "x must be positive",
                    "PositiveX",
                    ValidatorTier::Custom,
                ))
            }
        });
        let contract = Arc::new(
            Contract::structure(
                TypeKey::of::<Point>(),
                vec![MemberDescriptor::keyed("x", TypeKey::of::<i32>())],
            )
            .unwrap(),
        );
        let point = Point { x: -1 };
        let result = validator
            .verify(&ObjectContext::for_instance(contract.clone(), &point))
            .unwrap();
        assert!(!result.is_valid());

        let other = 5_i32;
        assert!(validator
            .verify(&ObjectContext::for_instance(contract, &other))
            .is_none());
    }
}
