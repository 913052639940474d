//! The aggregator: runs the three tiers and merges their reports.
//!
//! Tier order is fixed: project rule sets, then custom validators, then
//! annotations. A tier that has nothing to say returns `None`; when all three
//! do, the unregistered-type policy of [`ValidationOptions`] decides.

use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::annotation::AnnotationValidator;
use super::custom::{CustomValidator, CustomValidatorManager};
use crate::context::{MemberContext, ObjectContext};
use crate::contract::{Contract, ContractCache, Verifiable};
use crate::error::ValidationError;
use crate::options::ValidationOptions;
use crate::project::ProjectManager;
use crate::result::{ValidatorTier, VerifyFailure, VerifyResult};
use crate::tokens::guarded;
use crate::types::TypeKey;

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

/// Shared state of every validator handed out by one provider.
#[derive(Clone)]
pub(crate) struct Aggregator {
    contracts: Arc<ContractCache>,
    projects: Arc<ProjectManager>,
    custom: Arc<CustomValidatorManager>,
    options: ValidationOptions,
    project: Option<String>,
}

impl Aggregator {
    pub(crate) fn new(
        contracts: Arc<ContractCache>,
        projects: Arc<ProjectManager>,
        custom: Arc<CustomValidatorManager>,
        options: ValidationOptions,
        project: Option<String>,
    ) -> Self {
        Self {
            contracts,
            projects,
            custom,
            options,
            project,
        }
    }

    fn project_name(&self) -> Option<&str> {
        self.project.as_deref()
    }

    /// Verify a whole object.
    fn verify(&self, context: &ObjectContext<'_>) -> VerifyResult {
        let first = self
            .projects
            .try_resolve(context.type_key(), self.project_name())
            .map(|project| project.verify(context));
        self.finish(context, first)
    }

    /// Verify the members present in a key/value record.
    fn verify_many(&self, context: &ObjectContext<'_>) -> VerifyResult {
        let first = self
            .projects
            .try_resolve(context.type_key(), self.project_name())
            .map(|project| project.verify_many(context));
        self.finish(context, first)
    }

    fn finish(&self, context: &ObjectContext<'_>, first: Option<VerifyResult>) -> VerifyResult {
        let second = if self.options.custom_validator_enabled {
            merge_applicable(self.custom.resolve_all().iter().map(|validator| {
                run_custom(&**validator, context.instance_name(), || {
                    validator.verify(context)
                })
            }))
        } else {
            None
        };
        let third = if self.options.annotation_enabled {
            AnnotationValidator.verify(context)
        } else {
            None
        };
        self.combine(context.type_key(), [first, second, third])
    }

    /// Verify one member value of `contract`, using only the rules
    /// registered for it.
    fn verify_member(&self, contract: &Contract, member: &MemberContext<'_>) -> VerifyResult {
        let type_key = contract.type_key();
        let first = self
            .projects
            .try_resolve(type_key, self.project_name())
            .map(|project| project.verify_one(member));
        let second = if self.options.custom_validator_enabled {
            merge_applicable(self.custom.resolve_all().iter().map(|validator| {
                run_custom(&**validator, member.name(), || validator.verify_one(member))
            }))
        } else {
            None
        };
        let third = if self.options.annotation_enabled {
            AnnotationValidator.verify_one(contract, member)
        } else {
            None
        };
        self.combine(type_key, [first, second, third])
    }

    fn combine(&self, type_key: &TypeKey, tiers: [Option<VerifyResult>; 3]) -> VerifyResult {
        let result = if tiers.iter().all(Option::is_none) {
            if self.options.failure_if_project_not_match {
                VerifyResult::unregistered_type(type_key.name())
            } else {
                VerifyResult::success()
            }
        } else {
            VerifyResult::merge(tiers)
        };
        tracing::trace!(
            type_name = %type_key,
            project = self.project_name().unwrap_or("<default>"),
            is_valid = result.is_valid(),
            failures = result.errors().len(),
            "Verification finished",
        );
        result
    }

    fn null_instance(&self) -> VerifyResult {
        if self.options.failure_if_instance_is_null {
            VerifyResult::null_reference()
        } else {
            VerifyResult::success()
        }
    }

    /// A null member value follows the null-instance option.
    fn verify_detached(&self, contract: &Contract, member: &str, value: Value) -> VerifyResult {
        match contract.member(member) {
            Some(_) if value.is_null() => self.null_instance(),
            Some(descriptor) => {
                let context = MemberContext::detached(descriptor.clone(), value);
                self.verify_member(contract, &context)
            }
            None => VerifyResult::member_not_found(member),
        }
    }
}

/// Run one custom validator. A panic becomes a single failure reported
/// under `member_name`.
fn run_custom(
    validator: &dyn CustomValidator,
    member_name: &str,
    verify: impl FnOnce() -> Option<VerifyResult>,
) -> Option<VerifyResult> {
    guarded(validator.name(), verify).unwrap_or_else(|message| {
        Some(VerifyResult::from_failure(VerifyFailure::single(
            member_name,
            Value::Null,
            message,
            validator.name(),
            ValidatorTier::Custom,
        )))
    })
}

/// `None` when no validator opted in.
fn merge_applicable(results: impl Iterator<Item = Option<VerifyResult>>) -> Option<VerifyResult> {
    let applicable: Vec<_> = results.flatten().collect();
    if applicable.is_empty() {
        None
    } else {
        Some(VerifyResult::merge(applicable.into_iter().map(Some)))
    }
}

// ---------------------------------------------------------------------------
// AggregationValidator
// ---------------------------------------------------------------------------

/// Validator for instances of `T`.
pub struct AggregationValidator<T> {
    aggregator: Aggregator,
    contract: Arc<Contract>,
    _marker: PhantomData<fn(&T)>,
}

impl<T> std::fmt::Debug for AggregationValidator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregationValidator")
            .field("project_name", &self.aggregator.project_name())
            .finish_non_exhaustive()
    }
}

impl<T> Clone for AggregationValidator<T> {
    fn clone(&self) -> Self {
        Self {
            aggregator: self.aggregator.clone(),
            contract: self.contract.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Verifiable> AggregationValidator<T> {
    pub(crate) fn new(aggregator: Aggregator) -> Result<Self, ValidationError> {
        let contract = aggregator.contracts.resolve::<T>()?;
        Ok(Self {
            aggregator,
            contract,
            _marker: PhantomData,
        })
    }

    pub fn contract(&self) -> &Arc<Contract> {
        &self.contract
    }

    pub fn project_name(&self) -> Option<&str> {
        self.aggregator.project_name()
    }

    pub fn verify(&self, instance: &T) -> VerifyResult {
        let context = ObjectContext::for_instance(self.contract.clone(), instance);
        self.aggregator.verify(&context)
    }

    /// Like [`verify`](Self::verify); a missing instance follows the
    /// null-instance option.
    pub fn verify_opt(&self, instance: Option<&T>) -> VerifyResult {
        match instance {
            Some(instance) => self.verify(instance),
            None => self.aggregator.null_instance(),
        }
    }

    /// Verify `value` as member `member` of `T`, without an instance. A null
    /// value follows the null-instance option.
    pub fn verify_one(&self, member: &str, value: impl Into<Value>) -> VerifyResult {
        self.aggregator
            .verify_detached(&self.contract, member, value.into())
    }

    /// Verify member `member` of `instance`. Context-aware annotations see
    /// the rest of the instance.
    pub fn verify_one_with_instance(&self, instance: &T, member: &str) -> VerifyResult {
        let context = ObjectContext::for_instance(self.contract.clone(), instance);
        match context.member(member) {
            Some(member) => self.aggregator.verify_member(&self.contract, &member),
            None => VerifyResult::member_not_found(member),
        }
    }

    /// Verify a key/value record standing in for `T`. Only members present
    /// in the record are checked by rule sets.
    pub fn verify_many(&self, record: &Map<String, Value>) -> VerifyResult {
        let context = ObjectContext::for_key_value(self.contract.clone(), record);
        self.aggregator.verify_many(&context)
    }
}

// ---------------------------------------------------------------------------
// DynamicValidator
// ---------------------------------------------------------------------------

/// Validator for any type, chosen per call.
#[derive(Clone)]
pub struct DynamicValidator {
    aggregator: Aggregator,
}

impl std::fmt::Debug for DynamicValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicValidator")
            .field("project_name", &self.aggregator.project_name())
            .finish_non_exhaustive()
    }
}

impl DynamicValidator {
    pub(crate) fn new(aggregator: Aggregator) -> Self {
        Self { aggregator }
    }

    pub fn project_name(&self) -> Option<&str> {
        self.aggregator.project_name()
    }

    /// Verify an instance of a [`Verifiable`] type.
    pub fn verify<T: Verifiable>(&self, instance: &T) -> Result<VerifyResult, ValidationError> {
        let contract = self.aggregator.contracts.resolve::<T>()?;
        let context = ObjectContext::for_instance(contract, instance);
        Ok(self.aggregator.verify(&context))
    }

    /// Verify a record standing in for `type_key`.
    pub fn verify_record(&self, type_key: &TypeKey, record: &Map<String, Value>) -> VerifyResult {
        let contract = self.aggregator.contracts.resolve_with_record(type_key, record);
        let context = ObjectContext::for_key_value(contract, record);
        self.aggregator.verify(&context)
    }

    /// Verify an untyped value: null follows the null-instance option,
    /// objects are records, anything else is a basic or collection value.
    pub fn verify_value(&self, type_key: &TypeKey, value: &Value) -> VerifyResult {
        match value {
            Value::Null => self.aggregator.null_instance(),
            Value::Object(record) => self.verify_record(type_key, record),
            other => {
                let contract = self.aggregator.contracts.resolve_with_instance(type_key, other);
                let context = ObjectContext::for_value(contract, other);
                self.aggregator.verify(&context)
            }
        }
    }

    pub fn verify_one(&self, type_key: &TypeKey, member: &str, value: impl Into<Value>) -> VerifyResult {
        let contract = self.aggregator.contracts.resolve_key(type_key);
        self.aggregator.verify_detached(&contract, member, value.into())
    }

    /// Verify the members present in `record`.
    pub fn verify_many(&self, type_key: &TypeKey, record: &Map<String, Value>) -> VerifyResult {
        let contract = self.aggregator.contracts.resolve_with_record(type_key, record);
        let context = ObjectContext::for_key_value(contract, record);
        self.aggregator.verify_many(&context)
    }
}
