//! Verification result types.
//!
//! A [`VerifyResult`] holds zero or more [`VerifyFailure`]s, one per failing
//! member per tier, and each failure holds the [`VerifyError`]s of the
//! individual rules that did not hold. Results are values: merging builds a
//! new result and never touches its inputs.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;

/// Member name used for failures that concern the whole object.
pub const INSTANCE_MEMBER: &str = "Instance";

/// Member name used for failures that concern a key/value record as a whole.
pub const KEY_VALUE_MEMBER: &str = "KeyValueCollection";

/// Member name used for failures that concern a basic value.
pub const BASIC_TYPE_MEMBER: &str = "BasicType";

/// Whether a rule came with the engine or was supplied by the caller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ValidatorTier {
    BuiltIn,
    Custom,
}

/// One rule's failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerifyError {
    pub error_message: String,
    pub validator_name: String,
    pub tier: ValidatorTier,
}

impl VerifyError {
    pub fn new(
        error_message: impl Into<String>,
        validator_name: impl Into<String>,
        tier: ValidatorTier,
    ) -> Self {
        Self {
            error_message: error_message.into(),
            validator_name: validator_name.into(),
            tier,
        }
    }
}

/// All errors reported for one member by one source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerifyFailure {
    pub member_name: String,
    pub message: String,
    pub value: Value,
    pub details: Vec<VerifyError>,
}

impl VerifyFailure {
    /// Group `details` under `member_name` with the standard summary message.
    pub fn new(member_name: impl Into<String>, value: Value, details: Vec<VerifyError>) -> Self {
        let member_name = member_name.into();
        let message = summary_message(&member_name, details.len());
        Self {
            member_name,
            message,
            value,
            details,
        }
    }

    /// A failure with an explicit message and a single detail of the same text.
    pub fn single(
        member_name: impl Into<String>,
        value: Value,
        message: impl Into<String>,
        validator_name: impl Into<String>,
        tier: ValidatorTier,
    ) -> Self {
        let message = message.into();
        Self {
            member_name: member_name.into(),
            details: vec![VerifyError::new(message.clone(), validator_name, tier)],
            message,
            value,
        }
    }
}

fn summary_message(member_name: &str, count: usize) -> String {
    if count == 1 {
        format!("Member '{member_name}' has 1 error.")
    } else {
        format!("Member '{member_name}' has {count} errors.")
    }
}

/// Aggregated outcome of a verification call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VerifyResult {
    errors: Vec<VerifyFailure>,
    member_names: IndexSet<String>,
}

impl VerifyResult {
    pub fn success() -> Self {
        Self::default()
    }

    pub fn from_failure(failure: VerifyFailure) -> Self {
        Self::from_failures(vec![failure])
    }

    pub fn from_failures(errors: Vec<VerifyFailure>) -> Self {
        let member_names = errors.iter().map(|f| f.member_name.clone()).collect();
        Self {
            errors,
            member_names,
        }
    }

    /// Concatenate results in iteration order; `None` entries are skipped.
    ///
    /// Failures are never de-duplicated: two sources reporting the same
    /// member both appear, each with its own details.
    pub fn merge<I>(results: I) -> Self
    where
        I: IntoIterator<Item = Option<VerifyResult>>,
    {
        let mut merged = Self::default();
        for result in results.into_iter().flatten() {
            merged.member_names.extend(result.member_names);
            merged.errors.extend(result.errors);
        }
        merged
    }

    /// Result used when a null instance is verified and the options say so.
    pub fn null_reference() -> Self {
        Self::from_failure(VerifyFailure::single(
            INSTANCE_MEMBER,
            Value::Null,
            "The instance to be verified is null.",
            "Null Reference",
            ValidatorTier::BuiltIn,
        ))
    }

    /// Result used when no tier had anything to say about a type.
    pub fn unregistered_type(type_name: &str) -> Self {
        Self::from_failure(VerifyFailure::single(
            INSTANCE_MEMBER,
            Value::Null,
            format!("No validation project is registered for type {type_name}."),
            "Unregistered Type",
            ValidatorTier::BuiltIn,
        ))
    }

    /// Result used when a single member is verified but the type lacks it.
    pub fn member_not_found(member_name: &str) -> Self {
        Self::from_failure(VerifyFailure::single(
            member_name,
            Value::Null,
            format!("Member '{member_name}' does not exist."),
            "Member Not Found",
            ValidatorTier::BuiltIn,
        ))
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[VerifyFailure] {
        &self.errors
    }

    pub fn member_names(&self) -> &IndexSet<String> {
        &self.member_names
    }

    /// Failures reported for `member_name`, in report order.
    pub fn failures_for<'a>(
        &'a self,
        member_name: &'a str,
    ) -> impl Iterator<Item = &'a VerifyFailure> + 'a {
        self.errors
            .iter()
            .filter(move |f| f.member_name == member_name)
    }

    /// Convert an invalid report into [`ValidationError::Invalid`].
    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ValidationError::Invalid(self))
        }
    }
}

/// Outcome of a custom `Func` rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomVerifyResult {
    pub is_valid: bool,
    pub message: Option<String>,
}

impl CustomVerifyResult {
    pub fn success() -> Self {
        Self {
            is_valid: true,
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            message: Some(message.into()),
        }
    }
}
