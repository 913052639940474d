//! Rule tokens: atomic, named checks over a single value.
//!
//! A [`RuleToken`] pairs an operation kind ([`TokenOps`]) with the data the
//! check needs (bounds, reference values, predicates). Tokens are immutable
//! once built and cheap to clone; predicates are shared behind `Arc`.
//!
//! Evaluation dispatches on the check variant to one function per family,
//! each returning `Result<(), String>` where the error is the failure message.
//!
//! Tokens that share a mutual-exclusion group (see [`groups`]) replace one
//! another when appended to the same rule slot.

mod compare;
mod length;
mod membership;
mod predicate;
mod quantifier;
mod range;
mod typing;

pub(crate) use predicate::guarded;

use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::result::{
    CustomVerifyResult, ValidatorTier, VerifyError, VerifyFailure, VerifyResult,
    BASIC_TYPE_MEMBER,
};
use crate::types::{TypeKey, TypeSet};

pub use compare::{compare, values_equal, Comparison};
pub(crate) use compare::is_empty;
pub use range::RangeOptions;

/// Predicate over a whole value.
pub type ValuePredicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Predicate over one element of a collection.
pub type ItemPredicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Custom rule returning its own verdict and message.
pub type FuncCheck = Arc<dyn Fn(&Value) -> CustomVerifyResult + Send + Sync>;

const EMAIL_PATTERN: &str = r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$";

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN).expect("valid regex"));

/// Mutual-exclusion group identifiers.
pub mod groups {
    pub const NULLITY: u32 = 1;
    pub const EMPTINESS: u32 = 2;
    pub const EQUALITY: u32 = 3;
    pub const LOWER_BOUND: u32 = 4;
    pub const UPPER_BOUND: u32 = 5;
    pub const MIN_LENGTH: u32 = 6;
    pub const MAX_LENGTH: u32 = 7;
    pub const REQUIRED_TYPES: u32 = 8;
}

// ---------------------------------------------------------------------------
// TokenOps
// ---------------------------------------------------------------------------

/// Operation kind of a rule token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenOps {
    Null,
    NotNull,
    Empty,
    NotEmpty,
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Range,
    Length,
    MinLength,
    MaxLength,
    AtLeast,
    In,
    NotIn,
    Any,
    All,
    RequiredTypes,
    Is,
    IsNot,
    Matches,
    Must,
    Predicate,
    Func,
}

impl TokenOps {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::NotNull => "not_null",
            Self::Empty => "empty",
            Self::NotEmpty => "not_empty",
            Self::Equal => "equal",
            Self::NotEqual => "not_equal",
            Self::GreaterThan => "greater_than",
            Self::GreaterThanOrEqual => "greater_than_or_equal",
            Self::LessThan => "less_than",
            Self::LessThanOrEqual => "less_than_or_equal",
            Self::Range => "range",
            Self::Length => "length",
            Self::MinLength => "min_length",
            Self::MaxLength => "max_length",
            Self::AtLeast => "at_least",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::Any => "any",
            Self::All => "all",
            Self::RequiredTypes => "required_types",
            Self::Is => "is",
            Self::IsNot => "is_not",
            Self::Matches => "matches",
            Self::Must => "must",
            Self::Predicate => "predicate",
            Self::Func => "func",
        }
    }

    /// Mutual-exclusion groups this operation occupies.
    pub fn exclusive_groups(&self) -> &'static [u32] {
        match self {
            Self::Null | Self::NotNull => &[groups::NULLITY],
            Self::Empty | Self::NotEmpty => &[groups::EMPTINESS],
            Self::Equal | Self::NotEqual => &[groups::EQUALITY],
            Self::GreaterThan | Self::GreaterThanOrEqual => &[groups::LOWER_BOUND],
            Self::LessThan | Self::LessThanOrEqual => &[groups::UPPER_BOUND],
            Self::Range => &[groups::LOWER_BOUND, groups::UPPER_BOUND],
            Self::Length => &[groups::MIN_LENGTH, groups::MAX_LENGTH],
            Self::MinLength => &[groups::MIN_LENGTH],
            Self::MaxLength => &[groups::MAX_LENGTH],
            Self::RequiredTypes | Self::Is | Self::IsNot => &[groups::REQUIRED_TYPES],
            Self::AtLeast
            | Self::In
            | Self::NotIn
            | Self::Any
            | Self::All
            | Self::Matches
            | Self::Must
            | Self::Predicate
            | Self::Func => &[],
        }
    }

    /// Caller-supplied logic is reported under the custom tier.
    pub fn tier(&self) -> ValidatorTier {
        match self {
            Self::Must | Self::Predicate | Self::Func => ValidatorTier::Custom,
            _ => ValidatorTier::BuiltIn,
        }
    }
}

impl fmt::Display for TokenOps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// CorrectVerifyVal
// ---------------------------------------------------------------------------

/// Outcome of evaluating one token against one value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrectVerifyVal {
    pub is_success: bool,
    pub verified_value: Value,
    pub token_name: String,
    pub tier: ValidatorTier,
    pub error_message: Option<String>,
}

impl CorrectVerifyVal {
    /// The failure as a [`VerifyError`], if the token did not hold.
    pub fn to_error(&self) -> Option<VerifyError> {
        if self.is_success {
            return None;
        }
        let message = self.error_message.clone().unwrap_or_default();
        Some(VerifyError::new(message, self.token_name.clone(), self.tier))
    }
}

// ---------------------------------------------------------------------------
// RuleToken
// ---------------------------------------------------------------------------

#[derive(Clone)]
enum Check {
    Null,
    NotNull,
    Empty,
    NotEmpty,
    Equal(Value),
    NotEqual(Value),
    Compare(Value, Comparison),
    Range {
        from: Value,
        to: Value,
        options: RangeOptions,
    },
    Length {
        min: Option<usize>,
        max: Option<usize>,
    },
    AtLeast(usize),
    In(Vec<Value>),
    NotIn(Vec<Value>),
    Any(ItemPredicate),
    All(ItemPredicate),
    Types {
        declared: TypeKey,
        candidates: Vec<TypeKey>,
        negate: bool,
    },
    Matches(Regex),
    Must {
        predicate: ValuePredicate,
        message: String,
    },
    Func(FuncCheck),
}

/// One atomic validation check.
#[derive(Clone)]
pub struct RuleToken {
    ops: TokenOps,
    name: Option<String>,
    message: Option<String>,
    null_as_zero: bool,
    check: Check,
}

impl RuleToken {
    fn new(ops: TokenOps, check: Check) -> Self {
        Self {
            ops,
            name: None,
            message: None,
            null_as_zero: false,
            check,
        }
    }

    pub fn null() -> Self {
        Self::new(TokenOps::Null, Check::Null)
    }

    pub fn not_null() -> Self {
        Self::new(TokenOps::NotNull, Check::NotNull)
    }

    pub fn empty() -> Self {
        Self::new(TokenOps::Empty, Check::Empty)
    }

    pub fn not_empty() -> Self {
        Self::new(TokenOps::NotEmpty, Check::NotEmpty)
    }

    pub fn equal(value: impl Into<Value>) -> Self {
        Self::new(TokenOps::Equal, Check::Equal(value.into()))
    }

    pub fn not_equal(value: impl Into<Value>) -> Self {
        Self::new(TokenOps::NotEqual, Check::NotEqual(value.into()))
    }

    pub fn greater_than(bound: impl Into<Value>) -> Self {
        Self::new(
            TokenOps::GreaterThan,
            Check::Compare(bound.into(), Comparison::GreaterThan),
        )
    }

    pub fn greater_than_or_equal(bound: impl Into<Value>) -> Self {
        Self::new(
            TokenOps::GreaterThanOrEqual,
            Check::Compare(bound.into(), Comparison::GreaterThanOrEqual),
        )
    }

    pub fn less_than(bound: impl Into<Value>) -> Self {
        Self::new(
            TokenOps::LessThan,
            Check::Compare(bound.into(), Comparison::LessThan),
        )
    }

    pub fn less_than_or_equal(bound: impl Into<Value>) -> Self {
        Self::new(
            TokenOps::LessThanOrEqual,
            Check::Compare(bound.into(), Comparison::LessThanOrEqual),
        )
    }

    pub fn range(from: impl Into<Value>, to: impl Into<Value>, options: RangeOptions) -> Self {
        Self::new(
            TokenOps::Range,
            Check::Range {
                from: from.into(),
                to: to.into(),
                options,
            },
        )
    }

    /// Size must lie in `min..=max`.
    pub fn length(min: usize, max: usize) -> Self {
        Self::new(
            TokenOps::Length,
            Check::Length {
                min: Some(min),
                max: Some(max),
            },
        )
    }

    pub fn min_length(min: usize) -> Self {
        Self::new(
            TokenOps::MinLength,
            Check::Length {
                min: Some(min),
                max: None,
            },
        )
    }

    pub fn max_length(max: usize) -> Self {
        Self::new(
            TokenOps::MaxLength,
            Check::Length {
                min: None,
                max: Some(max),
            },
        )
    }

    /// Collection must hold at least `count` items.
    pub fn at_least(count: usize) -> Self {
        Self::new(TokenOps::AtLeast, Check::AtLeast(count))
    }

    pub fn in_values<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::new(
            TokenOps::In,
            Check::In(values.into_iter().map(Into::into).collect()),
        )
    }

    pub fn not_in<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::new(
            TokenOps::NotIn,
            Check::NotIn(values.into_iter().map(Into::into).collect()),
        )
    }

    /// At least one element must satisfy `predicate`. Empty input fails.
    pub fn any<F>(predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::new(TokenOps::Any, Check::Any(Arc::new(predicate)))
    }

    /// Every element must satisfy `predicate`.
    pub fn all<F>(predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::new(TokenOps::All, Check::All(Arc::new(predicate)))
    }

    /// The `declared` type must be one of the types in `S` (a tuple of up to
    /// sixteen types).
    pub fn required_types<S: TypeSet>(declared: &TypeKey) -> Self {
        Self::new(
            TokenOps::RequiredTypes,
            Check::Types {
                declared: declared.clone(),
                candidates: S::type_keys(),
                negate: false,
            },
        )
    }

    pub fn is<V: ?Sized + 'static>(declared: &TypeKey) -> Self {
        Self::new(
            TokenOps::Is,
            Check::Types {
                declared: declared.clone(),
                candidates: vec![TypeKey::of::<V>()],
                negate: false,
            },
        )
    }

    pub fn is_not<V: ?Sized + 'static>(declared: &TypeKey) -> Self {
        Self::new(
            TokenOps::IsNot,
            Check::Types {
                declared: declared.clone(),
                candidates: vec![TypeKey::of::<V>()],
                negate: true,
            },
        )
    }

    pub fn matches(pattern: Regex) -> Self {
        Self::new(TokenOps::Matches, Check::Matches(pattern))
    }

    pub fn email() -> Self {
        Self::matches(EMAIL_RE.clone())
            .named("email")
            .with_message("The value is not a valid e-mail address.")
    }

    /// Value must satisfy `predicate`; `message` is reported otherwise.
    pub fn must<F>(predicate: F, message: impl Into<String>) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::new(
            TokenOps::Must,
            Check::Must {
                predicate: Arc::new(predicate),
                message: message.into(),
            },
        )
    }

    /// Like [`RuleToken::must`], reading the value as `V` first. A value that
    /// cannot be read as `V` fails.
    pub fn must_typed<V, F>(check: F, message: impl Into<String>) -> Self
    where
        V: DeserializeOwned + 'static,
        F: Fn(&V) -> bool + Send + Sync + 'static,
    {
        let message = message.into();
        let func: FuncCheck = Arc::new(move |value| match predicate::typed::<V>(value) {
            Ok(typed) if check(&typed) => CustomVerifyResult::success(),
            Ok(_) => CustomVerifyResult::failure(message.clone()),
            Err(e) => CustomVerifyResult::failure(e),
        });
        Self::new(TokenOps::Must, Check::Func(func))
    }

    pub fn predicate<F>(check: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::new(
            TokenOps::Predicate,
            Check::Must {
                predicate: Arc::new(check),
                message: "The value did not satisfy the predicate.".to_string(),
            },
        )
    }

    pub fn func<F>(func: F) -> Self
    where
        F: Fn(&Value) -> CustomVerifyResult + Send + Sync + 'static,
    {
        Self::new(TokenOps::Func, Check::Func(Arc::new(func)))
    }

    /// Override the token's name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Override the failure message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Treat null as a zero-length value in length checks.
    pub fn null_as_zero(mut self) -> Self {
        self.null_as_zero = true;
        self
    }

    pub fn ops(&self) -> TokenOps {
        self.ops
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.ops.as_str())
    }

    pub fn tier(&self) -> ValidatorTier {
        self.ops.tier()
    }

    pub fn exclusive_groups(&self) -> &'static [u32] {
        self.ops.exclusive_groups()
    }

    pub fn mutually_exclusive(&self) -> bool {
        !self.exclusive_groups().is_empty()
    }

    /// Whether appending `other` after `self` replaces `self`.
    pub fn conflicts_with(&self, other: &RuleToken) -> bool {
        self.exclusive_groups()
            .iter()
            .any(|group| other.exclusive_groups().contains(group))
    }

    pub fn evaluate(&self, value: &Value) -> CorrectVerifyVal {
        let outcome = self.run(value);
        CorrectVerifyVal {
            is_success: outcome.is_ok(),
            verified_value: value.clone(),
            token_name: self.name().to_string(),
            tier: self.tier(),
            error_message: outcome
                .err()
                .map(|computed| self.message.clone().unwrap_or(computed)),
        }
    }

    /// Evaluate as a standalone basic value.
    pub fn verify(&self, value: &Value) -> VerifyResult {
        match self.evaluate(value).to_error() {
            None => VerifyResult::success(),
            Some(error) => VerifyResult::from_failure(VerifyFailure::new(
                BASIC_TYPE_MEMBER,
                value.clone(),
                vec![error],
            )),
        }
    }

    fn run(&self, value: &Value) -> Result<(), String> {
        let name = self.name();
        match &self.check {
            Check::Null => compare::check_null(value),
            Check::NotNull => compare::check_not_null(value),
            Check::Empty => compare::check_empty(value),
            Check::NotEmpty => compare::check_not_empty(value),
            Check::Equal(expected) => compare::check_equal(value, expected),
            Check::NotEqual(expected) => compare::check_not_equal(value, expected),
            Check::Compare(bound, comparison) => compare::check_compare(value, bound, *comparison),
            Check::Range { from, to, options } => range::check_range(value, from, to, *options),
            Check::Length { min, max } => length::check_length(value, *min, *max, self.null_as_zero),
            Check::AtLeast(count) => length::check_at_least(value, *count, self.null_as_zero),
            Check::In(reference) => membership::check_in(value, reference),
            Check::NotIn(reference) => membership::check_not_in(value, reference),
            Check::Any(predicate) => quantifier::check_any(name, value, predicate),
            Check::All(predicate) => quantifier::check_all(name, value, predicate),
            Check::Types {
                declared,
                candidates,
                negate,
            } => typing::check_types(declared, candidates, *negate),
            Check::Matches(pattern) => match value {
                Value::String(s) if pattern.is_match(s) => Ok(()),
                Value::String(_) => Err(format!("The value does not match the pattern {pattern}.")),
                _ => Err("Only string values can be matched against a pattern.".into()),
            },
            Check::Must {
                predicate: test,
                message,
            } => predicate::check_must(name, value, test, message),
            Check::Func(func) => predicate::check_func(name, value, func),
        }
    }
}

impl fmt::Display for RuleToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Debug for RuleToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleToken")
            .field("ops", &self.ops)
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}
