//! Declarative annotations attached to members and types.
//!
//! An [`Annotation`] comes in one of three shapes, dispatched by variant:
//!
//! - [`Annotation::Quiet`]: a pass/fail predicate with a fixed message.
//! - [`Annotation::Strong`]: returns a detailed [`VerifyResult`].
//! - [`Annotation::Contextual`]: sees the whole [`MemberContext`], including
//!   the parent object.
//!
//! The built-in constructors at the bottom of this module wrap rule tokens.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

use crate::context::MemberContext;
use crate::result::{ValidatorTier, VerifyError, VerifyResult};
use crate::tokens::{guarded, RangeOptions, RuleToken};
use crate::types::TypeKey;

type QuietFn = Arc<dyn Fn(&TypeKey, &Value) -> bool + Send + Sync>;
type StrongFn = Arc<dyn Fn(&TypeKey, &Value) -> VerifyResult + Send + Sync>;
type ContextFn = Arc<dyn Fn(&MemberContext<'_>) -> VerifyResult + Send + Sync>;

#[derive(Clone)]
pub struct QuietAnnotation {
    name: String,
    message: String,
    tier: ValidatorTier,
    check: QuietFn,
}

#[derive(Clone)]
pub struct StrongAnnotation {
    name: String,
    tier: ValidatorTier,
    verify: StrongFn,
}

#[derive(Clone)]
pub struct ContextAnnotation {
    name: String,
    tier: ValidatorTier,
    verify: ContextFn,
}

/// A declarative rule attached to a member or a type.
#[derive(Clone)]
pub enum Annotation {
    Quiet(QuietAnnotation),
    Strong(StrongAnnotation),
    Contextual(ContextAnnotation),
}

impl Annotation {
    /// A caller-supplied pass/fail annotation.
    pub fn quiet<F>(name: impl Into<String>, message: impl Into<String>, check: F) -> Self
    where
        F: Fn(&TypeKey, &Value) -> bool + Send + Sync + 'static,
    {
        Self::Quiet(QuietAnnotation {
            name: name.into(),
            message: message.into(),
            tier: ValidatorTier::Custom,
            check: Arc::new(check),
        })
    }

    /// A caller-supplied annotation returning a detailed result.
    pub fn strong<F>(name: impl Into<String>, verify: F) -> Self
    where
        F: Fn(&TypeKey, &Value) -> VerifyResult + Send + Sync + 'static,
    {
        Self::Strong(StrongAnnotation {
            name: name.into(),
            tier: ValidatorTier::Custom,
            verify: Arc::new(verify),
        })
    }

    /// A caller-supplied annotation that sees the member context.
    pub fn contextual<F>(name: impl Into<String>, verify: F) -> Self
    where
        F: Fn(&MemberContext<'_>) -> VerifyResult + Send + Sync + 'static,
    {
        Self::Contextual(ContextAnnotation {
            name: name.into(),
            tier: ValidatorTier::Custom,
            verify: Arc::new(verify),
        })
    }

    /// A built-in annotation backed by a rule token.
    pub fn from_token(token: RuleToken) -> Self {
        let name = token.name().to_string();
        Self::Strong(StrongAnnotation {
            name,
            tier: ValidatorTier::BuiltIn,
            verify: Arc::new(move |_, value| token.verify(value)),
        })
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Quiet(a) => &a.name,
            Self::Strong(a) => &a.name,
            Self::Contextual(a) => &a.name,
        }
    }

    pub fn tier(&self) -> ValidatorTier {
        match self {
            Self::Quiet(a) => a.tier,
            Self::Strong(a) => a.tier,
            Self::Contextual(a) => a.tier,
        }
    }

    /// Evaluate against `context`, returning the errors found. A panic in
    /// the annotation's closure is reported as one error.
    pub fn evaluate(&self, context: &MemberContext<'_>) -> Vec<VerifyError> {
        let outcome = guarded(self.name(), || match self {
            Self::Quiet(a) => {
                if (a.check)(context.value_type(), context.value()) {
                    Vec::new()
                } else {
                    vec![VerifyError::new(a.message.clone(), a.name.clone(), a.tier)]
                }
            }
            Self::Strong(a) => {
                let result = (a.verify)(context.value_type(), context.value());
                retag(&result, &a.name, a.tier)
            }
            Self::Contextual(a) => {
                let result = (a.verify)(context);
                retag(&result, &a.name, a.tier)
            }
        });
        outcome.unwrap_or_else(|message| vec![VerifyError::new(message, self.name(), self.tier())])
    }
}

/// Flatten a nested result into errors attributed to the annotation.
fn retag(result: &VerifyResult, name: &str, tier: ValidatorTier) -> Vec<VerifyError> {
    result
        .errors()
        .iter()
        .flat_map(|failure| failure.details.iter())
        .map(|detail| VerifyError::new(detail.error_message.clone(), name, tier))
        .collect()
}

impl fmt::Debug for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = match self {
            Self::Quiet(_) => "Quiet",
            Self::Strong(_) => "Strong",
            Self::Contextual(_) => "Contextual",
        };
        f.debug_struct("Annotation")
            .field("shape", &shape)
            .field("name", &self.name())
            .field("tier", &self.tier())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Built-in annotations
// ---------------------------------------------------------------------------

/// Value must not be null.
pub fn required() -> Annotation {
    Annotation::from_token(RuleToken::not_null())
}

/// Value must not be null, blank, or an empty collection.
pub fn not_empty() -> Annotation {
    Annotation::from_token(RuleToken::not_empty())
}

/// String (or collection) size must lie in `min..=max`.
pub fn string_length(min: usize, max: usize) -> Annotation {
    Annotation::from_token(RuleToken::length(min, max))
}

/// Value must lie in the interval described by `options`.
pub fn range(from: impl Into<Value>, to: impl Into<Value>, options: RangeOptions) -> Annotation {
    Annotation::from_token(RuleToken::range(from, to, options))
}

/// String value must match `pattern`.
pub fn matches(pattern: Regex) -> Annotation {
    Annotation::from_token(RuleToken::matches(pattern))
}

/// String value must look like an e-mail address.
pub fn email() -> Annotation {
    Annotation::from_token(RuleToken::email())
}

/// Value must be one of `values`.
pub fn one_of<I, V>(values: I) -> Annotation
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    Annotation::from_token(RuleToken::in_values(values))
}
