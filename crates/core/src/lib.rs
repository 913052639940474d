//! Object contract and rule-token validation engine.
//!
//! Objects are checked against three independent tiers and every violation
//! is reported, not just the first:
//!
//! 1. project rule sets built with a [`ValidationRegistrar`],
//! 2. custom validators registered on the provider,
//! 3. annotations declared on the type's contract.
//!
//! A [`ValidationProvider`] owns the registries. Types describe their
//! members by implementing [`Verifiable`]; dynamic record types can be
//! described with a custom member map or a [`MemberProvider`].
//!
//! The engine performs no I/O and never installs a tracing subscriber.

pub mod annotation;
pub mod context;
pub mod contract;
pub mod error;
pub mod handler;
pub mod options;
pub mod project;
pub mod provider;
pub mod result;
pub mod rules;
pub mod tokens;
pub mod types;
pub mod validators;

pub use annotation::Annotation;
pub use context::{MemberContext, ObjectContext};
pub use contract::{
    Contract, ContractCache, MemberDescriptor, MemberKind, MemberProvider, MemberSet, Verifiable,
};
pub use error::ValidationError;
pub use handler::ValidationHandler;
pub use options::ValidationOptions;
pub use project::{Project, ProjectKey, ProjectManager};
pub use provider::ValidationProvider;
pub use result::{
    CustomVerifyResult, ValidatorTier, VerifyError, VerifyFailure, VerifyResult,
};
pub use rules::{MemberRegistrar, RuleSet, TypeRegistrar, ValidationRegistrar, ValidationStrategy};
pub use tokens::{RangeOptions, RuleToken, TokenOps};
pub use types::{ObjectKind, TypeKey, TypeSet};
pub use validators::{
    AggregationValidator, CustomValidator, CustomValidatorManager, DynamicValidator, FnValidator,
};
