//! Verification tiers and the validators that aggregate them.

pub mod aggregation;
pub mod annotation;
pub mod custom;

pub use aggregation::{AggregationValidator, DynamicValidator};
pub use annotation::AnnotationValidator;
pub use custom::{CustomValidator, CustomValidatorManager, FnValidator, SealedValidator};
