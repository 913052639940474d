//! The annotation tier: evaluates annotations declared on a contract.

use std::sync::Arc;

use crate::context::{MemberContext, ObjectContext};
use crate::contract::{Contract, MemberDescriptor};
use crate::result::{VerifyFailure, VerifyResult};

/// Runs type-level and member annotations.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnnotationValidator;

impl AnnotationValidator {
    /// `None` when the contract disables annotations or nothing is annotated.
    pub fn verify(&self, context: &ObjectContext<'_>) -> Option<VerifyResult> {
        let contract = context.contract();
        if !contract.include_annotations() {
            return None;
        }

        let mut applied = false;
        let mut failures = Vec::new();

        if !contract.annotations().is_empty() {
            applied = true;
            let descriptor = Arc::new(MemberDescriptor::keyed(
                context.instance_name(),
                context.type_key().clone(),
            ));
            let whole = MemberContext::with_parent(descriptor, context.to_value(), context);
            let errors: Vec<_> = contract
                .annotations()
                .iter()
                .flat_map(|annotation| annotation.evaluate(&whole))
                .collect();
            if !errors.is_empty() {
                failures.push(VerifyFailure::new(whole.name(), whole.value().clone(), errors));
            }
        }

        for member in context.members() {
            if let Some(failure) = self.verify_member(&member) {
                failures.push(failure);
            }
            applied |= member.descriptor().include_annotations();
        }

        applied.then(|| VerifyResult::from_failures(failures))
    }

    /// Annotations of one member of `contract`. `None` when the member has
    /// none or the contract disables annotations.
    pub fn verify_one(&self, contract: &Contract, member: &MemberContext<'_>) -> Option<VerifyResult> {
        if !contract.include_annotations() || !member.descriptor().include_annotations() {
            return None;
        }
        Some(
            self.verify_member(member)
                .map(VerifyResult::from_failure)
                .unwrap_or_default(),
        )
    }

    fn verify_member(&self, member: &MemberContext<'_>) -> Option<VerifyFailure> {
        let descriptor = member.descriptor();
        if !descriptor.include_annotations() {
            return None;
        }
        let errors: Vec<_> = descriptor
            .annotations()
            .iter()
            .flat_map(|annotation| annotation.evaluate(member))
            .collect();
        if errors.is_empty() {
            None
        } else {
            Some(VerifyFailure::new(member.name(), member.value().clone(), errors))
        }
    }
}
