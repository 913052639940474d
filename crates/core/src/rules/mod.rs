//! Rule sets and the registrar that builds them.
//!
//! During configuration every member gets one [`RuleSlot`], a mutable,
//! lock-guarded token list. Building the registrar freezes each slot into an
//! immutable [`RuleSet`] owned by a [`Project`](crate::project::Project).

pub mod registrar;

use parking_lot::Mutex;
use serde_json::Value;

use crate::result::VerifyFailure;
use crate::tokens::RuleToken;

pub use registrar::{MemberRegistrar, TypeRegistrar, ValidationRegistrar, ValidationStrategy};

// ---------------------------------------------------------------------------
// RuleSet
// ---------------------------------------------------------------------------

/// Frozen, ordered tokens for one member, or for the object as a whole when
/// `member` is `None`.
#[derive(Debug, Clone)]
pub struct RuleSet {
    member: Option<String>,
    tokens: Vec<RuleToken>,
}

impl RuleSet {
    pub fn member(&self) -> Option<&str> {
        self.member.as_deref()
    }

    pub fn tokens(&self) -> &[RuleToken] {
        &self.tokens
    }

    pub fn is_object_level(&self) -> bool {
        self.member.is_none()
    }

    /// Evaluate every token against `value`; all failures are collected
    /// under `member_name`.
    pub fn verify(&self, member_name: &str, value: &Value) -> Option<VerifyFailure> {
        let errors: Vec<_> = self
            .tokens
            .iter()
            .filter_map(|token| token.evaluate(value).to_error())
            .collect();
        if errors.is_empty() {
            None
        } else {
            Some(VerifyFailure::new(member_name, value.clone(), errors))
        }
    }
}

// ---------------------------------------------------------------------------
// RuleSlot
// ---------------------------------------------------------------------------

/// Mutable token list for one member during configuration.
#[derive(Debug)]
pub(crate) struct RuleSlot {
    member: Option<String>,
    tokens: Mutex<Vec<RuleToken>>,
}

impl RuleSlot {
    pub(crate) fn new(member: Option<String>) -> Self {
        Self {
            member,
            tokens: Mutex::new(Vec::new()),
        }
    }

    /// Append `token`. A token sharing a mutual-exclusion group with earlier
    /// tokens takes the position of the first of them; the rest are removed.
    pub(crate) fn append(&self, token: RuleToken) {
        let mut tokens = self.tokens.lock();
        let conflicts: Vec<usize> = tokens
            .iter()
            .enumerate()
            .filter(|(_, existing)| existing.conflicts_with(&token))
            .map(|(position, _)| position)
            .collect();

        let Some((&first, rest)) = conflicts.split_first() else {
            tokens.push(token);
            return;
        };
        for &position in rest.iter().rev() {
            tokens.remove(position);
        }
        tracing::trace!(
            member = self.member.as_deref().unwrap_or("<object>"),
            replaced = %tokens[first],
            token = %token,
            "Mutually exclusive token replaced",
        );
        tokens[first] = token;
    }

    pub(crate) fn len(&self) -> usize {
        self.tokens.lock().len()
    }

    pub(crate) fn freeze(&self) -> RuleSet {
        RuleSet {
            member: self.member.clone(),
            tokens: self.tokens.lock().clone(),
        }
    }
}
