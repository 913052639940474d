//! Registrar: the configuration surface for rule sets.
//!
//! ```
//! use vouch_core::contract::{MemberSet, Verifiable};
//! use vouch_core::tokens::RangeOptions;
//! use vouch_core::ValidationProvider;
//!
//! struct Boat {
//!     name: String,
//!     length: i64,
//! }
//!
//! impl Verifiable for Boat {
//!     fn describe(members: &mut MemberSet<Self>) {
//!         members.property("Name", |b: &Boat| &b.name);
//!         members.property("Length", |b: &Boat| &b.length);
//!     }
//! }
//!
//! let provider = ValidationProvider::default();
//! let registrar = provider.registrar();
//! let boat = registrar.for_type::<Boat>()?;
//! boat.for_member("Name")?.min_length(1);
//! boat.for_member("Length")?.range(0, 100, RangeOptions::CloseInterval);
//! registrar.build();
//! # Ok::<(), vouch_core::ValidationError>(())
//! ```

use std::marker::PhantomData;
use std::sync::Arc;

use dashmap::DashMap;
use indexmap::IndexMap;
use parking_lot::Mutex;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::RuleSlot;
use crate::contract::{Contract, ContractCache, Verifiable};
use crate::error::ValidationError;
use crate::handler::ValidationHandler;
use crate::options::ValidationOptions;
use crate::project::{Project, ProjectKey, ProjectManager};
use crate::result::CustomVerifyResult;
use crate::tokens::{RangeOptions, RuleToken};
use crate::types::{TypeKey, TypeSet};

// ---------------------------------------------------------------------------
// Drafts
// ---------------------------------------------------------------------------

/// Rule slots of one project while it is being configured.
#[derive(Debug)]
struct ProjectDraft {
    key: ProjectKey,
    contract: Arc<Contract>,
    slots: Mutex<IndexMap<Option<String>, Arc<RuleSlot>>>,
}

impl ProjectDraft {
    fn new(key: ProjectKey, contract: Arc<Contract>) -> Self {
        Self {
            key,
            contract,
            slots: Mutex::new(IndexMap::new()),
        }
    }

    /// The slot of `member`, created on first use. Check and insert happen
    /// under one lock, so a member never gets two slots.
    fn slot(&self, member: Option<&str>) -> Arc<RuleSlot> {
        let member = member.map(str::to_string);
        let mut slots = self.slots.lock();
        slots
            .entry(member.clone())
            .or_insert_with(|| Arc::new(RuleSlot::new(member)))
            .clone()
    }

    fn freeze(&self) -> Project {
        let rule_sets = self
            .slots
            .lock()
            .values()
            .map(|slot| slot.freeze())
            .collect();
        Project::new(self.key.clone(), self.contract.clone(), rule_sets)
    }
}

// ---------------------------------------------------------------------------
// ValidationRegistrar
// ---------------------------------------------------------------------------

/// Collects rule configuration and publishes it as projects.
///
/// Type and member registrars borrow the registrar, so once [`build`] has
/// consumed it no further rules can be appended.
///
/// [`build`]: ValidationRegistrar::build
pub struct ValidationRegistrar {
    contracts: Arc<ContractCache>,
    projects: Arc<ProjectManager>,
    options: ValidationOptions,
    drafts: DashMap<ProjectKey, Arc<ProjectDraft>>,
}

impl ValidationRegistrar {
    pub fn new(
        contracts: Arc<ContractCache>,
        projects: Arc<ProjectManager>,
        options: ValidationOptions,
    ) -> Self {
        Self {
            contracts,
            projects,
            options,
            drafts: DashMap::new(),
        }
    }

    /// Configure the default project of `T`.
    pub fn for_type<T: Verifiable>(&self) -> Result<TypeRegistrar<'_>, ValidationError> {
        let contract = self.contracts.resolve::<T>()?;
        Ok(self.draft(ProjectKey::new(TypeKey::of::<T>(), None), contract))
    }

    /// Configure the project `name` of `T`.
    pub fn for_type_named<T: Verifiable>(
        &self,
        name: &str,
    ) -> Result<TypeRegistrar<'_>, ValidationError> {
        if name.trim().is_empty() {
            return Err(ValidationError::BlankProjectName);
        }
        let contract = self.contracts.resolve::<T>()?;
        Ok(self.draft(ProjectKey::new(TypeKey::of::<T>(), Some(name)), contract))
    }

    /// Configure a type known by key, e.g. a named record type described by
    /// a custom member map.
    pub fn for_key(&self, key: &TypeKey, project: Option<&str>) -> TypeRegistrar<'_> {
        let contract = self.contracts.resolve_key(key);
        self.draft(ProjectKey::new(key.clone(), project), contract)
    }

    /// Apply a reusable configuration unit to its project of `T`.
    pub fn apply_strategy<T, S>(&self, strategy: &S) -> Result<(), ValidationError>
    where
        T: Verifiable,
        S: ValidationStrategy<T>,
    {
        let registrar = match strategy.project_name() {
            Some(name) => self.for_type_named::<T>(name)?,
            None => self.for_type::<T>()?,
        };
        strategy.configure(&registrar)
    }

    /// Freeze every draft and publish it to the provider's projects.
    pub fn build(self) {
        let count = self.drafts.len();
        for (_, draft) in self.drafts {
            self.projects.publish(draft.freeze());
        }
        tracing::info!(projects = count, "Validation rules built");
    }

    /// Freeze every draft into a standalone handler instead of publishing.
    pub fn build_handler(self) -> ValidationHandler {
        let projects = self
            .drafts
            .into_iter()
            .map(|(_, draft)| Arc::new(draft.freeze()))
            .collect();
        ValidationHandler::new(self.contracts, projects, self.options)
    }

    fn draft(&self, key: ProjectKey, contract: Arc<Contract>) -> TypeRegistrar<'_> {
        let draft = self
            .drafts
            .entry(key.clone())
            .or_insert_with(|| {
                tracing::debug!(project = %key, "Project draft created");
                Arc::new(ProjectDraft::new(key, contract))
            })
            .clone();
        TypeRegistrar {
            draft,
            _registrar: PhantomData,
        }
    }
}

// ---------------------------------------------------------------------------
// ValidationStrategy
// ---------------------------------------------------------------------------

/// A reusable unit of rule configuration for `T`.
pub trait ValidationStrategy<T: Verifiable> {
    /// Project the rules belong to; `None` is the type's default project.
    fn project_name(&self) -> Option<&str> {
        None
    }

    fn configure(&self, registrar: &TypeRegistrar<'_>) -> Result<(), ValidationError>;
}

// ---------------------------------------------------------------------------
// TypeRegistrar
// ---------------------------------------------------------------------------

/// Configuration of one project.
pub struct TypeRegistrar<'r> {
    draft: Arc<ProjectDraft>,
    _registrar: PhantomData<&'r ValidationRegistrar>,
}

impl std::fmt::Debug for TypeRegistrar<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistrar").finish_non_exhaustive()
    }
}

impl<'r> TypeRegistrar<'r> {
    pub fn project_key(&self) -> &ProjectKey {
        &self.draft.key
    }

    /// Rules for `member`. Unknown members are a configuration error.
    pub fn for_member(&self, member: &str) -> Result<MemberRegistrar<'r>, ValidationError> {
        if member.trim().is_empty() {
            return Err(ValidationError::BlankMemberName);
        }
        let descriptor = self.draft.contract.member(member).ok_or_else(|| {
            ValidationError::MemberNotFound {
                type_name: self.draft.key.type_key().name().to_string(),
                member: member.to_string(),
            }
        })?;
        Ok(MemberRegistrar {
            slot: self.draft.slot(Some(member)),
            declared: descriptor.value_type().clone(),
            _registrar: PhantomData,
        })
    }

    /// Rules evaluated against the whole object.
    pub fn for_object(&self) -> MemberRegistrar<'r> {
        MemberRegistrar {
            slot: self.draft.slot(None),
            declared: self.draft.key.type_key().clone(),
            _registrar: PhantomData,
        }
    }
}

// ---------------------------------------------------------------------------
// MemberRegistrar
// ---------------------------------------------------------------------------

/// Token appender for one member (or the object root).
///
/// Every call appends to the same slot; see [`RuleToken`] for the
/// mutual-exclusion rules applied on append.
pub struct MemberRegistrar<'r> {
    slot: Arc<RuleSlot>,
    declared: TypeKey,
    _registrar: PhantomData<&'r ValidationRegistrar>,
}

impl std::fmt::Debug for MemberRegistrar<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemberRegistrar").finish_non_exhaustive()
    }
}

impl MemberRegistrar<'_> {
    /// Append an arbitrary token.
    pub fn token(&self, token: RuleToken) -> &Self {
        self.slot.append(token);
        self
    }

    pub fn null(&self) -> &Self {
        self.token(RuleToken::null())
    }

    pub fn not_null(&self) -> &Self {
        self.token(RuleToken::not_null())
    }

    pub fn empty(&self) -> &Self {
        self.token(RuleToken::empty())
    }

    pub fn not_empty(&self) -> &Self {
        self.token(RuleToken::not_empty())
    }

    pub fn equal(&self, value: impl Into<Value>) -> &Self {
        self.token(RuleToken::equal(value))
    }

    pub fn not_equal(&self, value: impl Into<Value>) -> &Self {
        self.token(RuleToken::not_equal(value))
    }

    pub fn greater_than(&self, bound: impl Into<Value>) -> &Self {
        self.token(RuleToken::greater_than(bound))
    }

    pub fn greater_than_or_equal(&self, bound: impl Into<Value>) -> &Self {
        self.token(RuleToken::greater_than_or_equal(bound))
    }

    pub fn less_than(&self, bound: impl Into<Value>) -> &Self {
        self.token(RuleToken::less_than(bound))
    }

    pub fn less_than_or_equal(&self, bound: impl Into<Value>) -> &Self {
        self.token(RuleToken::less_than_or_equal(bound))
    }

    pub fn range(
        &self,
        from: impl Into<Value>,
        to: impl Into<Value>,
        options: RangeOptions,
    ) -> &Self {
        self.token(RuleToken::range(from, to, options))
    }

    pub fn length(&self, min: usize, max: usize) -> &Self {
        self.token(RuleToken::length(min, max))
    }

    pub fn min_length(&self, min: usize) -> &Self {
        self.token(RuleToken::min_length(min))
    }

    pub fn max_length(&self, max: usize) -> &Self {
        self.token(RuleToken::max_length(max))
    }

    pub fn at_least(&self, count: usize) -> &Self {
        self.token(RuleToken::at_least(count))
    }

    pub fn in_values<I, V>(&self, values: I) -> &Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.token(RuleToken::in_values(values))
    }

    pub fn not_in<I, V>(&self, values: I) -> &Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.token(RuleToken::not_in(values))
    }

    pub fn any<F>(&self, predicate: F) -> &Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.token(RuleToken::any(predicate))
    }

    pub fn all<F>(&self, predicate: F) -> &Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.token(RuleToken::all(predicate))
    }

    /// The member's declared type must be one of `S`.
    pub fn required_types<S: TypeSet>(&self) -> &Self {
        self.token(RuleToken::required_types::<S>(&self.declared))
    }

    pub fn is<V: ?Sized + 'static>(&self) -> &Self {
        self.token(RuleToken::is::<V>(&self.declared))
    }

    pub fn is_not<V: ?Sized + 'static>(&self) -> &Self {
        self.token(RuleToken::is_not::<V>(&self.declared))
    }

    pub fn matches(&self, pattern: Regex) -> &Self {
        self.token(RuleToken::matches(pattern))
    }

    pub fn email(&self) -> &Self {
        self.token(RuleToken::email())
    }

    pub fn must<F>(&self, predicate: F, message: impl Into<String>) -> &Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.token(RuleToken::must(predicate, message))
    }

    pub fn must_typed<V, F>(&self, predicate: F, message: impl Into<String>) -> &Self
    where
        V: DeserializeOwned + 'static,
        F: Fn(&V) -> bool + Send + Sync + 'static,
    {
        self.token(RuleToken::must_typed::<V, F>(predicate, message))
    }

    pub fn predicate<F>(&self, predicate: F) -> &Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.token(RuleToken::predicate(predicate))
    }

    pub fn func<F>(&self, func: F) -> &Self
    where
        F: Fn(&Value) -> CustomVerifyResult + Send + Sync + 'static,
    {
        self.token(RuleToken::func(func))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::MemberSet;
    use crate::tokens::TokenOps;
    use assert_matches::assert_matches;

    struct Boat {
        name: String,
        length: i64,
    }

    impl Verifiable for Boat {
        fn describe(members: &mut MemberSet<Self>) {
            members.property("Name", |b: &Boat| &b.name);
            members.property("Length", |b: &Boat| &b.length);
        }
    }

    fn registrar() -> ValidationRegistrar {
        ValidationRegistrar::new(
            Arc::new(ContractCache::new()),
            Arc::new(ProjectManager::new()),
            ValidationOptions::default(),
        )
    }

    #[test]
    fn unknown_member_is_a_configuration_error() {
        let registrar = registrar();
        let boat = registrar.for_type::<Boat>().unwrap();
        assert_matches!(
            boat.for_member("Width"),
            Err(ValidationError::MemberNotFound { ref member, .. }) if member == "Width"
        );
        assert_matches!(boat.for_member(" "), Err(ValidationError::BlankMemberName));
    }

    #[test]
    fn blank_project_name_is_rejected() {
        let registrar = registrar();
        assert_matches!(
            registrar.for_type_named::<Boat>(""),
            Err(ValidationError::BlankProjectName)
        );
    }

    #[test]
    fn repeated_member_calls_share_one_slot() {
        let registrar = registrar();
        let boat = registrar.for_type::<Boat>().unwrap();
        boat.for_member("Name").unwrap().not_null().min_length(1);
        registrar.for_type::<Boat>().unwrap().for_member("Name").unwrap().null();

        assert_eq!(registrar.drafts.len(), 1);
        let project = registrar.drafts.iter().next().unwrap().value().freeze();
        assert_eq!(project.rule_sets().len(), 1);
        let ops: Vec<_> = project.rule_sets()[0].tokens().iter().map(RuleToken::ops).collect();
        assert_eq!(ops, vec![TokenOps::Null, TokenOps::MinLength]);
    }

    #[test]
    fn concurrent_configuration_creates_one_draft_and_slot() {
        let registrar = registrar();
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    registrar
                        .for_type::<Boat>()
                        .unwrap()
                        .for_member("Length")
                        .unwrap()
                        .not_in([13]);
                });
            }
        });
        assert_eq!(registrar.drafts.len(), 1);
        let project = registrar.drafts.iter().next().unwrap().value().freeze();
        assert_eq!(project.rule_sets().len(), 1);
        assert_eq!(project.rule_sets()[0].tokens().len(), 8);
    }

    #[test]
    fn declared_type_feeds_type_tokens() {
        let registrar = registrar();
        let boat = registrar.for_type::<Boat>().unwrap();
        boat.for_member("Length").unwrap().is::<i64>();
        boat.for_member("Name").unwrap().required_types::<(i32, bool)>();
        let project = registrar.drafts.iter().next().unwrap().value().freeze();

        let length = &project.rule_sets()[1];
        assert_eq!(length.member(), Some("Length"));
        assert!(length.verify("Length", &Value::Null).is_none());
        let name = &project.rule_sets()[0];
        assert!(name.verify("Name", &Value::Null).is_some());
    }

    struct Strict;

    impl ValidationStrategy<Boat> for Strict {
        fn project_name(&self) -> Option<&str> {
            Some("Strict")
        }

        fn configure(&self, registrar: &TypeRegistrar<'_>) -> Result<(), ValidationError> {
            registrar.for_member("Name")?.not_empty().max_length(20);
            Ok(())
        }
    }

    #[test]
    fn strategy_configures_its_named_project() {
        let registrar = registrar();
        registrar.apply_strategy::<Boat, _>(&Strict).unwrap();
        let handler = registrar.build_handler();
        let boat = Boat {
            name: String::new(),
            length: 3,
        };
        assert!(handler.verify(&boat).unwrap().is_valid());
        assert!(!handler.verify_named(&boat, "Strict").unwrap().is_valid());
    }
}
