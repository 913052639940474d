//! Projects: frozen rule sets registered for a type, optionally under a name.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;

use crate::context::{MemberContext, ObjectContext};
use crate::contract::Contract;
use crate::result::VerifyResult;
use crate::rules::RuleSet;
use crate::types::TypeKey;

// ---------------------------------------------------------------------------
// ProjectKey
// ---------------------------------------------------------------------------

/// Registration key of a project: the declaring type plus an optional name.
///
/// A blank name is the same as no name, i.e. the type's default project.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectKey {
    type_key: TypeKey,
    name: Option<Arc<str>>,
}

impl ProjectKey {
    pub fn new(type_key: TypeKey, name: Option<&str>) -> Self {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(Arc::from);
        Self { type_key, name }
    }

    pub fn type_key(&self) -> &TypeKey {
        &self.type_key
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl fmt::Display for ProjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}#{name}", self.type_key),
            None => write!(f, "{}", self.type_key),
        }
    }
}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

/// Immutable rule sets of one (type, project name) registration.
///
/// Member rule sets run in contract order; object-level rules run last.
#[derive(Debug)]
pub struct Project {
    key: ProjectKey,
    contract: Arc<Contract>,
    rule_sets: Vec<RuleSet>,
}

impl Project {
    pub(crate) fn new(key: ProjectKey, contract: Arc<Contract>, mut rule_sets: Vec<RuleSet>) -> Self {
        rule_sets.sort_by_key(|set| match set.member() {
            Some(member) => contract.position(member).unwrap_or(usize::MAX - 1),
            None => usize::MAX,
        });
        Self {
            key,
            contract,
            rule_sets,
        }
    }

    pub fn key(&self) -> &ProjectKey {
        &self.key
    }

    pub fn contract(&self) -> &Arc<Contract> {
        &self.contract
    }

    pub fn rule_sets(&self) -> &[RuleSet] {
        &self.rule_sets
    }

    /// Whether any rule is registered for `member`.
    pub fn has_rules_for(&self, member: &str) -> bool {
        self.rule_sets.iter().any(|set| set.member() == Some(member))
    }

    /// Run every rule set against the object.
    pub fn verify(&self, context: &ObjectContext<'_>) -> VerifyResult {
        self.run(context, |_| true)
    }

    /// Run only the rule sets of members present in the context, plus the
    /// object-level rules.
    pub fn verify_many(&self, context: &ObjectContext<'_>) -> VerifyResult {
        self.run(context, |member| context.has_value(member))
    }

    /// Run the rule sets registered for one member.
    pub fn verify_one(&self, member: &MemberContext<'_>) -> VerifyResult {
        let failures = self
            .rule_sets
            .iter()
            .filter(|set| set.member() == Some(member.name()))
            .filter_map(|set| set.verify(member.name(), member.value()))
            .collect();
        VerifyResult::from_failures(failures)
    }

    fn run(&self, context: &ObjectContext<'_>, include: impl Fn(&str) -> bool) -> VerifyResult {
        let mut whole: Option<Value> = None;
        let failures = self
            .rule_sets
            .iter()
            .filter_map(|set| match set.member() {
                Some(member) if include(member) => {
                    let value = context.value(member).unwrap_or(Value::Null);
                    set.verify(member, &value)
                }
                Some(_) => None,
                None => {
                    let value = whole.get_or_insert_with(|| context.to_value());
                    set.verify(context.instance_name(), value)
                }
            })
            .collect();
        VerifyResult::from_failures(failures)
    }
}

// ---------------------------------------------------------------------------
// ProjectManager
// ---------------------------------------------------------------------------

/// Published projects of one provider.
#[derive(Debug, Default)]
pub struct ProjectManager {
    projects: DashMap<ProjectKey, Arc<Project>>,
}

impl ProjectManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `project`, replacing an earlier build of the same key.
    pub fn publish(&self, project: Project) -> Arc<Project> {
        let project = Arc::new(project);
        tracing::debug!(
            project = %project.key(),
            rule_sets = project.rule_sets().len(),
            "Validation project published",
        );
        self.projects.insert(project.key().clone(), project.clone());
        project
    }

    /// The project for `type_key` and `name`. A named lookup never falls
    /// back to the default project.
    pub fn try_resolve(&self, type_key: &TypeKey, name: Option<&str>) -> Option<Arc<Project>> {
        let key = ProjectKey::new(type_key.clone(), name);
        self.projects.get(&key).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, type_key: &TypeKey, name: Option<&str>) -> bool {
        self.try_resolve(type_key, name).is_some()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}
