//! Standalone verifier over a fixed set of projects.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::context::{MemberContext, ObjectContext};
use crate::contract::{ContractCache, Verifiable};
use crate::error::ValidationError;
use crate::options::ValidationOptions;
use crate::project::{Project, ProjectKey};
use crate::result::VerifyResult;
use crate::types::TypeKey;

/// Runs only the rule-set tier, against projects it owns.
///
/// Built by [`ValidationRegistrar::build_handler`](crate::rules::ValidationRegistrar::build_handler).
/// Types without a project follow the unregistered-type option.
pub struct ValidationHandler {
    contracts: Arc<ContractCache>,
    projects: HashMap<ProjectKey, Arc<Project>>,
    options: ValidationOptions,
}

impl ValidationHandler {
    pub(crate) fn new(
        contracts: Arc<ContractCache>,
        projects: Vec<Arc<Project>>,
        options: ValidationOptions,
    ) -> Self {
        let mut handler = Self {
            contracts,
            projects: HashMap::with_capacity(projects.len()),
            options,
        };
        handler.merge(projects);
        handler
    }

    /// Add `projects`, replacing those with the same key.
    pub fn merge(&mut self, projects: impl IntoIterator<Item = Arc<Project>>) -> &mut Self {
        for project in projects {
            self.projects.insert(project.key().clone(), project);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn verify<T: Verifiable>(&self, instance: &T) -> Result<VerifyResult, ValidationError> {
        self.verify_in(instance, None)
    }

    pub fn verify_named<T: Verifiable>(
        &self,
        instance: &T,
        project: &str,
    ) -> Result<VerifyResult, ValidationError> {
        self.verify_in(instance, Some(project))
    }

    /// Verify a record standing in for `type_key`.
    pub fn verify_record(
        &self,
        type_key: &TypeKey,
        record: &Map<String, Value>,
        project: Option<&str>,
    ) -> VerifyResult {
        match self.project(type_key, project) {
            Some(project) => {
                let contract = self.contracts.resolve_with_record(type_key, record);
                project.verify(&ObjectContext::for_key_value(contract, record))
            }
            None => self.unregistered(type_key),
        }
    }

    /// Verify only the members present in `record`.
    pub fn verify_many(
        &self,
        type_key: &TypeKey,
        record: &Map<String, Value>,
        project: Option<&str>,
    ) -> VerifyResult {
        match self.project(type_key, project) {
            Some(project) => {
                let contract = self.contracts.resolve_with_record(type_key, record);
                project.verify_many(&ObjectContext::for_key_value(contract, record))
            }
            None => self.unregistered(type_key),
        }
    }

    /// Verify `value` against the rules of one member.
    pub fn verify_one(
        &self,
        type_key: &TypeKey,
        member: &str,
        value: impl Into<Value>,
        project: Option<&str>,
    ) -> VerifyResult {
        let Some(project) = self.project(type_key, project) else {
            return self.unregistered(type_key);
        };
        match project.contract().member(member) {
            Some(descriptor) => {
                project.verify_one(&MemberContext::detached(descriptor.clone(), value.into()))
            }
            None => VerifyResult::member_not_found(member),
        }
    }

    fn verify_in<T: Verifiable>(
        &self,
        instance: &T,
        project: Option<&str>,
    ) -> Result<VerifyResult, ValidationError> {
        let type_key = TypeKey::of::<T>();
        let Some(project) = self.project(&type_key, project) else {
            return Ok(self.unregistered(&type_key));
        };
        let contract = self.contracts.resolve::<T>()?;
        Ok(project.verify(&ObjectContext::for_instance(contract, instance)))
    }

    fn project(&self, type_key: &TypeKey, name: Option<&str>) -> Option<&Arc<Project>> {
        self.projects.get(&ProjectKey::new(type_key.clone(), name))
    }

    fn unregistered(&self, type_key: &TypeKey) -> VerifyResult {
        if self.options.failure_if_project_not_match {
            VerifyResult::unregistered_type(type_key.name())
        } else {
            VerifyResult::success()
        }
    }
}
