//! The validation provider: owner of every registry.

use std::sync::Arc;

use crate::contract::{ContractCache, MemberProvider, Verifiable};
use crate::error::ValidationError;
use crate::options::ValidationOptions;
use crate::project::ProjectManager;
use crate::rules::ValidationRegistrar;
use crate::validators::aggregation::Aggregator;
use crate::validators::{
    AggregationValidator, CustomValidator, CustomValidatorManager, DynamicValidator,
};

/// Owns the contract cache, the published projects, the custom validators
/// and the options, and hands out registrars and validators over them.
///
/// Validators snapshot the options when resolved; later option updates only
/// affect validators resolved afterwards.
pub struct ValidationProvider {
    contracts: Arc<ContractCache>,
    projects: Arc<ProjectManager>,
    custom: Arc<CustomValidatorManager>,
    options: ValidationOptions,
}

impl Default for ValidationProvider {
    fn default() -> Self {
        Self::new(ValidationOptions::default())
    }
}

impl ValidationProvider {
    pub fn new(options: ValidationOptions) -> Self {
        Self::with_contracts(ContractCache::new(), options)
    }

    /// A provider whose contract cache consults `members` for types it has
    /// no factory for.
    pub fn with_member_provider(members: Arc<dyn MemberProvider>, options: ValidationOptions) -> Self {
        Self::with_contracts(ContractCache::with_provider(members), options)
    }

    fn with_contracts(contracts: ContractCache, options: ValidationOptions) -> Self {
        tracing::debug!(?options, "Validation provider created");
        Self {
            contracts: Arc::new(contracts),
            projects: Arc::new(ProjectManager::new()),
            custom: Arc::new(CustomValidatorManager::new()),
            options,
        }
    }

    pub fn contracts(&self) -> &Arc<ContractCache> {
        &self.contracts
    }

    pub fn projects(&self) -> &Arc<ProjectManager> {
        &self.projects
    }

    pub fn custom_validators(&self) -> &CustomValidatorManager {
        &self.custom
    }

    pub fn options(&self) -> ValidationOptions {
        self.options
    }

    pub fn update_options(&mut self, update: impl FnOnce(&mut ValidationOptions)) {
        update(&mut self.options);
        tracing::debug!(options = ?self.options, "Validation options updated");
    }

    /// A registrar whose [`build`](ValidationRegistrar::build) publishes to
    /// this provider.
    pub fn registrar(&self) -> ValidationRegistrar {
        ValidationRegistrar::new(self.contracts.clone(), self.projects.clone(), self.options)
    }

    /// Register a custom validator. Returns `false` if the name was taken.
    pub fn register_validator<V: CustomValidator + 'static>(&self, validator: V) -> bool {
        self.custom.register(Arc::new(validator))
    }

    /// Validator for `T` using its default project.
    pub fn resolve<T: Verifiable>(&self) -> Result<AggregationValidator<T>, ValidationError> {
        AggregationValidator::new(self.aggregator(None))
    }

    /// Validator for `T` using project `name`.
    pub fn resolve_named<T: Verifiable>(
        &self,
        name: &str,
    ) -> Result<AggregationValidator<T>, ValidationError> {
        AggregationValidator::new(self.aggregator(Some(non_blank(name)?)))
    }

    /// Validator for any type, using default projects.
    pub fn resolve_dynamic(&self) -> DynamicValidator {
        DynamicValidator::new(self.aggregator(None))
    }

    /// Validator for any type, using projects named `name`.
    pub fn resolve_dynamic_named(&self, name: &str) -> Result<DynamicValidator, ValidationError> {
        Ok(DynamicValidator::new(self.aggregator(Some(non_blank(name)?))))
    }

    fn aggregator(&self, project: Option<&str>) -> Aggregator {
        Aggregator::new(
            self.contracts.clone(),
            self.projects.clone(),
            self.custom.clone(),
            self.options,
            project.map(str::to_string),
        )
    }
}

fn non_blank(name: &str) -> Result<&str, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        Err(ValidationError::BlankProjectName)
    } else {
        Ok(name)
    }
}
