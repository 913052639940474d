//! Contract cache keyed by type identity.

use std::sync::Arc;

use dashmap::DashMap;
use serde_json::{Map, Value};

use super::{Contract, MemberDescriptor, MemberSet, Verifiable};
use crate::error::ValidationError;
use crate::types::TypeKey;

/// Collaborator that describes types the cache has no factory for.
///
/// Returns `None` when it does not know the type; the cache then falls back
/// to a basic contract with no members.
pub trait MemberProvider: Send + Sync {
    fn describe(&self, type_key: &TypeKey) -> Option<Result<Contract, ValidationError>>;
}

type ContractFactory = Arc<dyn Fn() -> Result<Contract, ValidationError> + Send + Sync>;

/// Resolves types into shared [`Contract`]s.
///
/// Every successful resolution is cached, so resolving the same type twice
/// returns the same `Arc`. Contracts are built outside the map lock and
/// published first-writer-wins.
#[derive(Default)]
pub struct ContractCache {
    contracts: DashMap<TypeKey, Arc<Contract>>,
    factories: DashMap<TypeKey, ContractFactory>,
    provider: Option<Arc<dyn MemberProvider>>,
}

impl ContractCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache that consults `provider` for types without a factory.
    pub fn with_provider(provider: Arc<dyn MemberProvider>) -> Self {
        Self {
            provider: Some(provider),
            ..Self::default()
        }
    }

    /// Resolve the contract of a [`Verifiable`] type.
    pub fn resolve<T: Verifiable>(&self) -> Result<Arc<Contract>, ValidationError> {
        let key = TypeKey::of::<T>();
        if let Some(contract) = self.cached(&key) {
            return Ok(contract);
        }
        let contract = build_verifiable::<T>()?;
        Ok(self.publish(key, contract))
    }

    /// Resolve a contract by type identity alone.
    ///
    /// Unknown types resolve to a basic contract with no members.
    pub fn resolve_key(&self, key: &TypeKey) -> Arc<Contract> {
        if let Some(contract) = self.cached(key) {
            return contract;
        }

        let factory = self.factories.get(key).map(|f| f.value().clone());
        let built = match factory {
            Some(factory) => Some(factory()),
            None => self.provider.as_ref().and_then(|p| p.describe(key)),
        };

        let contract = match built {
            Some(Ok(contract)) => contract,
            Some(Err(e)) => {
                tracing::warn!(type_name = %key, error = %e, "Contract description rejected, using basic contract");
                Contract::basic(key.clone())
            }
            None => Contract::basic(key.clone()),
        };
        self.publish(key.clone(), contract)
    }

    /// Resolve a contract, using `instance` to special-case records and
    /// sequences of types the cache does not know.
    ///
    /// Contracts derived from an instance are not cached.
    pub fn resolve_with_instance(&self, key: &TypeKey, instance: &Value) -> Arc<Contract> {
        let contract = self.resolve_key(key);
        if !contract.is_basic_type() {
            return contract;
        }
        match instance {
            Value::Object(map) => Arc::new(Contract::from_map(key.clone(), map)),
            Value::Array(_) => Arc::new(Contract::collection(key.clone())),
            _ => contract,
        }
    }

    /// Resolve a contract for a key/value record standing in for `key`.
    pub fn resolve_with_record(&self, key: &TypeKey, record: &Map<String, Value>) -> Arc<Contract> {
        let contract = self.resolve_key(key);
        if contract.is_basic_type() {
            Arc::new(Contract::from_map(key.clone(), record))
        } else {
            contract
        }
    }

    /// Add `T` to the type-indexed factory map so it resolves by key.
    pub fn register<T: Verifiable>(&self) {
        let key = TypeKey::of::<T>();
        tracing::debug!(type_name = %key, "Registering contract factory");
        self.factories
            .insert(key, Arc::new(build_verifiable::<T>) as ContractFactory);
    }

    /// Declare a custom member map for `key`, replacing any cached contract.
    pub fn register_custom(
        &self,
        key: TypeKey,
        members: Vec<MemberDescriptor>,
    ) -> Result<Arc<Contract>, ValidationError> {
        let contract = Arc::new(Contract::structure(key.clone(), members)?);
        tracing::debug!(
            type_name = %key,
            members = contract.members().len(),
            "Custom member map registered",
        );
        self.contracts.insert(key, contract.clone());
        Ok(contract)
    }

    /// Drop the cached contract of `key`. The next resolution rebuilds it.
    pub fn invalidate(&self, key: &TypeKey) -> bool {
        self.contracts.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    fn cached(&self, key: &TypeKey) -> Option<Arc<Contract>> {
        self.contracts.get(key).map(|entry| entry.value().clone())
    }

    fn publish(&self, key: TypeKey, contract: Contract) -> Arc<Contract> {
        let entry = self.contracts.entry(key).or_insert_with(|| {
            tracing::debug!(
                type_name = %contract.type_key(),
                kind = %contract.kind(),
                members = contract.members().len(),
                "Contract built",
            );
            Arc::new(contract)
        });
        entry.value().clone()
    }
}

fn build_verifiable<T: Verifiable>() -> Result<Contract, ValidationError> {
    let mut members = MemberSet::<T>::new();
    T::describe(&mut members);
    members.into_contract(TypeKey::of::<T>())
}
