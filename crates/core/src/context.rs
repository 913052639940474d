//! Verifiable contexts: uniform member access over instances and records.

use std::any::Any;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::contract::{Contract, MemberDescriptor};
use crate::result::{BASIC_TYPE_MEMBER, INSTANCE_MEMBER, KEY_VALUE_MEMBER};
use crate::types::{ObjectKind, TypeKey};

#[derive(Clone, Copy)]
enum Source<'a> {
    Instance(&'a dyn Any),
    KeyValue(&'a Map<String, Value>),
    Value(&'a Value),
}

/// An object (or key/value record) paired with its [`Contract`].
#[derive(Clone)]
pub struct ObjectContext<'a> {
    contract: Arc<Contract>,
    source: Source<'a>,
}

impl<'a> ObjectContext<'a> {
    pub fn for_instance(contract: Arc<Contract>, instance: &'a dyn Any) -> Self {
        Self {
            contract,
            source: Source::Instance(instance),
        }
    }

    pub fn for_key_value(contract: Arc<Contract>, map: &'a Map<String, Value>) -> Self {
        Self {
            contract,
            source: Source::KeyValue(map),
        }
    }

    /// A context over an untyped value. Objects behave like key/value
    /// records; anything else is a basic or collection value.
    pub fn for_value(contract: Arc<Contract>, value: &'a Value) -> Self {
        let source = match value {
            Value::Object(map) => Source::KeyValue(map),
            other => Source::Value(other),
        };
        Self { contract, source }
    }

    pub fn contract(&self) -> &Arc<Contract> {
        &self.contract
    }

    pub fn type_key(&self) -> &TypeKey {
        self.contract.type_key()
    }

    pub fn kind(&self) -> ObjectKind {
        self.contract.kind()
    }

    /// Name under which whole-object failures are reported.
    pub fn instance_name(&self) -> &'static str {
        if self.contract.is_basic_type() {
            return BASIC_TYPE_MEMBER;
        }
        match self.source {
            Source::KeyValue(_) => KEY_VALUE_MEMBER,
            Source::Instance(_) | Source::Value(_) => INSTANCE_MEMBER,
        }
    }

    /// The typed instance, when the context wraps a `T`.
    pub fn instance<T: Any>(&self) -> Option<&'a T> {
        match self.source {
            Source::Instance(instance) => instance.downcast_ref::<T>(),
            Source::KeyValue(_) | Source::Value(_) => None,
        }
    }

    /// The wrapped record, when the context was built from one.
    pub fn key_value(&self) -> Option<&'a Map<String, Value>> {
        match self.source {
            Source::KeyValue(map) => Some(map),
            Source::Instance(_) | Source::Value(_) => None,
        }
    }

    pub fn is_key_value(&self) -> bool {
        matches!(self.source, Source::KeyValue(_))
    }

    /// Whether the source actually carries `member`. Instances always do;
    /// records only when the key is present.
    pub fn has_value(&self, member: &str) -> bool {
        match self.source {
            Source::KeyValue(map) => map.contains_key(member),
            Source::Instance(_) => self.contract.contains_member(member),
            Source::Value(_) => false,
        }
    }

    /// Read one member. Unknown members yield `None`.
    pub fn value(&self, member: &str) -> Option<Value> {
        self.contract
            .member(member)
            .map(|descriptor| self.read(descriptor))
    }

    /// A member context for `member`, if the contract declares it.
    pub fn member(&self, member: &str) -> Option<MemberContext<'_>> {
        let descriptor = self.contract.member(member)?.clone();
        let value = self.read(&descriptor);
        Some(MemberContext {
            descriptor,
            value,
            parent: Some(self),
        })
    }

    /// Member contexts in contract order.
    pub fn members(&self) -> impl Iterator<Item = MemberContext<'_>> + '_ {
        self.contract.members().iter().map(move |descriptor| MemberContext {
            descriptor: descriptor.clone(),
            value: self.read(descriptor),
            parent: Some(self),
        })
    }

    /// The whole object as a JSON value.
    pub fn to_value(&self) -> Value {
        match self.source {
            Source::KeyValue(map) => Value::Object(map.clone()),
            Source::Value(value) => value.clone(),
            Source::Instance(instance) => Value::Object(
                self.contract
                    .members()
                    .iter()
                    .map(|m| (m.name().to_string(), m.value_of(instance)))
                    .collect(),
            ),
        }
    }

    fn read(&self, descriptor: &MemberDescriptor) -> Value {
        match self.source {
            Source::Instance(instance) => descriptor.value_of(instance),
            Source::KeyValue(map) => descriptor.value_in(map),
            Source::Value(_) => Value::Null,
        }
    }
}

/// One member value, optionally with the object it was read from.
#[derive(Clone)]
pub struct MemberContext<'a> {
    descriptor: Arc<MemberDescriptor>,
    value: Value,
    parent: Option<&'a ObjectContext<'a>>,
}

impl<'a> MemberContext<'a> {
    /// A member value verified in isolation, without its object.
    pub fn detached(descriptor: Arc<MemberDescriptor>, value: Value) -> Self {
        Self {
            descriptor,
            value,
            parent: None,
        }
    }

    /// A member value verified alongside its object.
    pub fn with_parent(
        descriptor: Arc<MemberDescriptor>,
        value: Value,
        parent: &'a ObjectContext<'a>,
    ) -> Self {
        Self {
            descriptor,
            value,
            parent: Some(parent),
        }
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn descriptor(&self) -> &Arc<MemberDescriptor> {
        &self.descriptor
    }

    pub fn value_type(&self) -> &TypeKey {
        self.descriptor.value_type()
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn parent(&self) -> Option<&'a ObjectContext<'a>> {
        self.parent
    }

    /// Read a sibling member through the parent object.
    pub fn sibling(&self, member: &str) -> Option<Value> {
        self.parent.and_then(|parent| parent.value(member))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{ContractCache, MemberSet, Verifiable};
    use serde_json::json;

    struct Account {
        owner: String,
        balance: i64,
    }

    impl Verifiable for Account {
        fn describe(members: &mut MemberSet<Self>) {
            members.property("owner", |a: &Account| &a.owner);
            members.property("balance", |a: &Account| &a.balance);
        }
    }

    #[test]
    fn instance_and_record_read_the_same_members() {
        let cache = ContractCache::new();
        let contract = cache.resolve::<Account>().unwrap();
        let account = Account {
            owner: "ann".into(),
            balance: 10,
        };
        let record = json!({"owner": "ann", "balance": 10});

        let from_instance = ObjectContext::for_instance(contract.clone(), &account);
        let from_record = ObjectContext::for_key_value(contract, record.as_object().unwrap());

        assert_eq!(from_instance.to_value(), record);
        assert_eq!(from_record.value("balance"), Some(json!(10)));
        assert_eq!(from_instance.instance_name(), INSTANCE_MEMBER);
        assert_eq!(from_record.instance_name(), KEY_VALUE_MEMBER);
        assert!(from_instance.instance::<Account>().is_some());
        assert!(from_record.instance::<Account>().is_none());
    }

    #[test]
    fn missing_record_keys_read_as_null() {
        let cache = ContractCache::new();
        let contract = cache.resolve::<Account>().unwrap();
        let record = json!({"owner": "ann"});
        let context = ObjectContext::for_key_value(contract, record.as_object().unwrap());

        assert!(!context.has_value("balance"));
        assert_eq!(context.value("balance"), Some(Value::Null));
        assert_eq!(context.value("missing"), None);
    }

    #[test]
    fn member_contexts_reach_siblings() {
        let cache = ContractCache::new();
        let contract = cache.resolve::<Account>().unwrap();
        let account = Account {
            owner: "bob".into(),
            balance: -5,
        };
        let context = ObjectContext::for_instance(contract, &account);
        let balance = context.member("balance").unwrap();
        assert_eq!(balance.value(), &json!(-5));
        assert_eq!(balance.sibling("owner"), Some(json!("bob")));
        assert_eq!(context.members().count(), 2);
    }
}
