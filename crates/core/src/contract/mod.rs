//! Contracts: cached, ordered descriptions of a type's validatable members.
//!
//! A [`Contract`] is built once per type by the [`ContractCache`] and shared
//! behind an `Arc`. Types describe themselves through [`Verifiable`]; dynamic
//! types can be described by a [`MemberProvider`] or a custom member map.

pub mod cache;
pub mod member;

use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

pub use cache::{ContractCache, MemberProvider};
pub use member::{MemberDescriptor, MemberKind};

use crate::annotation::Annotation;
use crate::error::ValidationError;
use crate::types::{ObjectKind, TypeKey};

// ---------------------------------------------------------------------------
// Verifiable
// ---------------------------------------------------------------------------

/// A type that can describe its own validatable members.
///
/// ```
/// use vouch_core::contract::{MemberSet, Verifiable};
///
/// struct Boat {
///     name: String,
///     length: i64,
/// }
///
/// impl Verifiable for Boat {
///     fn describe(members: &mut MemberSet<Self>) {
///         members.property("Name", |b: &Boat| &b.name);
///         members.property("Length", |b: &Boat| &b.length);
///     }
/// }
/// ```
pub trait Verifiable: Any + Send + Sync + Sized {
    fn describe(members: &mut MemberSet<Self>);
}

// ---------------------------------------------------------------------------
// MemberSet
// ---------------------------------------------------------------------------

/// Collects member declarations for a [`Verifiable`] type.
pub struct MemberSet<T> {
    members: Vec<MemberDescriptor>,
    annotations: Vec<Annotation>,
    include_annotations: bool,
    _marker: PhantomData<fn(&T)>,
}

/// Handle to the member just declared, for attaching annotations.
pub struct MemberHandle<'a> {
    member: &'a mut MemberDescriptor,
}

impl MemberHandle<'_> {
    pub fn annotate(self, annotation: Annotation) -> Self {
        self.member.annotations.push(annotation);
        self
    }

    /// Exclude this member from the annotation tier.
    pub fn skip_annotations(self) -> Self {
        self.member.include_annotations = false;
        self
    }
}

impl<T: Any + Send + Sync> MemberSet<T> {
    pub(crate) fn new() -> Self {
        Self {
            members: Vec::new(),
            annotations: Vec::new(),
            include_annotations: true,
            _marker: PhantomData,
        }
    }

    /// Declare a property-like member.
    pub fn property<V, F>(&mut self, name: &str, getter: F) -> MemberHandle<'_>
    where
        V: Serialize + ?Sized + 'static,
        F: Fn(&T) -> &V + Send + Sync + 'static,
    {
        self.push::<V, F>(name, MemberKind::Property, getter, None)
    }

    /// Declare a field-like member. Fields are ordered after all properties.
    pub fn field<V, F>(&mut self, name: &str, getter: F) -> MemberHandle<'_>
    where
        V: Serialize + ?Sized + 'static,
        F: Fn(&T) -> &V + Send + Sync + 'static,
    {
        self.push::<V, F>(name, MemberKind::Field, getter, None)
    }

    /// Declare a property holding a nested [`Verifiable`] structure.
    pub fn nested<V, F>(&mut self, name: &str, getter: F) -> MemberHandle<'_>
    where
        V: Verifiable + Serialize,
        F: Fn(&T) -> &V + Send + Sync + 'static,
    {
        self.push::<V, F>(name, MemberKind::Property, getter, Some(TypeKey::of::<V>()))
    }

    /// Attach a type-level annotation, evaluated against the whole object.
    pub fn annotate_type(&mut self, annotation: Annotation) -> &mut Self {
        self.annotations.push(annotation);
        self
    }

    /// Turn the annotation tier off for this type.
    pub fn disable_annotations(&mut self) -> &mut Self {
        self.include_annotations = false;
        self
    }

    fn push<V, F>(
        &mut self,
        name: &str,
        kind: MemberKind,
        getter: F,
        nested_type: Option<TypeKey>,
    ) -> MemberHandle<'_>
    where
        V: Serialize + ?Sized + 'static,
        F: Fn(&T) -> &V + Send + Sync + 'static,
    {
        let member_name = name.to_string();
        let mut descriptor = MemberDescriptor::for_instance::<T, _>(
            name,
            kind,
            TypeKey::of::<V>(),
            move |instance: &T| member::to_member_value(&member_name, getter(instance)),
        );
        descriptor.nested_type = nested_type;
        self.members.push(descriptor);
        let last = self.members.len() - 1;
        MemberHandle {
            member: &mut self.members[last],
        }
    }

    pub(crate) fn into_contract(self, type_key: TypeKey) -> Result<Contract, ValidationError> {
        let mut contract = Contract::structure(type_key, self.members)?;
        contract.annotations = self.annotations;
        contract.include_annotations = self.include_annotations;
        Ok(contract)
    }
}

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

/// The full, immutable description of a type.
#[derive(Debug, Clone)]
pub struct Contract {
    type_key: TypeKey,
    kind: ObjectKind,
    members: Vec<Arc<MemberDescriptor>>,
    index: HashMap<String, usize>,
    annotations: Vec<Annotation>,
    include_annotations: bool,
}

impl Contract {
    /// A structure contract over `members`.
    ///
    /// Properties are stably ordered before fields. Blank or duplicate
    /// member names are rejected.
    pub fn structure(
        type_key: TypeKey,
        mut members: Vec<MemberDescriptor>,
    ) -> Result<Self, ValidationError> {
        members.sort_by_key(|m| m.kind);

        let mut index = HashMap::with_capacity(members.len());
        for (position, member) in members.iter().enumerate() {
            if member.name.trim().is_empty() {
                return Err(ValidationError::BlankMemberName);
            }
            if index.insert(member.name.clone(), position).is_some() {
                return Err(ValidationError::DuplicateMember {
                    type_name: type_key.name().to_string(),
                    member: member.name.clone(),
                });
            }
        }

        Ok(Self {
            type_key,
            kind: ObjectKind::StructureType,
            members: members.into_iter().map(Arc::new).collect(),
            index,
            annotations: Vec::new(),
            include_annotations: true,
        })
    }

    /// A contract with no members.
    pub fn basic(type_key: TypeKey) -> Self {
        Self::empty(type_key, ObjectKind::BasicType)
    }

    /// A contract for a sequence value; it has no members of its own.
    pub fn collection(type_key: TypeKey) -> Self {
        Self::empty(type_key, ObjectKind::CollectionType)
    }

    /// A structure contract whose members are the keys of `map`.
    pub fn from_map(type_key: TypeKey, map: &Map<String, Value>) -> Self {
        let members = map
            .keys()
            .map(|key| Arc::new(MemberDescriptor::keyed(key.clone(), TypeKey::of::<Value>())))
            .collect::<Vec<_>>();
        let index = members
            .iter()
            .enumerate()
            .map(|(position, m)| (m.name.clone(), position))
            .collect();
        Self {
            type_key,
            kind: ObjectKind::StructureType,
            members,
            index,
            annotations: Vec::new(),
            include_annotations: true,
        }
    }

    fn empty(type_key: TypeKey, kind: ObjectKind) -> Self {
        Self {
            type_key,
            kind,
            members: Vec::new(),
            index: HashMap::new(),
            annotations: Vec::new(),
            include_annotations: true,
        }
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn type_key(&self) -> &TypeKey {
        &self.type_key
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn is_basic_type(&self) -> bool {
        self.kind == ObjectKind::BasicType
    }

    pub fn members(&self) -> &[Arc<MemberDescriptor>] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&Arc<MemberDescriptor>> {
        self.index.get(name).map(|&position| &self.members[position])
    }

    /// Position of `name` in member order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn member_at(&self, position: usize) -> Option<&Arc<MemberDescriptor>> {
        self.members.get(position)
    }

    pub fn contains_member(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|m| m.name())
    }

    /// Type-level annotations.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Whether the annotation tier is enabled for this type.
    pub fn include_annotations(&self) -> bool {
        self.include_annotations
    }

    pub(crate) fn disable_annotations(mut self) -> Self {
        self.include_annotations = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    struct NiceBoat {
        name: String,
        length: i64,
        width: f64,
        email: String,
        create_time: String,
    }

    impl Verifiable for NiceBoat {
        fn describe(members: &mut MemberSet<Self>) {
            members.property("Name", |b: &NiceBoat| &b.name);
            members.property("Length", |b: &NiceBoat| &b.length);
            members.property("Width", |b: &NiceBoat| &b.width);
            members.field("CreateTime", |b: &NiceBoat| &b.create_time);
            members.property("Email", |b: &NiceBoat| &b.email);
        }
    }

    fn boat() -> NiceBoat {
        NiceBoat {
            name: "Nice".into(),
            length: 1000,
            width: 30.5,
            email: "nice@boat.com".into(),
            create_time: "2020-01-01".into(),
        }
    }

    fn contract() -> Contract {
        let mut members = MemberSet::<NiceBoat>::new();
        NiceBoat::describe(&mut members);
        members.into_contract(TypeKey::of::<NiceBoat>()).unwrap()
    }

    #[test]
    fn properties_are_ordered_before_fields() {
        let contract = contract();
        let names: Vec<_> = contract.member_names().collect();
        assert_eq!(names, vec!["Name", "Length", "Width", "Email", "CreateTime"]);
        assert_eq!(contract.kind(), ObjectKind::StructureType);
        assert_eq!(contract.member_at(3).unwrap().name(), "Email");
    }

    #[test]
    fn getters_read_serialized_values() {
        let contract = contract();
        let boat = boat();
        assert_eq!(contract.member("Length").unwrap().value_of(&boat), json!(1000));
        assert_eq!(contract.member("Width").unwrap().value_of(&boat), json!(30.5));
        assert!(contract.member("Length").unwrap().value_type().is::<i64>());
    }

    #[test]
    fn foreign_instances_read_as_null() {
        let contract = contract();
        assert_eq!(contract.member("Name").unwrap().value_of(&42_u8), Value::Null);
    }

    #[test]
    fn duplicate_members_are_rejected() {
        let members = vec![
            MemberDescriptor::keyed("id", TypeKey::of::<i64>()),
            MemberDescriptor::keyed("id", TypeKey::of::<i64>()),
        ];
        let err = Contract::structure(TypeKey::named("Order").unwrap(), members).unwrap_err();
        assert_matches!(err, ValidationError::DuplicateMember { ref member, .. } if member == "id");
    }

    #[test]
    fn map_contract_uses_map_keys() {
        let map = json!({"b": 1, "a": 2});
        let contract = Contract::from_map(TypeKey::of::<Value>(), map.as_object().unwrap());
        assert_eq!(contract.members().len(), 2);
        assert!(contract.contains_member("a"));
        assert_eq!(contract.member("b").unwrap().value_in(map.as_object().unwrap()), json!(1));
    }
}
