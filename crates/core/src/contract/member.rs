//! Member descriptors: one validatable member of a contract.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::annotation::Annotation;
use crate::types::TypeKey;

/// Reads a member value out of a type-erased instance.
///
/// Returns `None` when the instance is not of the declaring type.
pub(crate) type InstanceGetter = Arc<dyn Fn(&dyn Any) -> Option<Value> + Send + Sync>;

/// Whether a member was declared as a property or as a field.
///
/// Properties are ordered before fields inside a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Property,
    Field,
}

/// Description of one member of a type.
#[derive(Clone)]
pub struct MemberDescriptor {
    pub(crate) name: String,
    pub(crate) kind: MemberKind,
    pub(crate) value_type: TypeKey,
    pub(crate) nested_type: Option<TypeKey>,
    pub(crate) annotations: Vec<Annotation>,
    pub(crate) include_annotations: bool,
    pub(crate) getter: Option<InstanceGetter>,
}

impl MemberDescriptor {
    /// A member that can only be read from key/value records.
    ///
    /// Used for custom member maps and for contracts derived from a map.
    pub fn keyed(name: impl Into<String>, value_type: TypeKey) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Property,
            value_type,
            nested_type: None,
            annotations: Vec::new(),
            include_annotations: true,
            getter: None,
        }
    }

    /// A member readable from instances of `T` through `getter`.
    pub fn for_instance<T, F>(
        name: impl Into<String>,
        kind: MemberKind,
        value_type: TypeKey,
        getter: F,
    ) -> Self
    where
        T: Any,
        F: Fn(&T) -> Value + Send + Sync + 'static,
    {
        let getter: InstanceGetter =
            Arc::new(move |instance: &dyn Any| instance.downcast_ref::<T>().map(&getter));
        Self {
            name: name.into(),
            kind,
            value_type,
            nested_type: None,
            annotations: Vec::new(),
            include_annotations: true,
            getter: Some(getter),
        }
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn without_annotations(mut self) -> Self {
        self.include_annotations = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    pub fn value_type(&self) -> &TypeKey {
        &self.value_type
    }

    /// Whether the member holds a nested structured type.
    pub fn is_structure(&self) -> bool {
        self.nested_type.is_some()
    }

    pub fn is_basic_type(&self) -> bool {
        self.nested_type.is_none()
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Whether the annotation tier should look at this member.
    pub fn include_annotations(&self) -> bool {
        self.include_annotations && !self.annotations.is_empty()
    }

    /// Read the member from an instance. Absent getters or a foreign
    /// instance type yield `Null`.
    pub fn value_of(&self, instance: &dyn Any) -> Value {
        self.getter
            .as_ref()
            .and_then(|getter| getter(instance))
            .unwrap_or(Value::Null)
    }

    /// Read the member from a key/value record. Missing keys yield `Null`.
    pub fn value_in(&self, map: &Map<String, Value>) -> Value {
        map.get(&self.name).cloned().unwrap_or(Value::Null)
    }
}

impl fmt::Debug for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("value_type", &self.value_type)
            .field("nested_type", &self.nested_type)
            .field("annotations", &self.annotations.len())
            .field("include_annotations", &self.include_annotations)
            .finish()
    }
}

impl Serialize for MemberDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("MemberDescriptor", 4)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("kind", &self.kind)?;
        state.serialize_field("value_type", &self.value_type)?;
        state.serialize_field("is_structure", &self.is_structure())?;
        state.end()
    }
}

/// Serialize a member value, mapping serializer failures to `Null`.
pub(crate) fn to_member_value<V: Serialize + ?Sized>(member: &str, value: &V) -> Value {
    match serde_json::to_value(value) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(member, error = %e, "Member value could not be serialized");
            Value::Null
        }
    }
}
