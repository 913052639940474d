//! Type identity and structural kinds shared across the engine.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::Serialize;

use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// TypeKey
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Identity {
    Rust(TypeId),
    Named(Arc<str>),
}

/// Identity of a validatable type.
///
/// Either a Rust type (compared by [`TypeId`]) or a dynamic type known only
/// by name, e.g. a key/value record loaded at runtime. Equality and hashing
/// ignore the display name of Rust types.
#[derive(Debug, Clone)]
pub struct TypeKey {
    identity: Identity,
    name: Arc<str>,
}

impl TypeKey {
    /// Identity of the Rust type `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            identity: Identity::Rust(TypeId::of::<T>()),
            name: Arc::from(std::any::type_name::<T>()),
        }
    }

    /// Identity of a dynamic type known only by name.
    pub fn named(name: impl AsRef<str>) -> Result<Self, ValidationError> {
        let name = name.as_ref().trim();
        if name.is_empty() {
            return Err(ValidationError::BlankTypeName);
        }
        let name: Arc<str> = Arc::from(name);
        Ok(Self {
            identity: Identity::Named(name.clone()),
            name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this key identifies the Rust type `T`.
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.identity == Identity::Rust(TypeId::of::<T>())
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity.hash(state);
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Serialize for TypeKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name)
    }
}

// ---------------------------------------------------------------------------
// ObjectKind
// ---------------------------------------------------------------------------

/// Structural kind of a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// A terminal value with no members (numbers, strings, unknown types).
    BasicType,
    /// A type with named members.
    StructureType,
    /// A sequence of values.
    CollectionType,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BasicType => "basic_type",
            Self::StructureType => "structure_type",
            Self::CollectionType => "collection_type",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TypeSet
// ---------------------------------------------------------------------------

/// A compile-time list of 1 to 16 candidate types, written as a tuple.
///
/// ```
/// use vouch_core::types::{TypeKey, TypeSet};
///
/// let keys = <(i32, String)>::type_keys();
/// assert_eq!(keys, vec![TypeKey::of::<i32>(), TypeKey::of::<String>()]);
/// ```
pub trait TypeSet {
    fn type_keys() -> Vec<TypeKey>;
}

macro_rules! impl_type_set {
    ($($t:ident),+) => {
        impl<$($t: 'static),+> TypeSet for ($($t,)+) {
            fn type_keys() -> Vec<TypeKey> {
                vec![$(TypeKey::of::<$t>()),+]
            }
        }
    };
}

impl_type_set!(T1);
impl_type_set!(T1, T2);
impl_type_set!(T1, T2, T3);
impl_type_set!(T1, T2, T3, T4);
impl_type_set!(T1, T2, T3, T4, T5);
impl_type_set!(T1, T2, T3, T4, T5, T6);
impl_type_set!(T1, T2, T3, T4, T5, T6, T7);
impl_type_set!(T1, T2, T3, T4, T5, T6, T7, T8);
impl_type_set!(T1, T2, T3, T4, T5, T6, T7, T8, T9);
impl_type_set!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10);
impl_type_set!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11);
impl_type_set!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12);
impl_type_set!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12, T13);
impl_type_set!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12, T13, T14);
impl_type_set!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12, T13, T14, T15);
impl_type_set!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12, T13, T14, T15, T16);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_keys_compare_by_type_id() {
        assert_eq!(TypeKey::of::<String>(), TypeKey::of::<String>());
        assert_ne!(TypeKey::of::<String>(), TypeKey::of::<i32>());
        assert!(TypeKey::of::<u8>().is::<u8>());
    }

    #[test]
    fn named_keys_reject_blank_names() {
        assert!(TypeKey::named("  ").is_err());
        let key = TypeKey::named(" Order ").unwrap();
        assert_eq!(key.name(), "Order");
        assert_eq!(key, TypeKey::named("Order").unwrap());
        assert_ne!(key, TypeKey::of::<String>());
    }

    #[test]
    fn tuple_type_sets_keep_order() {
        let keys = <(u8, i64, String)>::type_keys();
        assert_eq!(keys.len(), 3);
        assert!(keys[0].is::<u8>());
        assert!(keys[2].is::<String>());
    }
}
