//! Typed pointer ids.

use crate::types::PointerId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// A pointer id tagged with the type of value it holds.
///
/// `Ptr<T>` is a plain `Copy` id. It serializes as the bare integer, so
/// pointers can be stored inside other values, e.g. a registry of
/// `HashMap<String, Ptr<String>>` kept behind the root pointer.
pub struct Ptr<T> {
    id: PointerId,
    _value: PhantomData<fn() -> T>,
}

impl<T> Ptr<T> {
    /// Wraps a raw pointer id. The caller asserts it holds a `T`.
    #[must_use]
    pub const fn from_id(id: PointerId) -> Self {
        Self {
            id,
            _value: PhantomData,
        }
    }

    /// Returns the untyped id.
    #[must_use]
    pub const fn id(self) -> PointerId {
        self.id
    }

    /// Reinterprets the pointer as holding a `U`.
    #[must_use]
    pub const fn cast<U>(self) -> Ptr<U> {
        Ptr::from_id(self.id)
    }
}

impl<T> Clone for Ptr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Ptr<T> {}

impl<T> PartialEq for Ptr<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Ptr<T> {}

impl<T> Hash for Ptr<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for Ptr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ptr<{}>({})", std::any::type_name::<T>(), self.id.0)
    }
}

impl<T> fmt::Display for Ptr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.id, f)
    }
}

impl<T> From<Ptr<T>> for PointerId {
    fn from(ptr: Ptr<T>) -> Self {
        ptr.id
    }
}

impl<T> Serialize for Ptr<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.id.0)
    }
}

impl<'de, T> Deserialize<'de> for Ptr<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u64::deserialize(deserializer).map(|id| Ptr::from_id(PointerId(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use stm_codec::{decode_with, encode_with, CanonicalCbor};

    #[test]
    fn ptr_is_copy_without_bounds_on_t() {
        struct NotClone;
        let a: Ptr<NotClone> = Ptr::from_id(PointerId(3));
        let b = a;
        assert_eq!(a, b);
        assert_eq!(a.id(), PointerId(3));
        assert_eq!(a.to_string(), "ptr:3");
    }

    #[test]
    fn ptr_serializes_as_integer() {
        let mut registry: BTreeMap<String, Ptr<String>> = BTreeMap::new();
        registry.insert("test".into(), Ptr::from_id(PointerId(5)));
        let bytes = encode_with(&CanonicalCbor, &registry).unwrap();
        // {"test": 5}
        assert_eq!(bytes, vec![0xa1, 0x64, b't', b'e', b's', b't', 0x05]);
        let back: BTreeMap<String, Ptr<String>> = decode_with(&CanonicalCbor, &bytes).unwrap();
        assert_eq!(back, registry);
    }

    #[test]
    fn cast_keeps_id() {
        let p: Ptr<u32> = Ptr::from_id(PointerId(1));
        let q: Ptr<String> = p.cast();
        assert_eq!(PointerId::from(q), PointerId(1));
    }
}
