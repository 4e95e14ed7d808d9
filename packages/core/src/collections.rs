//! Typed containers used by every schema entity.
//!
//! [`TypedMap`] is an insertion-ordered map keyed by a [`Primitive`], and
//! [`TypedList`] is an ordered sequence. Element types are fixed by the
//! generic parameters, so ordinary writes cannot go wrong; the only fallible
//! writes are the explicit `*_json` conversions from raw JSON, which fail with
//! [`ContainerError::TypeMismatch`].

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use serde::de::{DeserializeOwned, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

use crate::primitives::Primitive;

/// Errors raised when a container is handed a value of the wrong shape.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContainerError {
    #[error("type mismatch: expected {expected}: {detail}")]
    TypeMismatch { expected: &'static str, detail: String },
}

impl ContainerError {
    fn mismatch<T>(detail: impl fmt::Display) -> Self {
        Self::TypeMismatch {
            expected: std::any::type_name::<T>(),
            detail: detail.to_string(),
        }
    }
}

// --- TypedMap ----------------------------------------------------------------

/// A map from `K` to `V` that remembers insertion order.
///
/// Replacing an existing key keeps its original position; removing a key
/// keeps the relative order of the rest. Iteration order is therefore stable,
/// which projections depend on.
#[derive(Clone)]
pub struct TypedMap<K, V> {
    entries: Vec<(K, V)>,
    index: HashMap<K, usize>,
}

impl<K, V> Default for TypedMap<K, V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K: Primitive, V> TypedMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. Returns the previous value for `key`, if any.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.insert_full(key, value).1
    }

    /// Insert or replace, returning the stored value alongside the previous one.
    pub fn insert_full(&mut self, key: K, value: V) -> (&V, Option<V>) {
        let (pos, previous) = match self.index.get(&key) {
            Some(&pos) => (pos, Some(std::mem::replace(&mut self.entries[pos].1, value))),
            None => {
                let pos = self.entries.len();
                self.index.insert(key.clone(), pos);
                self.entries.push((key, value));
                (pos, None)
            }
        };
        (&self.entries[pos].1, previous)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.index.get(key).map(|&pos| &self.entries[pos].1)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        match self.index.get(key) {
            Some(&pos) => Some(&mut self.entries[pos].1),
            None => None,
        }
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Remove `key`, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let pos = self.index.remove(key)?;
        let (_, value) = self.entries.remove(pos);
        for slot in self.index.values_mut() {
            if *slot > pos {
                *slot -= 1;
            }
        }
        Some(value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }
}

impl<K: Primitive, V: DeserializeOwned> TypedMap<K, V> {
    /// Parse `key` and `value` from raw input and insert them.
    ///
    /// This is the only way to put untyped data into a map; a key that fails
    /// primitive validation or a value that does not deserialise into `V`
    /// is rejected and the map is left unchanged.
    pub fn insert_json(&mut self, key: &str, value: Value) -> Result<Option<V>, ContainerError> {
        let key = K::parse(key).map_err(ContainerError::mismatch::<K>)?;
        let value = serde_json::from_value(value).map_err(ContainerError::mismatch::<V>)?;
        Ok(self.insert(key, value))
    }
}

impl<K: Primitive, V: PartialEq> PartialEq for TypedMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<K: Primitive, V: Eq> Eq for TypedMap<K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for TypedMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

impl<K: Primitive, V> FromIterator<(K, V)> for TypedMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<K: Primitive, V> Extend<(K, V)> for TypedMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<'a, K: Primitive, V> IntoIterator for &'a TypedMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = std::iter::Map<std::slice::Iter<'a, (K, V)>, fn(&'a (K, V)) -> (&'a K, &'a V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter().map(entry_refs as fn(&'a (K, V)) -> (&'a K, &'a V))
    }
}

fn entry_refs<K, V>(entry: &(K, V)) -> (&K, &V) {
    (&entry.0, &entry.1)
}

impl<K: Primitive, V: Serialize> Serialize for TypedMap<K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k.as_str(), v)?;
        }
        map.end()
    }
}

struct TypedMapVisitor<K, V>(PhantomData<(K, V)>);

impl<'de, K: Primitive, V: Deserialize<'de>> Visitor<'de> for TypedMapVisitor<K, V> {
    type Value = TypedMap<K, V>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a map keyed by {}", K::KIND)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = TypedMap::new();
        while let Some(raw) = access.next_key::<String>()? {
            let key = K::parse(&raw).map_err(|e| {
                serde::de::Error::custom(ContainerError::mismatch::<K>(e))
            })?;
            let value = access.next_value::<V>()?;
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<'de, K: Primitive, V: Deserialize<'de>> Deserialize<'de> for TypedMap<K, V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(TypedMapVisitor(PhantomData))
    }
}

// --- TypedList ---------------------------------------------------------------

/// An ordered sequence of `T`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypedList<T>(Vec<T>);

impl<T> Default for TypedList<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> TypedList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: T) {
        self.0.push(item);
    }

    /// Insert at `index`. Indices past the end append.
    pub fn insert(&mut self, index: usize, item: T) {
        let index = index.min(self.0.len());
        self.0.insert(index, item);
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.0.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl<T: PartialEq> TypedList<T> {
    pub fn contains(&self, item: &T) -> bool {
        self.0.contains(item)
    }
}

impl<T: DeserializeOwned> TypedList<T> {
    /// Parse `value` into a `T` and append it.
    ///
    /// Appending a raw JSON object to a list of entities goes through here,
    /// so a malformed object is reported instead of silently stored.
    pub fn push_json(&mut self, value: Value) -> Result<(), ContainerError> {
        let item = serde_json::from_value(value).map_err(ContainerError::mismatch::<T>)?;
        self.0.push(item);
        Ok(())
    }
}

impl<T> From<Vec<T>> for TypedList<T> {
    fn from(items: Vec<T>) -> Self {
        Self(items)
    }
}

impl<T> FromIterator<T> for TypedList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<T> Extend<T> for TypedList<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl<'a, T> IntoIterator for &'a TypedList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<T> IntoIterator for TypedList<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{NodeId, NodeTypeRef, SafeStrText, SafeUInt};
    use serde_json::json;

    fn id(seed: &str) -> NodeId {
        NodeId::from_seed(seed)
    }

    #[test]
    fn map_preserves_insertion_order() {
        let mut map: TypedMap<NodeId, u32> = TypedMap::new();
        map.insert(id("c"), 3);
        map.insert(id("a"), 1);
        map.insert(id("b"), 2);
        let values: Vec<_> = map.values().copied().collect();
        assert_eq!(values, vec![3, 1, 2]);
    }

    #[test]
    fn map_replace_keeps_position() {
        let mut map: TypedMap<NodeId, u32> = TypedMap::new();
        map.insert(id("a"), 1);
        map.insert(id("b"), 2);
        assert_eq!(map.insert(id("a"), 10), Some(1));
        let values: Vec<_> = map.values().copied().collect();
        assert_eq!(values, vec![10, 2]);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn map_remove_keeps_remaining_order() {
        let mut map: TypedMap<NodeId, u32> = (1..=4).map(|n| (id(&n.to_string()), n)).collect();
        assert_eq!(map.remove(&id("2")), Some(2));
        assert_eq!(map.remove(&id("2")), None);
        let values: Vec<_> = map.values().copied().collect();
        assert_eq!(values, vec![1, 3, 4]);
        assert_eq!(map.get(&id("4")), Some(&4));
        assert!(!map.contains_key(&id("2")));
    }

    #[test]
    fn map_serialises_with_string_keys() {
        let mut map: TypedMap<NodeTypeRef, SafeUInt> = TypedMap::new();
        map.insert(NodeTypeRef::new("module").unwrap(), SafeUInt::new(1));
        map.insert(NodeTypeRef::new("class").unwrap(), SafeUInt::new(2));
        let text = serde_json::to_string(&map).unwrap();
        assert_eq!(text, r#"{"module":1,"class":2}"#);
        let back: TypedMap<NodeTypeRef, SafeUInt> = serde_json::from_str(&text).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn map_rejects_bad_keys_on_deserialise() {
        let err = serde_json::from_str::<TypedMap<NodeId, u32>>(r#"{"not-hex!":1}"#).unwrap_err();
        assert!(err.to_string().contains("type mismatch"));
    }

    #[test]
    fn insert_json_checks_key_and_value() {
        let mut map: TypedMap<NodeId, SafeUInt> = TypedMap::new();
        assert!(map.insert_json("a1234567", json!(5)).is_ok());
        assert!(matches!(
            map.insert_json("bad key", json!(5)),
            Err(ContainerError::TypeMismatch { .. })
        ));
        assert!(matches!(
            map.insert_json("b1234567", json!(true)),
            Err(ContainerError::TypeMismatch { .. })
        ));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn list_push_json_rejects_bool_for_integers() {
        let mut list: TypedList<SafeUInt> = TypedList::new();
        list.push_json(json!(1)).unwrap();
        assert!(list.push_json(json!(false)).is_err());
        assert!(list.push_json(json!(null)).is_err());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn list_nested_generics_validate_structurally() {
        let mut list: TypedList<TypedMap<NodeTypeRef, TypedList<SafeUInt>>> = TypedList::new();
        list.push_json(json!({"module": [1, 2, 3]})).unwrap();
        assert!(list.push_json(json!({"module": [1, "two"]})).is_err());
        assert!(list.push_json(json!({"bad key": [1]})).is_err());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn list_insert_clamps_to_end() {
        let mut list: TypedList<SafeStrText> = TypedList::new();
        list.push(SafeStrText::new("a").unwrap());
        list.insert(10, SafeStrText::new("c").unwrap());
        list.insert(1, SafeStrText::new("b").unwrap());
        let texts: Vec<_> = list.iter().map(|t| t.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
        assert!(list.contains(&SafeStrText::new("b").unwrap()));
    }
}
