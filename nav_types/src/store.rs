//! Copy-on-write entity store.
//!
//! A `Store` is an `Arc`-shared ordered map of `Arc`-shared entities.
//! Cloning a store is O(1). Writing through `insert`/`remove` copies the map
//! of pointers only when another snapshot still shares it; the entities
//! themselves are never deep-copied.
//!
//! ```text
//! snapshot v1 ──► Arc<BTreeMap> ──► Arc<Node a>, Arc<Node b>
//! snapshot v2 ──► Arc<BTreeMap'> ─┘        ▲
//!                      └─────────► Arc<Node c>
//! ```

use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Identity-keyed entity store with structural sharing.
#[derive(Debug)]
pub struct Store<K, V> {
    entries: Arc<BTreeMap<K, Arc<V>>>,
}

impl<K, V> Clone for Store<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<K: Ord, V> Default for Store<K, V> {
    fn default() -> Self {
        Self {
            entries: Arc::new(BTreeMap::new()),
        }
    }
}

impl<K: Ord + Clone, V> Store<K, V> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entities.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the store is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entity by identity.
    pub fn get(&self, id: &K) -> Option<&V> {
        self.entries.get(id).map(Arc::as_ref)
    }

    /// Look up the shared handle of an entity.
    pub fn get_arc(&self, id: &K) -> Option<&Arc<V>> {
        self.entries.get(id)
    }

    /// Check if an identity is present.
    pub fn contains_key(&self, id: &K) -> bool {
        self.entries.contains_key(id)
    }

    /// Iterate entities in identity order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v.as_ref()))
    }

    /// Iterate identities in order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    /// Iterate entities in identity order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values().map(Arc::as_ref)
    }

    /// Insert or replace an entity, returning the previous one.
    pub fn insert(&mut self, id: K, value: V) -> Option<Arc<V>> {
        Arc::make_mut(&mut self.entries).insert(id, Arc::new(value))
    }

    /// Remove an entity, returning it.
    pub fn remove(&mut self, id: &K) -> Option<Arc<V>> {
        if !self.entries.contains_key(id) {
            return None;
        }
        Arc::make_mut(&mut self.entries).remove(id)
    }

    /// Produce a store where `f` may replace individual entities.
    ///
    /// `f` returns `Some(new)` to replace an entity and `None` to keep it.
    /// Untouched entities keep their `Arc`; when nothing changes the result
    /// shares the whole map with `self`.
    pub fn map_changed<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&K, &V) -> Option<V>,
    {
        let mut replacements: Vec<(K, V)> = Vec::new();
        for (id, value) in self.entries.iter() {
            if let Some(updated) = f(id, value) {
                replacements.push((id.clone(), updated));
            }
        }

        if replacements.is_empty() {
            return self.clone();
        }

        let mut next = self.clone();
        let map = Arc::make_mut(&mut next.entries);
        for (id, value) in replacements {
            map.insert(id, Arc::new(value));
        }
        next
    }

    /// True when both stores share the same underlying map.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }
}

impl<K: Ord + Clone, V> FromIterator<(K, V)> for Store<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: Arc::new(iter.into_iter().map(|(k, v)| (k, Arc::new(v))).collect()),
        }
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for Store<K, V> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries) || *self.entries == *other.entries
    }
}

impl<K: Serialize, V: Serialize> Serialize for Store<K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in self.entries.iter() {
            map.serialize_entry(k, v.as_ref())?;
        }
        map.end()
    }
}

impl<'de, K, V> Deserialize<'de> for Store<K, V>
where
    K: Deserialize<'de> + Ord + Clone,
    V: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<K, V>::deserialize(deserializer)?;
        Ok(raw.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_shares_and_insert_copies_on_write() {
        let mut a: Store<String, u32> = Store::new();
        a.insert("x".into(), 1);
        let mut b = a.clone();
        assert!(a.ptr_eq(&b));

        b.insert("y".into(), 2);
        assert!(!a.ptr_eq(&b));
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 2);
        // The untouched entity is still shared between snapshots.
        assert!(Arc::ptr_eq(
            a.get_arc(&"x".to_string()).unwrap(),
            b.get_arc(&"x".to_string()).unwrap()
        ));
    }

    #[test]
    fn map_changed_without_changes_keeps_map() {
        let a: Store<String, u32> = [("x".to_string(), 1), ("y".to_string(), 2)]
            .into_iter()
            .collect();
        let b = a.map_changed(|_, _| None);
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn map_changed_replaces_only_selected() {
        let a: Store<String, u32> = [("x".to_string(), 1), ("y".to_string(), 2)]
            .into_iter()
            .collect();
        let b = a.map_changed(|_, v| (*v == 2).then_some(20));
        assert_eq!(b.get(&"y".to_string()), Some(&20));
        assert_eq!(a.get(&"y".to_string()), Some(&2));
        assert!(Arc::ptr_eq(
            a.get_arc(&"x".to_string()).unwrap(),
            b.get_arc(&"x".to_string()).unwrap()
        ));
    }

    #[test]
    fn remove_missing_does_not_copy() {
        let a: Store<String, u32> = [("x".to_string(), 1)].into_iter().collect();
        let mut b = a.clone();
        assert!(b.remove(&"missing".to_string()).is_none());
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn serializes_as_plain_map() {
        let a: Store<String, u32> = [("x".to_string(), 1)].into_iter().collect();
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, r#"{"x":1}"#);
        let back: Store<String, u32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
    }
}
