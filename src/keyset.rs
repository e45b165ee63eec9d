use rustc_hash::{FxBuildHasher, FxHashSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Set of node keys with fast lookup, materialized as a list at the boundary.
///
/// Iteration follows insertion order so emitted key lists are deterministic; nothing
/// in the engine relies on that order.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "Vec<String>", into = "Vec<String>"))]
#[derive(Clone, Debug, Default)]
pub struct KeySet {
    order: Vec<String>,
    lookup: FxHashSet<String>,
}

impl KeySet {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.lookup.contains(key)
    }

    /// Adds `key`; returns `false` if it was already present.
    pub fn insert(&mut self, key: &str) -> bool {
        if self.lookup.contains(key) {
            return false;
        }
        self.lookup.insert(key.to_owned());
        self.order.push(key.to_owned());
        true
    }

    /// Removes `key`; returns `false` if it was absent.
    pub fn remove(&mut self, key: &str) -> bool {
        if !self.lookup.remove(key) {
            return false;
        }
        self.order.retain(|existing| existing != key);
        true
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.lookup.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.order
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.order.clone()
    }
}

impl From<Vec<String>> for KeySet {
    fn from(keys: Vec<String>) -> Self {
        let mut lookup = FxHashSet::with_capacity_and_hasher(keys.len(), FxBuildHasher);
        let order = keys
            .into_iter()
            .filter(|key| lookup.insert(key.clone()))
            .collect();
        Self { order, lookup }
    }
}

impl From<KeySet> for Vec<String> {
    fn from(keys: KeySet) -> Self {
        keys.order
    }
}

impl<'a> FromIterator<&'a str> for KeySet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut keys = Self::new();
        for key in iter {
            keys.insert(key);
        }
        keys
    }
}

impl PartialEq for KeySet {
    fn eq(&self, other: &Self) -> bool {
        self.lookup == other.lookup
    }
}

impl Eq for KeySet {}

/// Deduplicates while keeping first occurrences.
pub(crate) fn dedup_keys(keys: impl IntoIterator<Item = String>) -> Vec<String> {
    KeySet::from(keys.into_iter().collect::<Vec<_>>()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_remove_are_idempotent() {
        let mut keys = KeySet::new();
        assert!(keys.insert("a"));
        assert!(!keys.insert("a"));
        assert!(keys.insert("b"));
        assert!(keys.remove("a"));
        assert!(!keys.remove("zzz"));
        assert_eq!(keys.as_slice(), &["b".to_string()]);
        assert!(keys.contains("b"));
        assert!(!keys.contains("a"));
    }

    #[test]
    fn equality_ignores_order() {
        let left: KeySet = ["a", "b"].into_iter().collect();
        let right: KeySet = ["b", "a"].into_iter().collect();
        assert_eq!(left, right);
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let keys = vec!["x".to_string(), "y".to_string(), "x".to_string()];
        assert_eq!(dedup_keys(keys), vec!["x".to_string(), "y".to_string()]);
    }
}
