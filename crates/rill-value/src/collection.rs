//! Ordered, string-keyed collections — the language's only container type.
//!
//! A `Collection` is used as both "struct" (`{ name: "ada", age: 7 }`) and
//! "array" (`{ 0: "a", 1: "b" }`, keys chosen for you) depending on how it is
//! built. Key order is preserved so that JSON round-tripping and `for`-style
//! iteration see fields in the order they were written.

use indexmap::IndexMap;

use crate::value::Value;

/// An ordered mapping from string key to owned [`Value`].
///
/// Collections own their elements outright: there is no sharing and no
/// cycles, so a `Collection` can be dropped, cloned, or walked without any
/// reference-counting bookkeeping.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Collection {
    entries: IndexMap<String, Value>,
}

impl Collection {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert a value, returning the previous one under that key if present.
    ///
    /// Insertion order is preserved for *new* keys; overwriting an existing
    /// key keeps that key's original position (matches every ordered-map
    /// literal the JSON codec needs to round-trip).
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(key.into(), value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The largest index `i` for which key `"i"` is present and every key
    /// `"0"..="i"` is also present, or `None` if there is no `"0"` entry.
    ///
    /// This is the "current size" referred to by the collection-extension
    /// rule: a collection used positionally has a contiguous numeric-key
    /// prefix, and extension only ever grows that prefix.
    pub fn contiguous_len(&self) -> usize {
        let mut n = 0usize;
        while self.entries.contains_key(&n.to_string()) {
            n += 1;
        }
        n
    }

    /// Ensure keys `"0"..target_index` exist, inserting `Value::default_unit()`
    /// for any that are missing, and return how many were added.
    ///
    /// Per the language's element-access rule: indexing a collection past
    /// its current contiguous length fills the gap with default entries
    /// rather than erroring.
    pub fn extend_to(&mut self, target_index: usize) -> usize {
        let old_max = self.contiguous_len();
        let mut added = 0;
        for i in old_max..=target_index {
            let key = i.to_string();
            if !self.entries.contains_key(&key) {
                self.entries.insert(key, Value::default_unit());
                added += 1;
            }
        }
        added
    }

    /// Insert a default entry under `key` if absent; returns `true` if it
    /// was inserted.
    pub fn ensure_string_key(&mut self, key: &str) -> bool {
        if self.entries.contains_key(key) {
            false
        } else {
            self.entries.insert(key.to_string(), Value::default_unit());
            true
        }
    }

    pub fn from_positional(values: impl IntoIterator<Item = Value>) -> Self {
        let mut c = Self::new();
        for (i, v) in values.into_iter().enumerate() {
            c.insert(i.to_string(), v);
        }
        c
    }
}

impl FromIterator<(String, Value)> for Collection {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extend_to_fills_contiguous_gap() {
        let mut c = Collection::new();
        c.insert("0", Value::Integer(10));
        let added = c.extend_to(3);
        assert_eq!(added, 3);
        assert_eq!(c.len(), 4);
        assert_eq!(c.get("1"), Some(&Value::default_unit()));
        assert_eq!(c.get("3"), Some(&Value::default_unit()));
    }

    #[test]
    fn extend_to_is_a_noop_when_already_long_enough() {
        let mut c = Collection::new();
        c.insert("0", Value::Integer(1));
        c.insert("1", Value::Integer(2));
        assert_eq!(c.extend_to(1), 0);
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn ensure_string_key_only_inserts_once() {
        let mut c = Collection::new();
        assert!(c.ensure_string_key("name"));
        assert!(!c.ensure_string_key("name"));
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn preserves_insertion_order() {
        let mut c = Collection::new();
        c.insert("z", Value::Integer(1));
        c.insert("a", Value::Integer(2));
        let keys: Vec<_> = c.keys().collect();
        assert_eq!(keys, vec!["z", "a"]);
    }
}
