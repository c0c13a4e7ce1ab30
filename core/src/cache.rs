//! Per-collection object cache.
//!
//! Last-write-wins map from record id to the latest snapshot seen. It is a
//! hint, never a source of truth: a miss means "fetch", not "absent".

use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct ObjectCache<T> {
    entries: HashMap<String, T>,
}

impl<T> Default for ObjectCache<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> ObjectCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.entries.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.entries.get_mut(id)
    }

    /// Insert or overwrite; returns the replaced snapshot.
    pub fn insert(&mut self, id: &str, value: T) -> Option<T> {
        self.entries.insert(id.to_string(), value)
    }

    pub fn remove(&mut self, id: &str) -> Option<T> {
        self.entries.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// First entry satisfying `predicate(value, id)`. Linear scan, no order
    /// guarantee between entries.
    pub fn find<F>(&self, mut predicate: F) -> Option<&T>
    where
        F: FnMut(&T, &str) -> bool,
    {
        self.entries
            .iter()
            .find(|(id, value)| predicate(value, id.as_str()))
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(id, value)| (id.as_str(), value))
    }
}
