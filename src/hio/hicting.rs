use indexmap::IndexMap;
use std::collections::VecDeque;

/// Mict - multiple valued dictionary that maintains insertion order of
/// both keys and the values at each key. Used for URL lookups where a
/// scheme may map to several locations.
#[derive(Debug, Clone)]
pub struct Mict<K, V>
where
    K: std::hash::Hash + Eq + Clone,
    V: Clone,
{
    data: IndexMap<K, VecDeque<V>>,
}

impl<K, V> Mict<K, V>
where
    K: std::hash::Hash + Eq + Clone,
    V: Clone,
{
    /// Creates a new empty Mict
    pub fn new() -> Self {
        Self {
            data: IndexMap::new(),
        }
    }

    /// Adds a value at key, appending to any existing values
    pub fn add(&mut self, key: K, value: V) {
        self.data
            .entry(key)
            .or_insert_with(VecDeque::new)
            .push_back(value);
    }

    /// Gets the first value at key
    pub fn get(&self, key: &K) -> Option<&V> {
        self.data.get(key).and_then(|deque| deque.front())
    }

    /// Gets the last value at key
    pub fn get_last(&self, key: &K) -> Option<&V> {
        self.data.get(key).and_then(|deque| deque.back())
    }

    /// Returns (key, first value) pairs in key insertion order
    pub fn firsts(&self) -> Vec<(K, V)> {
        self.data
            .iter()
            .filter_map(|(k, deque)| deque.front().map(|v| (k.clone(), v.clone())))
            .collect()
    }

    /// Returns the number of distinct keys
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true when no keys are present
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<K, V> Default for Mict<K, V>
where
    K: std::hash::Hash + Eq + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
