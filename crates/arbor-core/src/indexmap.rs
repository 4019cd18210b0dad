use std::collections::HashMap;
use std::hash::Hash;

/// Dense key/value sequence with an O(1) key -> slot hash index.
///
/// Same storage discipline as [`crate::ArrayMap`] but pays a hash map for
/// lookup, which wins once the entry count leaves linear-scan territory.
#[derive(Debug, Clone)]
pub struct IndexMap<K, V> {
    keys: Vec<K>,
    vals: Vec<V>,
    index: HashMap<K, usize>,
}

impl<K: Eq + Hash + Clone, V> Default for IndexMap<K, V> {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            vals: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone, V> IndexMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            keys: Vec::with_capacity(n),
            vals: Vec::with_capacity(n),
            index: HashMap::with_capacity(n),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn get(&self, key: &K) -> Option<(usize, &V)> {
        let i = *self.index.get(key)?;
        Some((i, &self.vals[i]))
    }

    pub fn get_mut(&mut self, key: &K) -> Option<(usize, &mut V)> {
        let i = *self.index.get(key)?;
        Some((i, &mut self.vals[i]))
    }

    /// Inserts or updates.
    pub fn put(&mut self, key: K, val: V) {
        if let Some(&i) = self.index.get(&key) {
            self.vals[i] = val;
            return;
        }
        self.index.insert(key.clone(), self.keys.len());
        self.keys.push(key);
        self.vals.push(val);
    }

    /// Removes slot `i` by swapping with the last entry; the moved entry's
    /// index is fixed up.
    pub fn remove(&mut self, i: usize) -> (K, V) {
        let key = self.keys.swap_remove(i);
        let val = self.vals.swap_remove(i);
        self.index.remove(&key);
        if i < self.keys.len() {
            self.index.insert(self.keys[i].clone(), i);
        }
        (key, val)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.keys.iter().zip(self.vals.iter())
    }
}
