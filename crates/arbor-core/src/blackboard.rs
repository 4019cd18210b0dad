//! Default map-backed blackboard for sharing state between tasks of one agent.

use std::collections::HashMap;

use crate::field::Field;

/// Keyed [`Field`] store. One per agent; behavior trees run serially, so no
/// locking is involved.
#[derive(Debug, Default, Clone)]
pub struct Blackboard {
    data: HashMap<String, Field>,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Field> {
        self.data.get(key).cloned()
    }

    pub fn set(&mut self, key: &str, value: Field) {
        self.data.insert(key.to_owned(), value);
    }

    pub fn del(&mut self, key: &str) {
        self.data.remove(key);
    }

    pub fn has(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    pub fn get_i32(&self, key: &str) -> Option<i32> {
        self.data.get(key)?.as_i32()
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.data.get(key)?.as_i64()
    }

    pub fn get_f32(&self, key: &str) -> Option<f32> {
        self.data.get(key)?.as_f32()
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.data.get(key)?.as_f64()
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.data.get(key)?.as_bool()
    }
}
