//! Bounded cache of rewrite results

use crate::domain::tone::Tone;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};

/// Hash of the inputs that determine a rewrite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey(u64);

impl CacheKey {
    pub fn new(text: &str, tone: Tone, ultra_fast: bool) -> Self {
        Self::with_context(text, None, tone, ultra_fast)
    }

    /// Key for a rewrite whose prompt also carried neighbour context
    pub fn with_context(text: &str, context: Option<&str>, tone: Tone, ultra_fast: bool) -> Self {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        context.hash(&mut hasher);
        tone.hash(&mut hasher);
        ultra_fast.hash(&mut hasher);
        Self(hasher.finish())
    }
}

/// Insertion-ordered cache evicting its oldest entry when full
#[derive(Debug)]
pub struct ResultCache {
    capacity: usize,
    entries: HashMap<CacheKey, String>,
    order: VecDeque<CacheKey>,
}

impl ResultCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: CacheKey, value: String) {
        if self.entries.insert(key, value).is_some() {
            return;
        }

        self.order.push_back(key);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
