//! Key Index Module
//!
//! Maps already-hashed 64-bit keys to bucket slots.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::error::{CacheError, Result};

// == Key Index ==
/// Unordered key → slot map. Iteration order is unspecified.
#[derive(Debug, Default)]
pub struct KeyIndex {
    slots: HashMap<u64, usize>,
}

impl KeyIndex {
    // == Constructor ==
    /// Creates an index sized for `capacity` keys so it never rehashes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: HashMap::with_capacity(capacity),
        }
    }

    // == Insert ==
    /// Maps `key` to `slot`. Fails with `DuplicateKey` if the key is present.
    pub fn insert(&mut self, key: u64, slot: usize) -> Result<()> {
        match self.slots.entry(key) {
            Entry::Occupied(_) => Err(CacheError::DuplicateKey(key)),
            Entry::Vacant(vacant) => {
                vacant.insert(slot);
                Ok(())
            }
        }
    }

    // == Lookup ==
    pub fn lookup(&self, key: u64) -> Option<usize> {
        self.slots.get(&key).copied()
    }

    // == Remove ==
    /// Removes `key`, returning the slot it mapped to.
    pub fn remove(&mut self, key: u64) -> Option<usize> {
        self.slots.remove(&key)
    }

    /// Drops every mapping, keeping the allocation.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterates `(key, slot)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, usize)> + '_ {
        self.slots.iter().map(|(&key, &slot)| (key, slot))
    }
}
