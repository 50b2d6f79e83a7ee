//! Fixed-capacity slot store with most-recently-used overwrite
//!
//! Slots are appended until the store is full. From then on every write
//! lands on the slot under the eviction cursor, and the cursor follows the
//! slot most recently written or matched by a lookup. Reading a key
//! therefore arms that key's own slot as the next victim; this is not LRU.

use tracing::trace;

use crate::error::{Error, Result};
use crate::key::CacheKey;

/// One occupied position in the store
#[derive(Debug, Clone)]
pub struct Slot<K, V> {
    /// Stored key
    pub key: K,
    /// Stored value
    pub value: V,
}

/// Bounded slot array with a single eviction cursor
#[derive(Debug)]
pub struct SlotStore<K, V> {
    slots: Vec<Slot<K, V>>,
    capacity: usize,
    /// Unset until the store first fills up
    cursor: Option<usize>,
}

impl<K, V> SlotStore<K, V>
where
    K: CacheKey,
{
    /// Create an empty store holding at most `capacity` entries
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity(capacity));
        }

        Ok(Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            cursor: None,
        })
    }

    /// Write an entry and return the slot index it landed in.
    ///
    /// Appends while the store has room, otherwise overwrites the slot under
    /// the eviction cursor.
    pub fn insert(&mut self, key: K, value: V) -> usize {
        if let Some(index) = self.cursor {
            trace!(slot = index, "overwriting slot");
            self.slots[index] = Slot { key, value };
            return index;
        }

        self.slots.push(Slot { key, value });
        let index = self.slots.len() - 1;
        if self.slots.len() == self.capacity {
            self.cursor = Some(index);
        }
        index
    }

    /// Scan the slots in order for `key`.
    ///
    /// On a match the cursor (if armed) moves to the matched slot.
    pub fn lookup(&mut self, key: &K) -> Option<(usize, &V)> {
        let index = self.position(key)?;
        self.mark_used(index);
        Some((index, &self.slots[index].value))
    }

    /// Index of the first slot whose key deep-equals `key`
    pub fn position(&self, key: &K) -> Option<usize> {
        self.slots.iter().position(|slot| slot.key.deep_eq(key))
    }

    /// Move the eviction cursor to `index` once the store is full.
    ///
    /// No-op while the store is still filling up or if `index` is out of
    /// range.
    pub fn mark_used(&mut self, index: usize) {
        if self.cursor.is_some() && index < self.slots.len() {
            self.cursor = Some(index);
        }
    }
}

impl<K, V> SlotStore<K, V> {
    /// Slot at `index`, if occupied
    pub fn slot(&self, index: usize) -> Option<&Slot<K, V>> {
        self.slots.get(index)
    }

    /// Key that the next insert will overwrite, once the store is full
    pub fn victim(&self) -> Option<&K> {
        self.cursor.map(|index| &self.slots[index].key)
    }

    /// Current eviction cursor
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// True once the store has reached capacity
    pub fn is_full(&self) -> bool {
        self.cursor.is_some()
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if no slot is occupied
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Maximum number of slots
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate over occupied slots in index order
    pub fn iter(&self) -> impl Iterator<Item = &Slot<K, V>> {
        self.slots.iter()
    }
}
