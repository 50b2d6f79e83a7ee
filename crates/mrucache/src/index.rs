//! Digest-to-slot index for skipping the linear scan
//!
//! Entries are hints. A digest may point at a slot that has since been
//! overwritten, and two different keys may share a digest, so every hit is
//! verified against the key actually stored in the slot.

use std::collections::HashMap;

use ahash::RandomState;
use tracing::trace;

use crate::key::{CacheKey, Digest};
use crate::store::SlotStore;

/// Outcome of a digest lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// Verified match at this slot index
    Found(usize),
    /// No usable answer; fall back to the linear scan
    Inconclusive,
}

/// Best-effort mapping from key digest to slot index
#[derive(Debug)]
pub struct AcceleratedIndex {
    digest_to_slot: HashMap<Digest, usize, RandomState>,
}

impl AcceleratedIndex {
    /// Create an index sized for `capacity` slots
    pub fn new(capacity: usize) -> Self {
        Self {
            digest_to_slot: HashMap::with_capacity_and_hasher(capacity, RandomState::new()),
        }
    }

    /// Point the digest of `key` at `slot`. Keys without a digest are skipped.
    pub fn record<K: CacheKey>(&mut self, key: &K, slot: usize) {
        if let Some(digest) = key.try_digest() {
            self.digest_to_slot.insert(digest, slot);
        }
    }

    /// Drop the entry for `key`, if it has a digest and is indexed
    pub fn forget<K: CacheKey>(&mut self, key: &K) {
        if let Some(digest) = key.try_digest() {
            self.digest_to_slot.remove(&digest);
        }
    }

    /// Look `key` up by digest and verify it against the store.
    ///
    /// Never reports a miss: an unindexed or mismatched key may still be
    /// present in the store.
    pub fn probe<K: CacheKey, V>(&self, store: &SlotStore<K, V>, key: &K) -> Probe {
        let Some(digest) = key.try_digest() else {
            return Probe::Inconclusive;
        };
        let Some(&index) = self.digest_to_slot.get(&digest) else {
            return Probe::Inconclusive;
        };

        match store.slot(index) {
            Some(slot) if slot.key.deep_eq(key) => Probe::Found(index),
            _ => {
                trace!(slot = index, "stale or colliding index entry");
                Probe::Inconclusive
            }
        }
    }

    /// Number of indexed digests
    pub fn len(&self) -> usize {
        self.digest_to_slot.len()
    }

    /// Check if no digest is indexed
    pub fn is_empty(&self) -> bool {
        self.digest_to_slot.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arg::Arg;

    #[test]
    fn test_probe_found() {
        let mut store = SlotStore::new(4).unwrap();
        let mut index = AcceleratedIndex::new(4);

        let slot = store.insert(7i64, "seven");
        index.record(&7i64, slot);

        assert_eq!(index.probe(&store, &7i64), Probe::Found(0));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_probe_unindexed_is_inconclusive() {
        let mut store = SlotStore::new(4).unwrap();
        let index = AcceleratedIndex::new(4);

        store.insert(7i64, "seven");

        assert_eq!(index.probe(&store, &7i64), Probe::Inconclusive);
        assert_eq!(index.probe(&store, &8i64), Probe::Inconclusive);
    }

    #[test]
    fn test_stale_entry_is_inconclusive_and_kept() {
        let mut store = SlotStore::new(1).unwrap();
        let mut index = AcceleratedIndex::new(1);

        let slot = store.insert(1i64, "one");
        index.record(&1i64, slot);

        // Overwrite without maintaining the index
        store.insert(2i64, "two");

        assert_eq!(index.probe(&store, &1i64), Probe::Inconclusive);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_undigestable_key_is_skipped() {
        let mut store = SlotStore::new(2).unwrap();
        let mut index = AcceleratedIndex::new(2);
        let f = Arg::callable(());

        let slot = store.insert(f.clone(), 1);
        index.record(&f, slot);
        assert!(index.is_empty());
        assert_eq!(index.probe(&store, &f), Probe::Inconclusive);

        index.forget(&f);
        assert!(index.is_empty());
    }

    #[test]
    fn test_digest_collision_is_verified() {
        let mut store = SlotStore::new(2).unwrap();
        let mut index = AcceleratedIndex::new(2);
        let first = Arg::object(());
        let second = Arg::object(());

        let slot = store.insert(first.clone(), 1);
        index.record(&first, slot);

        assert_eq!(index.probe(&store, &first), Probe::Found(0));
        assert_eq!(index.probe(&store, &second), Probe::Inconclusive);
    }

    #[test]
    fn test_forget() {
        let mut store = SlotStore::new(2).unwrap();
        let mut index = AcceleratedIndex::new(2);

        let slot = store.insert(String::from("k"), 1);
        index.record(&String::from("k"), slot);
        index.forget(&String::from("k"));
        index.forget(&String::from("absent"));

        assert!(index.is_empty());
        assert_eq!(index.probe(&store, &String::from("k")), Probe::Inconclusive);
    }
}
