//! MruCache: slot store plus optional digest index

use tracing::{debug, trace};

use crate::error::Result;
use crate::index::{AcceleratedIndex, Probe};
use crate::key::CacheKey;
use crate::stats::CacheStats;
use crate::store::SlotStore;

/// Bounded cache that overwrites the most recently used slot
///
/// Not synchronized; wrap it in a lock to share it between threads.
pub struct MruCache<K, V> {
    /// Authoritative entries
    store: SlotStore<K, V>,

    /// Digest shortcut, present when acceleration is enabled
    index: Option<AcceleratedIndex>,

    /// Cache statistics
    stats: CacheStats,
}

impl<K, V> MruCache<K, V>
where
    K: CacheKey,
{
    /// Create a new MruCache
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of entries, at least 1
    /// * `accelerated` - Maintain a digest index to skip linear scans
    ///
    /// # Returns
    /// * `Result<MruCache>` - `Error::InvalidCapacity` if `capacity` is 0
    pub fn new(capacity: usize, accelerated: bool) -> Result<Self> {
        let store = SlotStore::new(capacity)?;
        debug!(capacity, accelerated, "created cache");

        Ok(Self {
            store,
            index: accelerated.then(|| AcceleratedIndex::new(capacity)),
            stats: CacheStats::new(),
        })
    }

    /// Get a value from the cache
    ///
    /// Tries the digest index first when enabled, then scans the slots. A
    /// hit arms the matched slot as the next one to be overwritten.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        if let Some(index) = &self.index {
            if let Probe::Found(slot) = index.probe(&self.store, key) {
                self.store.mark_used(slot);
                self.stats.record_fast_hit();
                return self.store.slot(slot).map(|slot| &slot.value);
            }
        }

        match self.store.lookup(key) {
            Some((_, value)) => {
                self.stats.record_hit();
                Some(value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Put a value into the cache
    ///
    /// Once the cache is full this overwrites the slot under the eviction
    /// cursor. Putting a key that is already cached stores a second copy.
    pub fn put(&mut self, key: K, value: V) {
        if let Some(victim) = self.store.victim() {
            if let Some(index) = &mut self.index {
                index.forget(victim);
            }
            self.stats.record_eviction();
        }

        let slot = self.store.insert(key, value);
        self.stats.record_insert();
        trace!(slot, "stored entry");

        if let (Some(index), Some(stored)) = (&mut self.index, self.store.slot(slot)) {
            index.record(&stored.key, slot);
        }
    }
}

impl<K, V> MruCache<K, V> {
    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Total hits, including fast hits
    pub fn hits(&self) -> u64 {
        self.stats.hits()
    }

    /// Total misses
    pub fn misses(&self) -> u64 {
        self.stats.misses()
    }

    /// Hits served by the digest index; always 0 without acceleration
    pub fn fast_hits(&self) -> u64 {
        self.stats.fast_hits()
    }

    /// Get the number of cached entries
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Get cache capacity
    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    /// Whether the digest index is enabled
    pub fn is_accelerated(&self) -> bool {
        self.index.is_some()
    }

    /// Slot index the next insert overwrites, once the cache is full
    pub fn eviction_cursor(&self) -> Option<usize> {
        self.store.cursor()
    }

    /// Read-only view of the underlying slots
    pub fn store(&self) -> &SlotStore<K, V> {
        &self.store
    }

    /// Number of digests in the index; 0 without acceleration
    pub fn indexed(&self) -> usize {
        self.index.as_ref().map_or(0, AcceleratedIndex::len)
    }
}
