//! Memoization wrapper owning one cache per function

use parking_lot::Mutex;
use tracing::debug;

use crate::cache::MruCache;
use crate::key::CacheKey;
use crate::stats::StatsSnapshot;

/// Capacity used by [`Memoized::with_defaults`]
pub const DEFAULT_CAPACITY: i64 = 10;

/// A function whose results are cached by argument key
///
/// A non-positive capacity disables caching entirely: every call runs the
/// function and no cache state exists.
pub struct Memoized<K, V, F> {
    func: F,
    cache: Option<Mutex<MruCache<K, V>>>,
}

impl<K, V, F> Memoized<K, V, F>
where
    K: CacheKey,
    V: Clone,
    F: Fn(&K) -> V,
{
    /// Wrap `func` with a cache of `capacity` slots
    pub fn new(func: F, capacity: i64, accelerated: bool) -> Self {
        let cache = match usize::try_from(capacity).ok().filter(|&c| c > 0) {
            Some(capacity) => MruCache::new(capacity, accelerated).ok().map(Mutex::new),
            None => {
                debug!(capacity, "caching disabled");
                None
            }
        };

        Self { func, cache }
    }

    /// Wrap `func` with the default capacity and no acceleration
    pub fn with_defaults(func: F) -> Self {
        Self::new(func, DEFAULT_CAPACITY, false)
    }

    /// Call the function, reusing a cached result when there is one.
    ///
    /// The lock is not held while `func` runs.
    pub fn call(&self, key: K) -> V {
        let Some(cache) = &self.cache else {
            return (self.func)(&key);
        };

        let cached = cache.lock().get(&key).cloned();
        if let Some(value) = cached {
            return value;
        }

        let value = (self.func)(&key);
        cache.lock().put(key, value.clone());
        value
    }
}

impl<K, V, F> Memoized<K, V, F> {
    /// Whether results are being cached
    pub fn is_cached(&self) -> bool {
        self.cache.is_some()
    }

    /// Counters of the cache, or `None` when caching is disabled
    pub fn stats(&self) -> Option<StatsSnapshot> {
        self.cache
            .as_ref()
            .map(|cache| cache.lock().stats().snapshot())
    }

    /// Run `f` against the cache while holding its lock
    pub fn with_cache<R>(&self, f: impl FnOnce(&MruCache<K, V>) -> R) -> Option<R> {
        self.cache.as_ref().map(|cache| f(&cache.lock()))
    }
}
