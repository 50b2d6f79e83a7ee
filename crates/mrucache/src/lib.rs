//! # mrucache
//!
//! Bounded memoization cache with most-recently-used slot overwrite.
//!
//! ## Architecture
//! - **SlotStore**: fixed-capacity slot array, appended until full, then
//!   overwritten at a single eviction cursor
//! - **AcceleratedIndex**: AHash map from SHA-256 key digest to slot index,
//!   verified against the slot before use
//! - **MruCache**: composes the two and counts hits, misses and fast hits
//! - **Memoized**: wraps a function with one cache behind a lock
//!
//! ## Eviction
//! The cursor always points at the slot most recently written or read. That
//! slot is overwritten by the next insert once the cache is full, so reading
//! a key marks it as the next victim.
//!
//! ```
//! use mrucache::MruCache;
//!
//! let mut cache = MruCache::new(2, true).unwrap();
//! cache.put(1, "one");
//! cache.put(2, "two");
//! assert_eq!(cache.get(&1), Some(&"one"));
//!
//! // Key 1 was read last, so its slot is replaced
//! cache.put(3, "three");
//! assert_eq!(cache.get(&1), None);
//! assert_eq!(cache.get(&2), Some(&"two"));
//! ```

#![warn(missing_docs)]

mod arg;
mod cache;
mod error;
mod index;
mod key;
mod memo;
mod stats;
mod store;

pub use arg::{Arg, CallKey, Handle};
pub use cache::MruCache;
pub use error::{Error, Result};
pub use index::{AcceleratedIndex, Probe};
pub use key::{content_digest, CacheKey, Digest};
pub use memo::{Memoized, DEFAULT_CAPACITY};
pub use stats::{CacheStats, StatsSnapshot};
pub use store::{Slot, SlotStore};
