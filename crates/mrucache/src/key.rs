//! Key capabilities: deep equality and optional content digests
//!
//! Every cache key must be comparable with [`CacheKey::deep_eq`]. Keys that
//! can be deterministically serialized also provide a [`Digest`], which lets
//! the accelerated index skip the linear slot scan. A digest is only ever a
//! presumption of equality; the slot's key is always re-checked.

use serde::Serialize;
use sha2::{Digest as _, Sha256};
use tracing::trace;

/// Fixed-length content fingerprint of a key (SHA-256)
pub type Digest = [u8; 32];

/// Capabilities required from a cache key
pub trait CacheKey {
    /// Structural equality; identity for values without structure
    fn deep_eq(&self, other: &Self) -> bool;

    /// Deterministic content digest, or `None` when the key cannot be
    /// serialized. Keys without a digest always take the linear scan.
    fn try_digest(&self) -> Option<Digest> {
        None
    }
}

/// Serialize `value` and hash the bytes.
///
/// Returns `None` if serialization fails, e.g. for callables.
pub fn content_digest<T: Serialize + ?Sized>(value: &T) -> Option<Digest> {
    match serde_json::to_vec(value) {
        Ok(bytes) => {
            let mut hasher = Sha256::new();
            hasher.update(&bytes);
            Some(hasher.finalize().into())
        }
        Err(err) => {
            trace!(error = %err, "key has no content digest");
            None
        }
    }
}

/// Hash a sequence of child digests under a tag.
///
/// Any missing child digest makes the whole digest unavailable.
fn combine_digests<I>(tag: &[u8], children: I) -> Option<Digest>
where
    I: IntoIterator<Item = Option<Digest>>,
{
    let mut hasher = Sha256::new();
    hasher.update(tag);
    let mut count: u64 = 0;
    for child in children {
        hasher.update(child?);
        count += 1;
    }
    hasher.update(count.to_le_bytes());
    Some(hasher.finalize().into())
}

macro_rules! impl_cache_key_by_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl CacheKey for $ty {
                fn deep_eq(&self, other: &Self) -> bool {
                    self == other
                }

                fn try_digest(&self) -> Option<Digest> {
                    content_digest(self)
                }
            }
        )*
    };
}

impl_cache_key_by_value!(
    i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, bool, char, String, &str,
);

impl<T: CacheKey> CacheKey for Vec<T> {
    fn deep_eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.deep_eq(b))
    }

    fn try_digest(&self) -> Option<Digest> {
        combine_digests(b"vec", self.iter().map(|item| item.try_digest()))
    }
}

impl<T: CacheKey> CacheKey for Option<T> {
    fn deep_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.deep_eq(b),
            (None, None) => true,
            _ => false,
        }
    }

    fn try_digest(&self) -> Option<Digest> {
        match self {
            Some(inner) => combine_digests(b"some", [inner.try_digest()]),
            None => combine_digests(b"none", []),
        }
    }
}
