//! Dynamic call arguments used as memoization keys
//!
//! [`Arg`] models the values a memoized function can be called with:
//! scalars, nested containers, and reference values (objects, callables)
//! that only compare by identity. [`CallKey`] bundles positional and
//! keyword arguments of a single call.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::ser::Error as _;
use serde::{Serialize, Serializer};

use crate::key::{content_digest, CacheKey, Digest};

/// Shared reference value compared by identity
#[derive(Clone)]
pub struct Handle(Arc<dyn Any + Send + Sync>);

impl Handle {
    /// Wrap a value in a fresh handle
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// True if both handles point to the same allocation
    pub fn same(&self, other: &Handle) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.0) as *const (),
            Arc::as_ptr(&other.0) as *const (),
        )
    }

    /// Borrow the wrapped value if it has type `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({:p})", Arc::as_ptr(&self.0) as *const ())
    }
}

/// A single argument value
///
/// Values of different variants never compare equal, so `Int(1)`,
/// `Float(1.0)` and `Bool(true)` are three distinct keys, unlike Python
/// where `1 == 1.0 == True`.
#[derive(Debug, Clone, Serialize)]
pub enum Arg {
    /// Absence of a value
    None,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Floating point number. Equal when `==` holds or the bit patterns
    /// match, so a NaN equals an identical NaN and `0.0` equals `-0.0`.
    Float(f64),
    /// UTF-8 string
    Str(String),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Mutable-style sequence
    List(Vec<Arg>),
    /// Fixed sequence; never equal to a `List` with the same items
    Tuple(Vec<Arg>),
    /// Key/value pairs in insertion order.
    ///
    /// Equality ignores order, the digest does not, so two equal maps built
    /// in different orders only meet through the linear scan.
    Map(Vec<(Arg, Arg)>),
    /// Opaque object. Every object serializes to the same marker, so
    /// distinct objects share a digest while never comparing equal.
    Object(#[serde(serialize_with = "serialize_object")] Handle),
    /// Function value. Never serializable, so it never has a digest.
    Callable(#[serde(serialize_with = "serialize_callable")] Handle),
}

fn serialize_object<S: Serializer>(_: &Handle, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_unit_struct("object")
}

fn serialize_callable<S: Serializer>(_: &Handle, _: S) -> Result<S::Ok, S::Error> {
    Err(S::Error::custom("callable values cannot be serialized"))
}

impl Arg {
    /// Build a list argument
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Arg>,
    {
        Arg::List(items.into_iter().map(Into::into).collect())
    }

    /// Build a tuple argument
    pub fn tuple<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Arg>,
    {
        Arg::Tuple(items.into_iter().map(Into::into).collect())
    }

    /// Build a map argument. A repeated key replaces the earlier value
    /// but keeps its original position.
    pub fn map<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Arg>,
        V: Into<Arg>,
    {
        let mut entries: Vec<(Arg, Arg)> = Vec::new();
        for (key, value) in pairs {
            let (key, value) = (key.into(), value.into());
            match entries.iter_mut().find(|(existing, _)| existing.deep_eq(&key)) {
                Some(entry) => entry.1 = value,
                None => entries.push((key, value)),
            }
        }
        Arg::Map(entries)
    }

    /// Wrap a value as an opaque object with a fresh identity
    pub fn object<T: Any + Send + Sync>(value: T) -> Self {
        Arg::Object(Handle::new(value))
    }

    /// Wrap a value as a callable with a fresh identity
    pub fn callable<T: Any + Send + Sync>(value: T) -> Self {
        Arg::Callable(Handle::new(value))
    }
}

fn seq_eq(a: &[Arg], b: &[Arg]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.deep_eq(y))
}

fn pairs_within(a: &[(Arg, Arg)], b: &[(Arg, Arg)]) -> bool {
    a.iter().all(|(key, value)| {
        b.iter()
            .any(|(other_key, other_value)| key.deep_eq(other_key) && value.deep_eq(other_value))
    })
}

/// Raw `Map` values may repeat keys, so containment is checked both ways.
fn map_eq(a: &[(Arg, Arg)], b: &[(Arg, Arg)]) -> bool {
    a.len() == b.len() && pairs_within(a, b) && pairs_within(b, a)
}

impl CacheKey for Arg {
    fn deep_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Arg::None, Arg::None) => true,
            (Arg::Bool(a), Arg::Bool(b)) => a == b,
            (Arg::Int(a), Arg::Int(b)) => a == b,
            (Arg::Float(a), Arg::Float(b)) => a == b || a.to_bits() == b.to_bits(),
            (Arg::Str(a), Arg::Str(b)) => a == b,
            (Arg::Bytes(a), Arg::Bytes(b)) => a == b,
            (Arg::List(a), Arg::List(b)) | (Arg::Tuple(a), Arg::Tuple(b)) => seq_eq(a, b),
            (Arg::Map(a), Arg::Map(b)) => map_eq(a, b),
            (Arg::Object(a), Arg::Object(b)) | (Arg::Callable(a), Arg::Callable(b)) => a.same(b),
            _ => false,
        }
    }

    fn try_digest(&self) -> Option<Digest> {
        content_digest(self)
    }
}

impl PartialEq for Arg {
    fn eq(&self, other: &Self) -> bool {
        self.deep_eq(other)
    }
}

impl From<()> for Arg {
    fn from(_: ()) -> Self {
        Arg::None
    }
}

impl From<bool> for Arg {
    fn from(value: bool) -> Self {
        Arg::Bool(value)
    }
}

impl From<i32> for Arg {
    fn from(value: i32) -> Self {
        Arg::Int(value.into())
    }
}

impl From<i64> for Arg {
    fn from(value: i64) -> Self {
        Arg::Int(value)
    }
}

impl From<u32> for Arg {
    fn from(value: u32) -> Self {
        Arg::Int(value.into())
    }
}

impl From<f64> for Arg {
    fn from(value: f64) -> Self {
        Arg::Float(value)
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Str(value.to_owned())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Arg::Str(value)
    }
}

impl From<Vec<Arg>> for Arg {
    fn from(items: Vec<Arg>) -> Self {
        Arg::List(items)
    }
}

impl<T: Into<Arg>> From<Option<T>> for Arg {
    fn from(value: Option<T>) -> Self {
        value.map_or(Arg::None, Into::into)
    }
}

/// Positional and keyword arguments of one call
///
/// Keyword arguments are kept sorted by name, so the order they were
/// passed in never affects equality or the digest.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CallKey {
    args: Vec<Arg>,
    kwargs: BTreeMap<String, Arg>,
}

impl CallKey {
    /// Empty argument list
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a key from positional arguments only
    pub fn positional<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Arg>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            kwargs: BTreeMap::new(),
        }
    }

    /// Append a positional argument
    pub fn arg(mut self, value: impl Into<Arg>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Set a keyword argument, replacing any previous value for `name`
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Arg>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }

    /// Positional arguments in call order
    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    /// Keyword arguments sorted by name
    pub fn kwargs(&self) -> &BTreeMap<String, Arg> {
        &self.kwargs
    }
}

impl CacheKey for CallKey {
    fn deep_eq(&self, other: &Self) -> bool {
        seq_eq(&self.args, &other.args)
            && self.kwargs.len() == other.kwargs.len()
            && self
                .kwargs
                .iter()
                .zip(&other.kwargs)
                .all(|((name, value), (other_name, other_value))| {
                    name == other_name && value.deep_eq(other_value)
                })
    }

    fn try_digest(&self) -> Option<Digest> {
        content_digest(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_equality() {
        assert!(Arg::list(Vec::<Arg>::new()).deep_eq(&Arg::list(Vec::<Arg>::new())));
        assert!(Arg::list([Arg::list([1, 2]), 3.into()]).deep_eq(&Arg::list([Arg::list([1, 2]), 3.into()])));
        assert!(!Arg::list([1, 2]).deep_eq(&Arg::tuple([1, 2])));
        assert!(!Arg::Int(1).deep_eq(&Arg::Str("1".into())));
    }

    #[test]
    fn test_map_equality_ignores_order() {
        let a = Arg::map([("x", 1), ("y", 2)]);
        let b = Arg::map([("y", 2), ("x", 1)]);
        assert!(a.deep_eq(&b));
        assert_ne!(a.try_digest(), b.try_digest());
    }

    #[test]
    fn test_raw_map_with_repeated_key() {
        let repeated = Arg::Map(vec![(Arg::from("x"), Arg::from(1)), (Arg::from("x"), Arg::from(1))]);
        let distinct = Arg::Map(vec![(Arg::from("x"), Arg::from(1)), (Arg::from("y"), Arg::from(2))]);

        assert!(!repeated.deep_eq(&distinct));
        assert!(!distinct.deep_eq(&repeated));
    }

    #[test]
    fn test_float_equality() {
        assert!(Arg::Float(f64::NAN).deep_eq(&Arg::Float(f64::NAN)));
        assert!(Arg::Float(0.0).deep_eq(&Arg::Float(-0.0)));
        assert!(!Arg::Float(1.0).deep_eq(&Arg::Float(1.5)));
    }

    #[test]
    fn test_numeric_variants_stay_distinct() {
        assert!(!Arg::Int(1).deep_eq(&Arg::Float(1.0)));
        assert!(!Arg::Int(1).deep_eq(&Arg::Bool(true)));
        assert!(!Arg::Float(1.0).deep_eq(&Arg::Bool(true)));
    }

    #[test]
    fn test_map_repeated_key_replaces_value() {
        let map = Arg::map([("x", 1), ("x", 2)]);
        assert!(map.deep_eq(&Arg::map([("x", 2)])));
    }

    #[test]
    fn test_object_identity() {
        let obj = Arg::object(());
        assert!(obj.deep_eq(&obj.clone()));
        assert!(!Arg::object(()).deep_eq(&Arg::object(())));

        // Distinct objects collide on the digest
        assert!(Arg::object(()).try_digest().is_some());
        assert_eq!(Arg::object(()).try_digest(), Arg::object(1u8).try_digest());
    }

    #[test]
    fn test_callable_has_no_digest() {
        let f = Arg::callable(|x: i64| x + 1);
        assert!(f.try_digest().is_none());
        assert!(f.deep_eq(&f.clone()));
        assert!(!f.deep_eq(&Arg::callable(|x: i64| x + 1)));
        assert!(Arg::list([f.clone()]).try_digest().is_none());
    }

    #[test]
    fn test_handle_downcast() {
        let handle = Handle::new(7u32);
        assert_eq!(handle.downcast_ref::<u32>(), Some(&7));
        assert!(handle.downcast_ref::<i64>().is_none());
    }

    #[test]
    fn test_call_key_positions() {
        let a = CallKey::positional([1, 2, 3]);
        let b = CallKey::positional([3, 1, 2]);
        assert!(!a.deep_eq(&b));
        assert_ne!(a.try_digest(), b.try_digest());
    }

    #[test]
    fn test_call_key_kwarg_order() {
        let a = CallKey::new().kwarg("a", 1).kwarg("b", 2);
        let b = CallKey::new().kwarg("b", 2).kwarg("a", 1);
        assert!(a.deep_eq(&b));
        assert_eq!(a.try_digest(), b.try_digest());
    }

    #[test]
    fn test_call_key_with_callable_has_no_digest() {
        let key = CallKey::new().arg(1).kwarg("f", Arg::callable(()));
        assert!(key.try_digest().is_none());
    }
}
