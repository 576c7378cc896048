//! A hash map that iterates in the order its entries were inserted.
//!
//! [`StHashMap`] mirrors [`std::collections::HashMap`]'s native-Rust surface
//! (`K: Hash + Eq`, a `BuildHasher` type parameter, the entry API,
//! `FromIterator`/`Extend`) while backing it with the ordered Swiss Table in
//! [`crate::table`]. It always drives that table through [`StdHooks`]; the
//! same [`RawTable`] engine is also driven directly by the capi module's
//! `st_table`, which plugs in [`crate::capi::hooks::ExternHooks`] instead —
//! `RawTable` takes its `&impl HostHooks<K, V>` per call rather than being
//! generic over it, so neither side needs the other's wrapper type.

use core::hash::{BuildHasher, Hash};
use core::iter::FromIterator;
use core::mem::ManuallyDrop;
use std::collections::hash_map::RandomState;
use std::fmt;

use crate::entry::{self, Entry};
use crate::error::TableError;
use crate::hooks::{HostHooks, StdHooks};
use crate::iter::{IntoIter, Iter, Keys, Values};
use crate::table::RawTable;

/// An insertion-ordered hash map.
///
/// `S` defaults to [`RandomState`], matching `std`'s `HashMap`. Unlike `std`,
/// lookups, inserts, and growth are fallible: `RawTable`'s `HostHooks` calls
/// can fail for the capi module's `ExternHooks` (never for this map's own
/// `StdHooks`, whose `Hash`/`Eq` calls are infallible), and allocation
/// failure while growing is surfaced rather than aborting the process.
pub struct StHashMap<K, V, S = RandomState> {
    raw: RawTable<K, V>,
    hooks: StdHooks<S>,
}

impl<K, V> StHashMap<K, V, RandomState> {
    /// Creates an empty `StHashMap`, using the default hasher.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty `StHashMap` sized to hold at least `capacity`
    /// entries without reallocating, using the default hasher.
    #[inline]
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, RandomState::default())
    }
}

impl<K, V> Default for StHashMap<K, V, RandomState> {
    #[inline]
    fn default() -> Self {
        Self::with_hasher(RandomState::default())
    }
}

impl<K, V, S> StHashMap<K, V, S> {
    /// Creates an empty `StHashMap` which will use `hash_builder` to hash
    /// keys.
    #[inline]
    #[must_use]
    pub fn with_hasher(hash_builder: S) -> Self {
        Self {
            raw: RawTable::new(),
            hooks: StdHooks::new(hash_builder),
        }
    }

    /// Creates an empty `StHashMap` sized to hold at least `capacity`
    /// entries without reallocating, which will use `hash_builder` to hash
    /// keys.
    #[inline]
    #[must_use]
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self {
            raw: RawTable::with_capacity(capacity),
            hooks: StdHooks::new(hash_builder),
        }
    }

    /// Returns the number of elements the map holds.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the map holds no elements.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Returns the number of slots the map's backing storage can hold
    /// without reallocating.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    /// A reference to the map's `BuildHasher`.
    #[inline]
    #[must_use]
    pub fn hasher(&self) -> &S {
        self.hooks.build_hasher()
    }
}

impl<K, V, S> StHashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Returns a reference to the value corresponding to `key`.
    pub fn get(&self, key: &K) -> Result<Option<&V>, TableError> {
        self.raw.get(&self.hooks, key)
    }

    /// Returns a mutable reference to the value corresponding to `key`.
    pub fn get_mut(&mut self, key: &K) -> Result<Option<&mut V>, TableError> {
        self.raw.get_mut(&self.hooks, key)
    }

    /// Returns `true` if the map contains `key`.
    pub fn contains_key(&self, key: &K) -> Result<bool, TableError> {
        self.raw.contains_key(&self.hooks, key)
    }

    /// Inserts a key/value pair, returning the previous value if `key` was
    /// already present. Preserves `key`'s original insertion position if it
    /// was already present; otherwise `key` becomes the newest entry.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, TableError> {
        self.raw.insert(&self.hooks, key, value)
    }

    /// Removes `key`, returning its key and value.
    pub fn remove(&mut self, key: &K) -> Result<(K, V), TableError>
    where
        K: fmt::Debug,
    {
        self.raw.remove(&self.hooks, key)
    }

    /// Gets the given key's corresponding entry for in-place manipulation.
    pub fn entry(&mut self, key: K) -> Result<Entry<'_, K, V, StdHooks<S>>, TableError> {
        let located = self.raw.find(&self.hooks, &key)?;
        Ok(entry::from_located(&mut self.raw, &self.hooks, key, located))
    }

    /// An iterator visiting all key/value pairs in insertion order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            table: &self.raw,
            front: self.raw.head(),
            back: self.raw.tail(),
            version: self.raw.version(),
            remaining: self.raw.len(),
        }
    }

    /// An iterator visiting all keys in insertion order.
    #[must_use]
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys(self.iter())
    }

    /// An iterator visiting all values in insertion order.
    #[must_use]
    pub fn values(&self) -> Values<'_, K, V> {
        Values(self.iter())
    }
}

impl<K, V, S> Drop for StHashMap<K, V, S> {
    fn drop(&mut self) {
        self.raw.drain_release(&self.hooks);
    }
}

impl<K, V, S> StHashMap<K, V, S> {
    /// Consumes the map, returning its entries in insertion order.
    #[must_use]
    pub fn into_iter(self) -> IntoIter<K, V> {
        // `StHashMap` has a manual `Drop` impl, so its fields cannot be
        // partially moved out of a by-value `self` directly (E0509).
        // `ManuallyDrop` suppresses that impl so the fields can be read out,
        // after which `hooks` is dropped immediately (its own `Drop`, if
        // any) and `raw`'s entries are handed to the caller instead of being
        // released.
        let this = ManuallyDrop::new(self);
        let raw = unsafe { core::ptr::read(&this.raw) };
        let hooks = unsafe { core::ptr::read(&this.hooks) };
        drop(hooks);
        IntoIter(raw.into_entries().into_iter())
    }
}

impl<K, V, S> IntoIterator for StHashMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        StHashMap::into_iter(self)
    }
}

impl<'a, K, V, S> IntoIterator for &'a StHashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, S> FromIterator<(K, V)> for StHashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::with_hasher(S::default());
        map.extend(iter);
        map
    }
}

impl<K, V, S> Extend<(K, V)> for StHashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            let _ = self.insert(key, value).expect("native Rust Hash/Eq never fails");
        }
    }
}

impl<K, V, S> fmt::Debug for StHashMap<K, V, S>
where
    K: Hash + Eq + fmt::Debug,
    V: fmt::Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_get_remove() {
        let mut map = StHashMap::new();
        assert!(map.insert("a", 1).unwrap().is_none());
        assert_eq!(map.get(&"a").unwrap(), Some(&1));
        assert_eq!(map.remove(&"a").unwrap(), ("a", 1));
        assert!(map.get(&"a").unwrap().is_none());
    }

    #[test]
    fn iteration_is_insertion_ordered() {
        let mut map = StHashMap::new();
        for (key, value) in [("z", 1), ("a", 2), ("m", 3)] {
            map.insert(key, value).unwrap();
        }
        let collected: Vec<_> = map.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(collected, vec![("z", 1), ("a", 2), ("m", 3)]);
    }

    #[test]
    fn overwrite_preserves_position_update_changes_value() {
        let mut map = StHashMap::new();
        map.insert("a", 1).unwrap();
        map.insert("b", 2).unwrap();
        let old = map.insert("a", 10).unwrap();
        assert_eq!(old, Some(1));
        let collected: Vec<_> = map.keys().copied().collect();
        assert_eq!(collected, vec!["a", "b"]);
    }

    #[test]
    fn entry_or_insert_with() {
        let mut map: StHashMap<&str, i32> = StHashMap::new();
        *map.entry("a").unwrap().or_insert(0) += 1;
        *map.entry("a").unwrap().or_insert(0) += 1;
        assert_eq!(map.get(&"a").unwrap(), Some(&2));
    }

    #[test]
    fn entry_and_modify() {
        let mut map = StHashMap::new();
        map.insert("a", 1).unwrap();
        map.entry("a").unwrap().and_modify(|v| *v += 41);
        assert_eq!(map.get(&"a").unwrap(), Some(&42));
    }

    #[test]
    fn from_iterator_preserves_order() {
        let map: StHashMap<_, _> = vec![(3, "c"), (1, "a"), (2, "b")].into_iter().collect();
        let collected: Vec<_> = map.keys().copied().collect();
        assert_eq!(collected, vec![3, 1, 2]);
    }

    #[test]
    fn into_iter_yields_every_entry_once() {
        let mut map = StHashMap::new();
        for i in 0..50 {
            map.insert(i, i * 2).unwrap();
        }
        let collected: Vec<_> = map.into_iter().collect();
        assert_eq!(collected.len(), 50);
        for (i, (k, v)) in collected.into_iter().enumerate() {
            assert_eq!(k, i);
            assert_eq!(v, i * 2);
        }
    }

    #[test]
    #[should_panic(expected = "table was modified during iteration")]
    fn iterator_panics_on_concurrent_modification() {
        let mut map = StHashMap::new();
        map.insert("a", 1).unwrap();
        let stale_version = map.raw.version();
        map.insert("b", 2).unwrap();
        let mut iter = Iter {
            table: &map.raw,
            front: map.raw.head(),
            back: map.raw.tail(),
            version: stale_version,
            remaining: map.raw.len(),
        };
        let _ = iter.next();
    }
}
