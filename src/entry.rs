//! [`StHashMap`](crate::StHashMap) entry API.
//!
//! Mirrors [`std::collections::hash_map::Entry`]'s shape, but is generic over
//! the [`HostHooks`] collaborator that drives the table. The capi module
//! does not use this type — a C caller has no equivalent of a borrowed
//! entry handle, so it calls `find`/`insert_raw` on `RawTable` directly.

use crate::hooks::HostHooks;
use crate::table::{Located, RawTable};

/// A view into a single entry in a map, which may either be vacant or
/// occupied. Constructed from [`StHashMap::entry`](crate::StHashMap::entry).
pub enum Entry<'a, K, V, H> {
    /// An occupied entry.
    Occupied(OccupiedEntry<'a, K, V, H>),

    /// A vacant entry.
    Vacant(VacantEntry<'a, K, V, H>),
}

impl<'a, K, V, H> Entry<'a, K, V, H>
where
    H: HostHooks<K, V>,
{
    /// Ensures a value is in the entry by inserting the default if empty, and
    /// returns a mutable reference to the value in the entry.
    #[inline]
    #[must_use]
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Self::Occupied(entry) => entry.into_mut(),
            Self::Vacant(entry) => entry.insert(default),
        }
    }

    /// Ensures a value is in the entry by inserting the result of the default
    /// function if empty, and returns a mutable reference to the value.
    #[inline]
    pub fn or_insert_with<F>(self, default: F) -> &'a mut V
    where
        F: FnOnce() -> V,
    {
        match self {
            Self::Occupied(entry) => entry.into_mut(),
            Self::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Like [`Entry::or_insert_with`], but the default function also sees the
    /// key, for values that are a function of it.
    #[inline]
    #[must_use]
    pub fn or_insert_with_key<F>(self, default: F) -> &'a mut V
    where
        F: FnOnce(&K) -> V,
    {
        match self {
            Self::Occupied(entry) => entry.into_mut(),
            Self::Vacant(entry) => {
                let value = default(entry.key());
                entry.insert(value)
            }
        }
    }

    /// Returns a reference to this entry's key.
    #[inline]
    #[must_use]
    pub fn key(&self) -> &K {
        match self {
            Self::Occupied(entry) => entry.key(),
            Self::Vacant(entry) => entry.key(),
        }
    }

    /// Provides in-place mutable access to an occupied entry before any
    /// potential inserts into the map.
    #[inline]
    pub fn and_modify<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut V),
    {
        match self {
            Self::Occupied(mut entry) => {
                f(entry.get_mut());
                Self::Occupied(entry)
            }
            Self::Vacant(entry) => Self::Vacant(entry),
        }
    }
}

/// A view into an occupied entry. Part of the [`Entry`] enum.
pub struct OccupiedEntry<'a, K, V, H> {
    pub(crate) raw: &'a mut RawTable<K, V>,
    pub(crate) hooks: &'a H,
    pub(crate) index: usize,
}

impl<'a, K, V, H> OccupiedEntry<'a, K, V, H>
where
    H: HostHooks<K, V>,
{
    /// Gets a reference to the key in the entry.
    #[inline]
    #[must_use]
    pub fn key(&self) -> &K {
        self.raw.slot_key(self.index)
    }

    /// Take ownership of the key and value from the map.
    #[inline]
    #[must_use]
    pub fn remove_entry(self) -> (K, V) {
        self.raw.remove_at(self.hooks, self.index)
    }

    /// Gets a reference to the value in the entry.
    #[inline]
    #[must_use]
    pub fn get(&self) -> &V {
        self.raw.slot_value(self.index)
    }

    /// Gets a mutable reference to the value in the entry.
    #[inline]
    pub fn get_mut(&mut self) -> &mut V {
        self.raw.slot_value_mut(self.index)
    }

    /// Converts the `OccupiedEntry` into a mutable reference to the value
    /// with a lifetime bound to the map itself.
    #[inline]
    #[must_use]
    pub fn into_mut(self) -> &'a mut V {
        self.raw.slot_value_mut(self.index)
    }

    /// Sets the value of the entry, and returns the entry's old value.
    #[inline]
    pub fn insert(&mut self, value: V) -> V {
        self.raw.replace_value(self.hooks, self.index, value)
    }

    /// Takes the value out of the entry, and returns it.
    #[inline]
    #[must_use]
    pub fn remove(self) -> V {
        self.remove_entry().1
    }
}

/// A view into a vacant entry. Part of the [`Entry`] enum.
pub struct VacantEntry<'a, K, V, H> {
    pub(crate) raw: &'a mut RawTable<K, V>,
    pub(crate) hooks: &'a H,
    pub(crate) key: K,
}

impl<'a, K, V, H> VacantEntry<'a, K, V, H>
where
    H: HostHooks<K, V>,
{
    /// Gets a reference to the key that would be used when inserting a value
    /// through the `VacantEntry`.
    #[inline]
    #[must_use]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Take ownership of the key.
    #[inline]
    #[must_use]
    pub fn into_key(self) -> K {
        self.key
    }

    /// Sets the value of the entry with the `VacantEntry`'s key, and returns a
    /// mutable reference to it.
    ///
    /// Re-hashes and re-compares the key rather than reusing the slot this
    /// entry was located at, since growing the table (if the load factor
    /// requires it) can move every slot. A host hash/compare callback that
    /// behaves differently between the lookup that produced this entry and
    /// this call already violates the table's determinism invariant, so
    /// failure here is a caller bug, not a condition this API reports as a
    /// `Result`.
    #[inline]
    #[must_use]
    pub fn insert(self, value: V) -> &'a mut V {
        let Self { raw, hooks, key } = self;
        let (index, _old) = raw
            .insert_raw(hooks, key, value)
            .expect("host hash/eq callbacks must be deterministic between a lookup and its entry insert");
        raw.slot_value_mut(index)
    }
}

pub(crate) fn from_located<'a, K, V, H>(
    raw: &'a mut RawTable<K, V>,
    hooks: &'a H,
    key: K,
    located: Located,
) -> Entry<'a, K, V, H> {
    match located {
        Located::Occupied(index) => Entry::Occupied(OccupiedEntry { raw, hooks, index }),
        Located::Vacant => Entry::Vacant(VacantEntry { raw, hooks, key }),
    }
}
