//! The host collaborator abstraction.
//!
//! [`RawTable`](crate::table::RawTable) is generic over `K, V` only; it does
//! not know whether it is driven by native Rust `Hash`/`Eq`/`Drop` or by an
//! embedding VM's C-ABI callbacks. Each call site passes in a `&impl
//! HostHooks<K, V>` explicitly, so the probe/growth/rehash logic is written
//! and monomorphized exactly once and shared by both paths.

use core::hash::{BuildHasher, Hash};

use crate::error::TableError;

/// Hashing, equality, and reference-count lifecycle, supplied by whichever
/// host owns the table.
pub trait HostHooks<K, V> {
    /// Compute a hash code for `key`. Fallible so a C-ABI host can report a
    /// callback failure (`hash.rs`/`capi.rs`'s `catch_unwind` boundary).
    fn hash(&self, key: &K) -> Result<u64, TableError>;

    /// Compare two keys for equality. Fallible for the same reason as
    /// [`HostHooks::hash`].
    fn eq(&self, a: &K, b: &K) -> Result<bool, TableError>;

    /// Called once when a key takes up residence in an occupied slot (fresh
    /// insert, or as part of a rehash/grow migration). No-op for a host that
    /// owns `K` outright (native Rust: the move into the slot already is the
    /// acquisition).
    #[inline]
    fn acquire_key(&self, _key: &K) {}

    /// Called once when a key's slot stops being occupied (overwrite target
    /// is the *value*, not the key — keys are immutable once inserted — so
    /// this fires only on delete, destroy, or as the old side of a migration
    /// that is not carried forward).
    #[inline]
    fn release_key(&self, _key: &K) {}

    /// Called once when a value takes up residence in an occupied slot
    /// (fresh insert, overwrite of an existing key, or migration).
    #[inline]
    fn acquire_value(&self, _value: &V) {}

    /// Called once when a value stops being the one live value for its slot
    /// (overwritten, deleted, or destroyed).
    #[inline]
    fn release_value(&self, _value: &V) {}
}

/// [`HostHooks`] backed by Rust's own `Hash`/`Eq`/`BuildHasher` traits.
///
/// Hashing and equality are infallible by construction (the `Result` is
/// always `Ok`); `acquire`/`release` are no-ops because Rust's ownership
/// model already guarantees a key/value is dropped exactly once when it
/// leaves the table.
#[derive(Debug, Clone, Default)]
pub struct StdHooks<S> {
    build_hasher: S,
}

impl<S> StdHooks<S> {
    #[inline]
    #[must_use]
    pub fn new(build_hasher: S) -> Self {
        Self { build_hasher }
    }

    #[inline]
    #[must_use]
    pub fn build_hasher(&self) -> &S {
        &self.build_hasher
    }
}

impl<K, V, S> HostHooks<K, V> for StdHooks<S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    #[inline]
    fn hash(&self, key: &K) -> Result<u64, TableError> {
        Ok(self.build_hasher.hash_one(key))
    }

    #[inline]
    fn eq(&self, a: &K, b: &K) -> Result<bool, TableError> {
        Ok(a == b)
    }
}

/// Extension trait providing `BuildHasher::hash_one` on hashers predating its
/// stabilization, mirroring the teacher's hand-rolled `StHasher`.
trait BuildHasherExt: BuildHasher {
    fn hash_one<T: Hash + ?Sized>(&self, value: &T) -> u64 {
        use core::hash::Hasher;
        let mut hasher = self.build_hasher();
        value.hash(&mut hasher);
        hasher.finish()
    }
}

impl<S: BuildHasher> BuildHasherExt for S {}
