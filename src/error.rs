//! Typed errors for the failure modes a table operation can report.
//!
//! Both the native [`crate::StHashMap`] API and the `capi` C ABI are driven
//! from this single enum: the native path returns it directly in a
//! [`Result`]; the C ABI maps each variant to a small, stable `c_int` status
//! code documented next to each `extern "C"` function.
//!
//! Concurrent modification during iteration is not one of these variants: an
//! iterator that observes a stale [`version`](crate::table::RawTable::version)
//! panics immediately (see `src/iter.rs`'s `check_version`), the same way a
//! `RefCell` panics on a conflicting borrow rather than returning a `Result`
//! an `Iterator::next` caller would have no ergonomic way to propagate.

use core::fmt;

use crate::st_data_t;

/// Failure modes for table operations.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// An allocation failed while growing or rehashing the table. The table
    /// is left on its pre-operation arrays; atomicity is guaranteed because
    /// the engine always allocates the new backing store before mutating the
    /// old one.
    #[error("out of memory")]
    OutOfMemory,

    /// The host's hash callback signaled failure (C ABI only; panicked or
    /// returned a sentinel the embedding runtime uses to indicate a Ruby- or
    /// Python-level exception escaped the callback).
    #[error("hash function failed")]
    HashFailure,

    /// The host's equality callback signaled failure (C ABI only).
    #[error("equality comparison failed")]
    EqualityFailure,

    /// The requested key is not present in the table.
    #[error("key not found: {key}")]
    NotFound {
        /// The key that could not be located, formatted for diagnostics.
        key: NotFoundKey,
    },
}

impl TableError {
    #[inline]
    #[must_use]
    pub(crate) fn not_found(key: impl fmt::Debug) -> Self {
        Self::NotFound {
            key: NotFoundKey(format!("{key:?}")),
        }
    }

    #[inline]
    #[must_use]
    pub(crate) fn not_found_raw(key: st_data_t) -> Self {
        Self::NotFound {
            key: NotFoundKey(format!("{key:#x}")),
        }
    }
}

/// A formatted key, carried by [`TableError::NotFound`] for reporting without
/// requiring `TableError` itself to be generic over the table's key type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotFoundKey(String);

impl fmt::Display for NotFoundKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
