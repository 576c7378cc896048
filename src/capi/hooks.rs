//! [`HostHooks`] implementation backing the C ABI surface: an opaque
//! `st_data_t` key/value pair, hashed and compared through host-supplied
//! function pointers, with panics across that boundary converted into
//! [`TableError`] instead of unwinding into foreign code.

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::error::TableError;
use crate::hasher::st_hash_type;
use crate::hooks::HostHooks;
use crate::st_data_t;

/// A key as seen by the C ABI: an opaque host-owned handle. Equality and
/// hashing are never derived for this type — they are always performed
/// through [`ExternHooks`], never through `PartialEq`/`Hash`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExternKey(pub st_data_t);

/// Drives [`crate::table::RawTable`] from a host-supplied `st_hash_type`
/// vtable, matching `acquire`/`release` up with `Py_INCREF`/`Py_DECREF`-style
/// reference counting in an embedding VM.
#[derive(Debug, Clone, Copy)]
pub struct ExternHooks {
    hash_type: *const st_hash_type,
}

impl ExternHooks {
    /// # Safety
    ///
    /// `hash_type` must be non-null and must point to a valid `st_hash_type`
    /// for as long as this `ExternHooks`, and any table it drives, is alive.
    #[inline]
    #[must_use]
    pub unsafe fn new(hash_type: *const st_hash_type) -> Self {
        Self { hash_type }
    }

    #[inline]
    fn vtable(&self) -> &st_hash_type {
        // Safety: upheld by the constructor's contract.
        unsafe { &*self.hash_type }
    }
}

impl HostHooks<ExternKey, st_data_t> for ExternHooks {
    fn hash(&self, key: &ExternKey) -> Result<u64, TableError> {
        let hash = self.vtable().hash;
        let data = key.0;
        catch_unwind(AssertUnwindSafe(|| unsafe { hash(data) }))
            .map(|value| value as u64)
            .map_err(|_| {
                log::warn!(target: "strudel::capi", "hash callback panicked across the FFI boundary");
                TableError::HashFailure
            })
    }

    fn eq(&self, a: &ExternKey, b: &ExternKey) -> Result<bool, TableError> {
        let compare = self.vtable().compare;
        let (a, b) = (a.0, b.0);
        catch_unwind(AssertUnwindSafe(|| unsafe { compare(a, b) == 0 })).map_err(|_| {
            log::warn!(target: "strudel::capi", "compare callback panicked across the FFI boundary");
            TableError::EqualityFailure
        })
    }

    fn acquire_key(&self, key: &ExternKey) {
        if let Some(acquire) = self.vtable().acquire {
            unsafe { acquire(key.0) };
        }
    }

    fn release_key(&self, key: &ExternKey) {
        if let Some(release) = self.vtable().release {
            unsafe { release(key.0) };
        }
    }

    fn acquire_value(&self, value: &st_data_t) {
        if let Some(acquire) = self.vtable().acquire {
            unsafe { acquire(*value) };
        }
    }

    fn release_value(&self, value: &st_data_t) {
        if let Some(release) = self.vtable().release {
            unsafe { release(*value) };
        }
    }
}
