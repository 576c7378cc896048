//! `st_hash`-compatible scalar type aliases shared by [`crate::hasher`] and
//! [`crate::capi`].
//!
//! These are kept separate from the two modules that use them because both
//! need them and neither owns the other.

/// An opaque, host-owned word: a tagged pointer, a boxed `VALUE`, an interned
/// symbol id, or any other bit pattern the host's `hash`/`compare` callbacks
/// know how to interpret. The table never inspects its bits directly.
#[cfg(target_pointer_width = "64")]
pub type st_data_t = u64;
#[cfg(target_pointer_width = "32")]
pub type st_data_t = u32;

/// Used for capacities, slot counts, and raw hash codes before they are
/// folded down to a `u64` for the engine.
pub type st_index_t = st_data_t;

/// Return values a `st_foreach`/`st_update` callback hands back to the
/// iteration driver.
///
/// # Header declaration
///
/// ```c
/// enum st_retval {ST_CONTINUE, ST_STOP, ST_DELETE, ST_CHECK};
/// ```
#[repr(C)]
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[allow(clippy::upper_case_acronyms)]
pub enum st_retval {
    /// Continue iteration.
    ST_CONTINUE,
    /// Stop iteration.
    ST_STOP,
    /// Delete the current entry and continue iteration.
    ST_DELETE,
    /// `st_foreach_check` only: re-validate the cursor before continuing.
    ST_CHECK,
}

impl PartialEq<i32> for st_retval {
    #[inline]
    fn eq(&self, other: &i32) -> bool {
        *self as i32 == *other
    }
}

impl PartialEq<st_retval> for i32 {
    #[inline]
    fn eq(&self, other: &st_retval) -> bool {
        *self == *other as i32
    }
}

/// # Header declaration
///
/// ```c
/// typedef int st_update_callback_func(st_data_t *key, st_data_t *value, st_data_t arg, int existing);
/// ```
pub type st_update_callback_func =
    unsafe extern "C" fn(*mut st_data_t, *mut st_data_t, st_data_t, i32) -> i32;

/// # Header declaration
///
/// ```c
/// int (*)(ANYARGS)
/// ```
pub type st_foreach_callback_func =
    unsafe extern "C" fn(st_data_t, st_data_t, st_data_t, i32) -> i32;
