//! `st_hash`-compatible C API bindings for [`crate::table::RawTable`].
//!
//! These bindings require activating the **capi** Cargo feature. Every
//! function here is `#[no_mangle] extern "C"` so a host runtime can link
//! against this crate (or the `strudel-ffi` cdylib built on top of it) as a
//! drop-in replacement for MRI's `st.c`, without the host needing to know
//! the table underneath is now a Swiss Table instead of bins-plus-entries.
//!
//! Keys and values crossing this boundary are opaque `st_data_t` words; the
//! host supplies hashing, equality, and (optionally) reference-count
//! lifecycle hooks through a `st_hash_type` vtable, wrapped here as
//! [`hooks::ExternHooks`]. A panic escaping a host callback is caught at the
//! FFI boundary and reported as a `HashFailure`/`EqualityFailure` return
//! code instead of unwinding into foreign code.

#![allow(non_camel_case_types)]

use core::ffi::c_void;
use core::mem::size_of;
use core::slice;
use std::ffi::CStr;
use std::os::raw::{c_char, c_int};

mod hooks;
mod specialized_init;

pub use hooks::{ExternHooks, ExternKey};

use crate::error::TableError;
use crate::hasher::{st_hash_type, StHasher, K};
use crate::table::{Located, RawTable, NIL};
use crate::typedefs::{st_data_t, st_foreach_callback_func, st_index_t, st_retval, st_update_callback_func};

type ExternTable = RawTable<ExternKey, st_data_t>;

/// Opaque handle returned to C callers. A host only ever holds a `*mut
/// st_table` obtained from one of the `st_init_*` functions below and passes
/// it back to the rest of this module; nothing outside this crate inspects
/// its layout.
pub struct st_table {
    hooks: ExternHooks,
    raw: ExternTable,
}

impl st_table {
    unsafe fn with_hash_type(hash_type: *const st_hash_type) -> Self {
        Self {
            hooks: ExternHooks::new(hash_type),
            raw: RawTable::new(),
        }
    }

    unsafe fn with_capacity_and_hash_type(capacity: usize, hash_type: *const st_hash_type) -> Self {
        Self {
            hooks: ExternHooks::new(hash_type),
            raw: RawTable::with_capacity(capacity),
        }
    }
}

impl Drop for st_table {
    fn drop(&mut self) {
        self.raw.drain_release(&self.hooks);
    }
}

/// # Header declaration
///
/// ```c
/// st_table *st_init_table(const struct st_hash_type *);
/// ```
#[no_mangle]
pub unsafe extern "C" fn st_init_table(hash_type: *const st_hash_type) -> *mut st_table {
    Box::into_raw(Box::new(st_table::with_hash_type(hash_type)))
}

/// # Header declaration
///
/// ```c
/// st_table *st_init_table_with_size(const struct st_hash_type *, st_index_t);
/// ```
#[no_mangle]
pub unsafe extern "C" fn st_init_table_with_size(
    hash_type: *const st_hash_type,
    size: st_index_t,
) -> *mut st_table {
    Box::into_raw(Box::new(st_table::with_capacity_and_hash_type(
        size as usize,
        hash_type,
    )))
}

/// # Header declaration
///
/// ```c
/// int st_delete(st_table *, st_data_t *, st_data_t *); /* returns 0:notfound 1:deleted */
/// ```
#[no_mangle]
pub unsafe extern "C" fn st_delete(
    table: *mut st_table,
    key: *mut st_data_t,
    value: *mut st_data_t,
) -> c_int {
    log::trace!(target: "strudel::capi", "st_delete(table={table:p}, key={:#x})", *key);
    let table = &mut *table;
    match table.raw.remove(&table.hooks, &ExternKey(*key)) {
        Ok((found_key, found_value)) => {
            if !key.is_null() {
                *key = found_key.0;
            }
            if !value.is_null() {
                *value = found_value;
            }
            1
        }
        Err(TableError::NotFound { .. }) => 0,
        Err(_) => -1,
    }
}

/// `_never` is MRI's reentrant-iteration sentinel: `st_delete_safe` exists so
/// a caller mid-`st_foreach` could mark an entry as pending deletion without
/// disturbing the bins a linear-probing `st_lookup` was walking. This
/// engine's insertion-order list survives in-place removal during iteration
/// (see `st_foreach`), so the sentinel has no work to do here.
///
/// # Header declaration
///
/// ```c
/// int st_delete_safe(st_table *, st_data_t *, st_data_t *, st_data_t);
/// ```
#[no_mangle]
pub unsafe extern "C" fn st_delete_safe(
    table: *mut st_table,
    key: *mut st_data_t,
    value: *mut st_data_t,
    _never: *const st_data_t,
) -> c_int {
    st_delete(table, key, value)
}

/// Removes and returns the earliest-inserted entry. MRI's `st_shift`, used
/// by `Hash#shift`.
///
/// # Header declaration
///
/// ```c
/// int st_shift(st_table *, st_data_t *, st_data_t *); /* returns 0:notfound 1:deleted */
/// ```
#[no_mangle]
pub unsafe extern "C" fn st_shift(
    table: *mut st_table,
    key: *mut st_data_t,
    value: *mut st_data_t,
) -> c_int {
    let table = &mut *table;
    let head = table.raw.head();
    if head == NIL {
        return 0;
    }
    let (found_key, found_value) = table.raw.remove_at(&table.hooks, head);
    if !key.is_null() {
        *key = found_key.0;
    }
    if !value.is_null() {
        *value = found_value;
    }
    1
}

/// # Header declaration
///
/// ```c
/// int st_insert(st_table *, st_data_t, st_data_t);
/// ```
#[no_mangle]
pub unsafe extern "C" fn st_insert(table: *mut st_table, key: st_data_t, value: st_data_t) -> c_int {
    log::trace!(target: "strudel::capi", "st_insert(table={table:p}, key={key:#x}, value={value:#x})");
    let table = &mut *table;
    match table.raw.insert_raw(&table.hooks, ExternKey(key), value) {
        Ok((_, Some(_))) => 1,
        Ok((_, None)) => 0,
        Err(_) => -1,
    }
}

/// Like [`st_insert`], but when the key is absent, `func` computes the key
/// that is actually stored rather than storing `key` verbatim (MRI uses this
/// to intern a heap-allocated key the first time it is seen).
///
/// # Header declaration
///
/// ```c
/// int st_insert2(st_table *, st_data_t, st_data_t, st_data_t (*)(st_data_t));
/// ```
#[no_mangle]
pub unsafe extern "C" fn st_insert2(
    table: *mut st_table,
    key: st_data_t,
    value: st_data_t,
    func: unsafe extern "C" fn(st_data_t) -> st_data_t,
) -> c_int {
    let table = &mut *table;
    match table.raw.find(&table.hooks, &ExternKey(key)) {
        Ok(Located::Occupied(index)) => {
            table.raw.replace_value(&table.hooks, index, value);
            1
        }
        Ok(Located::Vacant) => {
            let canonical_key = func(key);
            let _ = table.raw.insert(&table.hooks, ExternKey(canonical_key), value);
            0
        }
        Err(_) => -1,
    }
}

/// # Header declaration
///
/// ```c
/// int st_lookup(st_table *, st_data_t, st_data_t *);
/// ```
#[no_mangle]
pub unsafe extern "C" fn st_lookup(table: *mut st_table, key: st_data_t, value: *mut st_data_t) -> c_int {
    log::trace!(target: "strudel::capi", "st_lookup(table={table:p}, key={key:#x})");
    let table = &*table;
    match table.raw.get(&table.hooks, &ExternKey(key)) {
        Ok(Some(found)) => {
            if !value.is_null() {
                *value = *found;
            }
            1
        }
        Ok(None) => 0,
        Err(_) => -1,
    }
}

/// Like [`st_lookup`], but returns the canonical stored key rather than its
/// value, for hosts that intern keys and need the original allocation back.
///
/// # Header declaration
///
/// ```c
/// int st_get_key(st_table *, st_data_t, st_data_t *);
/// ```
#[no_mangle]
pub unsafe extern "C" fn st_get_key(table: *mut st_table, key: st_data_t, result: *mut st_data_t) -> c_int {
    let table = &*table;
    match table.raw.find(&table.hooks, &ExternKey(key)) {
        Ok(Located::Occupied(index)) => {
            if !result.is_null() {
                *result = table.raw.slot_key(index).0;
            }
            1
        }
        Ok(Located::Vacant) => 0,
        Err(_) => -1,
    }
}

/// `*key` may be altered by `func`, but must remain equal to the old key
/// (same hash, same `compare` result), otherwise behavior is undefined.
///
/// # Header declaration
///
/// ```c
/// int st_update(st_table *table, st_data_t key, st_update_callback_func *func, st_data_t arg);
/// ```
#[no_mangle]
pub unsafe extern "C" fn st_update(
    table: *mut st_table,
    key: st_data_t,
    func: st_update_callback_func,
    arg: st_data_t,
) -> c_int {
    log::trace!(target: "strudel::capi", "st_update(table={table:p}, key={key:#x})");
    let table = &mut *table;
    let located = match table.raw.find(&table.hooks, &ExternKey(key)) {
        Ok(located) => located,
        Err(_) => return -1,
    };
    match located {
        Located::Occupied(index) => {
            let mut key_io = table.raw.slot_key(index).0;
            let mut value_io = *table.raw.slot_value(index);
            let retval = func(&mut key_io, &mut value_io, arg, 1);
            if retval == st_retval::ST_DELETE {
                table.raw.remove_at(&table.hooks, index);
            } else {
                table.raw.replace_value(&table.hooks, index, value_io);
            }
            1
        }
        Located::Vacant => {
            let mut key_io = key;
            let mut value_io: st_data_t = 0;
            let retval = func(&mut key_io, &mut value_io, arg, 0);
            if retval == st_retval::ST_CONTINUE {
                let _ = table.raw.insert(&table.hooks, ExternKey(key_io), value_io);
            }
            0
        }
    }
}

/// Iterates in insertion order. `func` returns an [`st_retval`]: `ST_STOP`
/// ends iteration early, `ST_DELETE` removes the current entry and
/// continues, anything else continues unchanged.
///
/// # Header declaration
///
/// ```c
/// int st_foreach(st_table *, int (*)(ANYARGS), st_data_t);
/// ```
#[no_mangle]
pub unsafe extern "C" fn st_foreach(
    table: *mut st_table,
    func: st_foreach_callback_func,
    arg: st_data_t,
) -> c_int {
    log::trace!(target: "strudel::capi", "st_foreach(table={table:p})");
    let table = &mut *table;
    let mut cursor = table.raw.head();
    while cursor != NIL {
        let next = table.raw.slot_next(cursor);
        let key = table.raw.slot_key(cursor).0;
        let value = *table.raw.slot_value(cursor);
        let retval = func(key, value, arg, 0);
        if retval == st_retval::ST_STOP {
            return 0;
        }
        if retval == st_retval::ST_DELETE {
            table.raw.remove_at(&table.hooks, cursor);
        }
        cursor = next;
    }
    0
}

/// Identical to [`st_foreach`]; `_never` is MRI's reentrant-safety sentinel
/// and carries no behavior here (see [`st_delete_safe`]).
///
/// # Header declaration
///
/// ```c
/// int st_foreach_check(st_table *, int (*)(ANYARGS), st_data_t, st_data_t);
/// ```
#[no_mangle]
pub unsafe extern "C" fn st_foreach_check(
    table: *mut st_table,
    func: st_foreach_callback_func,
    arg: st_data_t,
    _never: st_data_t,
) -> c_int {
    st_foreach(table, func, arg)
}

/// Writes up to `size` keys, in insertion order, into `keys`. Returns the
/// number written.
///
/// # Header declaration
///
/// ```c
/// st_index_t st_keys(st_table *table, st_data_t *keys, st_index_t size);
/// ```
#[no_mangle]
pub unsafe extern "C" fn st_keys(table: *mut st_table, keys: *mut st_data_t, size: st_index_t) -> st_index_t {
    let table = &*table;
    let mut cursor = table.raw.head();
    let mut written: st_index_t = 0;
    while cursor != NIL && written < size {
        *keys.add(written as usize) = table.raw.slot_key(cursor).0;
        written += 1;
        cursor = table.raw.slot_next(cursor);
    }
    written
}

/// Identical to [`st_keys`]; `_never` carries no behavior here.
///
/// # Header declaration
///
/// ```c
/// st_index_t st_keys_check(st_table *table, st_data_t *keys, st_index_t size, st_data_t never);
/// ```
#[no_mangle]
pub unsafe extern "C" fn st_keys_check(
    table: *mut st_table,
    keys: *mut st_data_t,
    size: st_index_t,
    _never: st_data_t,
) -> st_index_t {
    st_keys(table, keys, size)
}

/// Writes up to `size` values, in insertion order, into `values`. Returns
/// the number written.
///
/// # Header declaration
///
/// ```c
/// st_index_t st_values(st_table *table, st_data_t *values, st_index_t size);
/// ```
#[no_mangle]
pub unsafe extern "C" fn st_values(
    table: *mut st_table,
    values: *mut st_data_t,
    size: st_index_t,
) -> st_index_t {
    let table = &*table;
    let mut cursor = table.raw.head();
    let mut written: st_index_t = 0;
    while cursor != NIL && written < size {
        *values.add(written as usize) = *table.raw.slot_value(cursor);
        written += 1;
        cursor = table.raw.slot_next(cursor);
    }
    written
}

/// Identical to [`st_values`]; `_never` carries no behavior here.
///
/// # Header declaration
///
/// ```c
/// st_index_t st_values_check(st_table *table, st_data_t *values, st_index_t size, st_data_t never);
/// ```
#[no_mangle]
pub unsafe extern "C" fn st_values_check(
    table: *mut st_table,
    values: *mut st_data_t,
    size: st_index_t,
    _never: st_data_t,
) -> st_index_t {
    st_values(table, values, size)
}

/// Inserts without first checking whether `key` is already present; the
/// caller must guarantee it is not. MRI uses this as a lookup-skipping fast
/// path; this engine's insert already folds the lookup and placement into
/// one probe, so the fast path and [`st_insert`] share an implementation.
///
/// # Header declaration
///
/// ```c
/// void st_add_direct(st_table *, st_data_t, st_data_t);
/// ```
#[no_mangle]
pub unsafe extern "C" fn st_add_direct(table: *mut st_table, key: st_data_t, value: st_data_t) {
    let table = &mut *table;
    let _ = table.raw.insert(&table.hooks, ExternKey(key), value);
}

/// # Header declaration
///
/// ```c
/// void st_free_table(st_table *);
/// ```
#[no_mangle]
pub unsafe extern "C" fn st_free_table(table: *mut st_table) {
    drop(Box::from_raw(table));
}

/// # Header declaration
///
/// ```c
/// void st_cleanup_safe(st_table *, st_data_t);
/// ```
#[no_mangle]
pub unsafe extern "C" fn st_cleanup_safe(table: *mut st_table, _never: st_data_t) {
    let _ = table;
}

/// Releases every entry, in insertion order, and resets the table to a
/// fresh, minimally sized backing store, ready for reuse.
///
/// # Header declaration
///
/// ```c
/// void st_clear(st_table *);
/// ```
#[no_mangle]
pub unsafe extern "C" fn st_clear(table: *mut st_table) {
    let table = &mut *table;
    table.raw.drain_release(&table.hooks);
    table.raw = RawTable::new();
}

/// Deep-copies a table, re-acquiring a share of every key and value it
/// carries forward (unlike MRI's `st_copy`, which is a raw struct
/// duplication with no such hook to call).
///
/// # Header declaration
///
/// ```c
/// st_table *st_copy(st_table *);
/// ```
#[no_mangle]
pub unsafe extern "C" fn st_copy(table: *mut st_table) -> *mut st_table {
    let src = &*table;
    let mut copy = st_table {
        hooks: src.hooks,
        raw: RawTable::with_capacity(src.raw.len()),
    };
    let mut cursor = src.raw.head();
    while cursor != NIL {
        let key = *src.raw.slot_key(cursor);
        let value = *src.raw.slot_value(cursor);
        let _ = copy.raw.insert(&copy.hooks, key, value);
        cursor = src.raw.slot_next(cursor);
    }
    Box::into_raw(Box::new(copy))
}

/// # Header declaration
///
/// ```c
/// CONSTFUNC(int st_numcmp(st_data_t, st_data_t));
/// ```
#[no_mangle]
pub unsafe extern "C" fn st_numcmp(x: st_data_t, y: st_data_t) -> c_int {
    (x != y) as c_int
}

/// # Header declaration
///
/// ```c
/// CONSTFUNC(st_index_t st_numhash(st_data_t));
/// ```
#[no_mangle]
pub unsafe extern "C" fn st_numhash(n: st_data_t) -> st_index_t {
    let mut hasher = StHasher::default();
    hasher.write_u64(n as u64);
    hasher.finish() as st_index_t
}

/// Approximate heap footprint of the table's backing arrays, for a host's
/// `ObjectSpace.memsize_of`-style introspection.
///
/// # Header declaration
///
/// ```c
/// PUREFUNC(size_t st_memsize(const st_table *));
/// ```
#[no_mangle]
pub unsafe extern "C" fn st_memsize(table: *const st_table) -> libc::size_t {
    let table = &*table;
    (size_of::<st_table>() + table.raw.allocated_bytes()) as libc::size_t
}

/// A general-purpose buffer hash, seeded by `h`, for hosts building their own
/// [`st_hash_type`] rather than reusing [`st_numhash`]/[`specialized_init`].
///
/// # Header declaration
///
/// ```c
/// PUREFUNC(st_index_t st_hash(const void *ptr, size_t len, st_index_t h));
/// ```
#[no_mangle]
pub unsafe extern "C" fn st_hash(ptr: *const c_void, len: libc::size_t, h: st_index_t) -> st_index_t {
    let bytes = slice::from_raw_parts(ptr.cast::<u8>(), len as usize);
    let mut state = st_hash_start(h);
    for chunk in bytes.chunks(size_of::<st_index_t>()) {
        let mut buf = [0_u8; size_of::<st_index_t>()];
        buf[..chunk.len()].copy_from_slice(chunk);
        state = st_hash_uint(state, st_index_t::from_ne_bytes(buf));
    }
    st_hash_end(state)
}

/// # Header declaration
///
/// ```c
/// CONSTFUNC(st_index_t st_hash_uint32(st_index_t h, uint32_t i));
/// ```
#[no_mangle]
pub unsafe extern "C" fn st_hash_uint32(h: st_index_t, i: u32) -> st_index_t {
    st_hash_uint(h, i as st_index_t)
}

/// # Header declaration
///
/// ```c
/// CONSTFUNC(st_index_t st_hash_uint(st_index_t h, st_index_t i));
/// ```
#[no_mangle]
pub unsafe extern "C" fn st_hash_uint(h: st_index_t, i: st_index_t) -> st_index_t {
    let h = h.rotate_left(5) ^ i;
    h.wrapping_mul(K)
}

/// # Header declaration
///
/// ```c
/// CONSTFUNC(st_index_t st_hash_end(st_index_t h));
/// ```
#[no_mangle]
pub unsafe extern "C" fn st_hash_end(h: st_index_t) -> st_index_t {
    let h = h ^ (h >> 16);
    h.wrapping_mul(0x85eb_ca6b)
}

/// # Header declaration
///
/// ```c
/// CONSTFUNC(st_index_t st_hash_start(st_index_t h));
/// ```
#[no_mangle]
pub unsafe extern "C" fn st_hash_start(h: st_index_t) -> st_index_t {
    h
}

/// # Header declaration
///
/// ```c
/// PUREFUNC(int st_locale_insensitive_strcasecmp(const char *s1, const char *s2));
/// ```
#[no_mangle]
pub unsafe extern "C" fn st_locale_insensitive_strcasecmp(s1: *const c_char, s2: *const c_char) -> c_int {
    let s1 = CStr::from_ptr(s1);
    let s2 = CStr::from_ptr(s2);
    match (s1.to_bytes().len(), s2.to_bytes().len()) {
        (left, right) if left == right => {}
        (left, right) if left > right => return 1,
        _ => return -1,
    }

    for (&left, &right) in s1.to_bytes().iter().zip(s2.to_bytes().iter()) {
        let c1 = left.to_ascii_lowercase();
        let c2 = right.to_ascii_lowercase();
        match (c1, c2) {
            (a, b) if a == b => {}
            (a, b) if a > b => return 1,
            _ => return -1,
        }
    }
    0
}

/// # Header declaration
///
/// ```c
/// PUREFUNC(int st_locale_insensitive_strncasecmp(const char *s1, const char *s2, size_t n));
/// ```
#[no_mangle]
pub unsafe extern "C" fn st_locale_insensitive_strncasecmp(
    s1: *const c_char,
    s2: *const c_char,
    n: libc::size_t,
) -> c_int {
    let s1 = slice::from_raw_parts(s1.cast::<u8>(), n as usize);
    let s2 = slice::from_raw_parts(s2.cast::<u8>(), n as usize);

    for (&left, &right) in s1.iter().zip(s2.iter()) {
        match (left, right) {
            (b'\0', b'\0') => return 0,
            (_, b'\0') => return 1,
            (b'\0', _) => return -1,
            (mut c1, mut c2) => {
                c1 = c1.to_ascii_lowercase();
                c2 = c2.to_ascii_lowercase();
                match (c1, c2) {
                    (a, b) if a == b => {}
                    (a, b) if a > b => return 1,
                    _ => return -1,
                }
            }
        }
    }
    0
}

/// `#define st_strcasecmp st_locale_insensitive_strcasecmp`
#[no_mangle]
pub unsafe extern "C" fn st_strcasecmp(s1: *const c_char, s2: *const c_char) -> c_int {
    st_locale_insensitive_strcasecmp(s1, s2)
}

/// `#define st_strncasecmp st_locale_insensitive_strncasecmp`
#[no_mangle]
pub unsafe extern "C" fn st_strncasecmp(s1: *const c_char, s2: *const c_char, n: libc::size_t) -> c_int {
    st_locale_insensitive_strncasecmp(s1, s2, n)
}

#[cfg(test)]
mod tests {
    use super::*;

    unsafe extern "C" fn eq(a: st_data_t, b: st_data_t) -> c_int {
        (a != b) as c_int
    }

    unsafe extern "C" fn identity_hash(a: st_data_t) -> st_index_t {
        a
    }

    static HASH_TYPE: st_hash_type = st_hash_type {
        compare: eq,
        hash: identity_hash,
        acquire: None,
        release: None,
    };

    #[test]
    fn insert_lookup_delete_roundtrip() {
        unsafe {
            let table = st_init_table(&HASH_TYPE);
            assert_eq!(st_insert(table, 1, 100), 0);
            assert_eq!(st_insert(table, 2, 200), 0);
            assert_eq!(st_insert(table, 1, 111), 1);

            let mut value = 0;
            assert_eq!(st_lookup(table, 1, &mut value), 1);
            assert_eq!(value, 111);
            assert_eq!(st_lookup(table, 42, &mut value), 0);

            let mut key_out = 1;
            let mut value_out = 0;
            assert_eq!(st_delete(table, &mut key_out, &mut value_out), 1);
            assert_eq!(value_out, 111);
            assert_eq!(st_lookup(table, 1, &mut value), 0);

            st_free_table(table);
        }
    }

    #[test]
    fn foreach_visits_in_insertion_order() {
        unsafe extern "C" fn collect(key: st_data_t, _value: st_data_t, arg: st_data_t, _existing: c_int) -> c_int {
            let collected = &mut *(arg as *mut Vec<st_data_t>);
            collected.push(key);
            st_retval::ST_CONTINUE as c_int
        }

        unsafe {
            let table = st_init_table(&HASH_TYPE);
            for key in [10_u64, 20, 30] {
                st_insert(table, key, key * 2);
            }
            let mut collected: Vec<st_data_t> = Vec::new();
            st_foreach(table, collect, &mut collected as *mut _ as st_data_t);
            assert_eq!(collected, vec![10, 20, 30]);
            st_free_table(table);
        }
    }

    #[test]
    fn keys_and_values_are_insertion_ordered() {
        unsafe {
            let table = st_init_table(&HASH_TYPE);
            for key in [1_u64, 2, 3] {
                st_insert(table, key, key + 100);
            }
            let mut keys = [0_u64; 3];
            assert_eq!(st_keys(table, keys.as_mut_ptr(), 3), 3);
            assert_eq!(keys, [1, 2, 3]);

            let mut values = [0_u64; 3];
            assert_eq!(st_values(table, values.as_mut_ptr(), 3), 3);
            assert_eq!(values, [101, 102, 103]);

            st_free_table(table);
        }
    }
}
