//! Pre-built [`st_hash_type`] vtables and their `st_init_*table*` constructors,
//! mirroring the handful of hash/compare pairs MRI ships for callers that
//! don't want to write their own: numeric keys, C strings, and
//! case-insensitive C strings.

use core::hash::Hasher;
use std::ffi::CStr;

use crate::fnv::Fnv1a32;
use crate::hasher::st_hash_type;
use crate::typedefs::{st_data_t, st_index_t};

use super::{
    st_init_table, st_init_table_with_size, st_locale_insensitive_strcasecmp, st_numcmp, st_numhash, st_table,
};

static ST_HASHTYPE_NUM: st_hash_type = st_hash_type {
    compare: st_numcmp,
    hash: st_numhash,
    acquire: None,
    release: None,
};

unsafe extern "C" fn strcmp_raw(x: st_data_t, y: st_data_t) -> i32 {
    libc::strcmp(x as *const _, y as *const _)
}

unsafe extern "C" fn strhash(arg: st_data_t) -> st_index_t {
    let string = CStr::from_ptr(arg as *const libc::c_char);
    let mut hasher = Fnv1a32::default();
    hasher.write(string.to_bytes());
    hasher.finish() as st_index_t
}

static TYPE_STRHASH: st_hash_type = st_hash_type {
    compare: strcmp_raw,
    hash: strhash,
    acquire: None,
    release: None,
};

unsafe extern "C" fn strcasecmp_raw(x: st_data_t, y: st_data_t) -> i32 {
    st_locale_insensitive_strcasecmp(x as *const libc::c_char, y as *const libc::c_char)
}

unsafe extern "C" fn strcasehash(arg: st_data_t) -> st_index_t {
    let string = CStr::from_ptr(arg as *const libc::c_char);
    let mut hasher = Fnv1a32::default();
    for byte in string.to_bytes() {
        hasher.write_u8(byte.to_ascii_lowercase());
    }
    hasher.finish() as st_index_t
}

static TYPE_STRCASEHASH: st_hash_type = st_hash_type {
    compare: strcasecmp_raw,
    hash: strcasehash,
    acquire: None,
    release: None,
};

/// # Header declaration
///
/// ```c
/// st_table *st_init_numtable(void);
/// ```
#[no_mangle]
pub unsafe extern "C" fn st_init_numtable() -> *mut st_table {
    st_init_table(&ST_HASHTYPE_NUM)
}

/// # Header declaration
///
/// ```c
/// st_table *st_init_numtable_with_size(st_index_t);
/// ```
#[no_mangle]
pub unsafe extern "C" fn st_init_numtable_with_size(size: st_index_t) -> *mut st_table {
    st_init_table_with_size(&ST_HASHTYPE_NUM, size)
}

/// # Header declaration
///
/// ```c
/// st_table *st_init_strtable(void);
/// ```
#[no_mangle]
pub unsafe extern "C" fn st_init_strtable() -> *mut st_table {
    st_init_table(&TYPE_STRHASH)
}

/// # Header declaration
///
/// ```c
/// st_table *st_init_strtable_with_size(st_index_t);
/// ```
#[no_mangle]
pub unsafe extern "C" fn st_init_strtable_with_size(size: st_index_t) -> *mut st_table {
    st_init_table_with_size(&TYPE_STRHASH, size)
}

/// # Header declaration
///
/// ```c
/// st_table *st_init_strcasetable(void);
/// ```
#[no_mangle]
pub unsafe extern "C" fn st_init_strcasetable() -> *mut st_table {
    st_init_table(&TYPE_STRCASEHASH)
}

/// # Header declaration
///
/// ```c
/// st_table *st_init_strcasetable_with_size(st_index_t);
/// ```
#[no_mangle]
pub unsafe extern "C" fn st_init_strcasetable_with_size(size: st_index_t) -> *mut st_table {
    st_init_table_with_size(&TYPE_STRCASEHASH, size)
}
