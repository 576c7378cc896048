/* This is a public domain general purpose hash table package
originally written by Peter Moore @ UCB.

The hash table data structures were redesigned and the package was
rewritten by Vladimir Makarov <vmakarov@redhat.com>.  */

//! Thin cdylib shim around [`strudel`]'s `capi` module.
//!
//! All of the real `st_hash`-compatible `#[no_mangle] extern "C"` symbols
//! (`st_init_table`, `st_insert`, `st_foreach`, ...) live in `strudel`
//! itself, gated behind its `capi` feature. A `#[no_mangle]` symbol in an
//! `rlib` dependency is re-exported automatically by the final `cdylib` that
//! links it in, so this crate's only job is to depend on `strudel` with
//! that feature on and give the resulting shared object the name a host
//! expects (`libstrudel_st.so`/`.dylib`/`.dll`).
//!
//! Re-exporting the public types here also gives `cbindgen`, or a
//! hand-written header, one crate root to point at when generating `st.h`.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![warn(missing_debug_implementations)]
#![allow(non_camel_case_types)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use strudel::capi::*;
pub use strudel::{st_data_t, st_hash_t, st_hash_type, st_index_t, st_retval};
