//! An ordered Swiss Table: an open-addressed hash map whose slot occupancy
//! is tracked by a sidecar array of one-byte control markers, scanned
//! sixteen at a time so a lookup or insert touches at most a couple of cache
//! lines before it finds its slot.
//!
//! Unlike a typical Swiss Table, this one also threads an intrusive
//! doubly-linked list through its occupied slots, so iteration always visits
//! entries in the order they were inserted, the same guarantee the
//! bins-plus-entries-array design of Ruby's `st_hash` gives MRI's `Hash`.
//! The two designs solve ordered iteration differently: `st_hash` gets it by
//! construction (new entries are appended to a dense array); this crate
//! rebuilds the same property from an otherwise-unordered open-addressing
//! scheme.
//!
//! [`StHashMap`] is the safe, native-Rust-facing map: `K: Hash + Eq`, a
//! `BuildHasher` type parameter, an entry API, `FromIterator`/`Extend`,
//! insertion-ordered iterators. The [`capi`] module (behind the `capi`
//! Cargo feature) drives the identical engine from a host runtime's C ABI
//! instead, so an embedding VM gets the same table with hashing, equality,
//! and reference counting supplied through function pointers rather than
//! Rust trait impls.
//!
//! ```
//! use strudel::StHashMap;
//!
//! let mut map = StHashMap::new();
//! map.insert("a", 1).unwrap();
//! map.insert("b", 2).unwrap();
//! assert_eq!(map.get(&"a").unwrap(), Some(&1));
//! assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec!["a", "b"]);
//! ```

#![allow(non_camel_case_types)]

#[cfg(feature = "capi")]
pub mod capi;
mod control;
mod entry;
mod error;
mod fnv;
mod hasher;
mod hooks;
mod iter;
mod probe;
mod st_hashmap;
mod table;
mod typedefs;

pub use entry::{Entry, OccupiedEntry, VacantEntry};
pub use error::TableError;
pub use hasher::{st_hash_t, st_hash_type, StBuildHasher, StHasher};
pub use hooks::{HostHooks, StdHooks};
pub use iter::{IntoIter, Iter, Keys, Values};
pub use st_hashmap::StHashMap;
pub use table::RawTable;
pub use typedefs::{st_data_t, st_foreach_callback_func, st_index_t, st_retval, st_update_callback_func};
