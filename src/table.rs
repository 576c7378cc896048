//! The raw Swiss Table engine: control bytes, entry storage, and the
//! insertion-order list, generic over `K, V` and driven by an explicit
//! [`HostHooks`] argument per call.
//!
//! `RawTable` knows nothing about `Hash`/`Eq`/C-ABI callbacks; every
//! operation that needs to hash or compare keys takes `&impl HostHooks<K, V>`
//! so the same monomorphized engine backs both the native [`crate::StHashMap`]
//! and the capi module's `st_table`.

use crate::control::{h2, Group, EMPTY, GROUP_SIZE, TOMBSTONE};
use crate::error::TableError;
use crate::hooks::HostHooks;
use crate::probe::ProbeSeq;

/// Sentinel `prev`/`next` value meaning "no slot".
pub(crate) const NIL: usize = usize::MAX;

/// Smallest capacity a table is ever allocated at.
const MIN_CAPACITY: usize = 16;

#[derive(Debug)]
struct Slot<K, V> {
    key: Option<K>,
    value: Option<V>,
    hash: u64,
    prev: usize,
    next: usize,
}

impl<K, V> Slot<K, V> {
    fn empty() -> Self {
        Self {
            key: None,
            value: None,
            hash: 0,
            prev: NIL,
            next: NIL,
        }
    }
}

/// Where a key was found (or where it would go) while probing.
pub(crate) enum Located {
    Occupied(usize),
    Vacant,
}

/// The control-byte array, entry array, and insertion-order list.
#[derive(Debug)]
pub struct RawTable<K, V> {
    ctrl: Vec<u8>,
    slots: Vec<Slot<K, V>>,
    capacity: usize,
    used: usize,
    tombstones: usize,
    version: u64,
    head: usize,
    tail: usize,
}

impl<K, V> Default for RawTable<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> RawTable<K, V> {
    /// An empty table at the minimum capacity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ctrl: vec![EMPTY; MIN_CAPACITY],
            slots: {
                let mut slots = Vec::with_capacity(MIN_CAPACITY);
                slots.resize_with(MIN_CAPACITY, Slot::empty);
                slots
            },
            capacity: MIN_CAPACITY,
            used: 0,
            tombstones: 0,
            version: 0,
            head: NIL,
            tail: NIL,
        }
    }

    /// An empty table sized to hold at least `capacity_hint` entries without
    /// triggering growth. Used by `st_init_table_with_size` and
    /// `StHashMap::with_capacity`.
    #[must_use]
    pub fn with_capacity(capacity_hint: usize) -> Self {
        let capacity = Self::next_capacity(capacity_hint);
        Self {
            ctrl: vec![EMPTY; capacity],
            slots: {
                let mut slots = Vec::with_capacity(capacity);
                slots.resize_with(capacity, Slot::empty);
                slots
            },
            capacity,
            used: 0,
            tombstones: 0,
            version: 0,
            head: NIL,
            tail: NIL,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.used
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.used == 0
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Approximate bytes held by the control-byte and entry arrays, for a
    /// host's `st_memsize`-style introspection. Does not include whatever
    /// `K`/`V` themselves own on the heap.
    #[must_use]
    pub fn allocated_bytes(&self) -> usize {
        self.ctrl.len() + self.slots.len() * core::mem::size_of::<Slot<K, V>>()
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn head(&self) -> usize {
        self.head
    }

    pub(crate) fn tail(&self) -> usize {
        self.tail
    }

    pub(crate) fn slot_next(&self, index: usize) -> usize {
        self.slots[index].next
    }

    pub(crate) fn slot_prev(&self, index: usize) -> usize {
        self.slots[index].prev
    }

    pub(crate) fn slot_key(&self, index: usize) -> &K {
        self.slots[index]
            .key
            .as_ref()
            .expect("iterator cursor always names an occupied slot")
    }

    pub(crate) fn slot_value(&self, index: usize) -> &V {
        self.slots[index]
            .value
            .as_ref()
            .expect("iterator cursor always names an occupied slot")
    }

    pub(crate) fn slot_value_mut(&mut self, index: usize) -> &mut V {
        self.slots[index]
            .value
            .as_mut()
            .expect("iterator cursor always names an occupied slot")
    }

    /// Walk the probe sequence for `hash`, looking for `key` and, failing
    /// that, the first slot available for insertion.
    ///
    /// Mirrors §4.3's lookup and §4.4's "remember the first available slot"
    /// step in one pass, since insert needs both.
    fn locate<H>(&self, hooks: &H, key: &K, hash: u64) -> Result<(Option<usize>, Option<usize>), TableError>
    where
        H: HostHooks<K, V>,
    {
        let groups = self.capacity / GROUP_SIZE;
        let needle = h2(hash);
        let mut first_available = None;

        for group_index in ProbeSeq::new(hash, groups) {
            let offset = group_index * GROUP_SIZE;
            let group = Group::load(&self.ctrl, offset);

            for bit in group.match_byte(needle) {
                let index = offset + bit;
                let slot = &self.slots[index];
                if slot.hash == hash {
                    if let Some(existing) = slot.key.as_ref() {
                        if hooks.eq(existing, key)? {
                            return Ok((Some(index), first_available));
                        }
                    }
                }
            }

            if first_available.is_none() {
                if let Some(bit) = group.match_available().lowest_set_bit() {
                    first_available = Some(offset + bit);
                }
            }

            if !group.match_empty().is_empty() {
                break;
            }
        }

        Ok((None, first_available))
    }

    /// Look up `key`, returning whichever slot (if any) currently holds it.
    pub(crate) fn find<H>(&self, hooks: &H, key: &K) -> Result<Located, TableError>
    where
        H: HostHooks<K, V>,
    {
        let hash = hooks.hash(key)?;
        match self.locate(hooks, key, hash)?.0 {
            Some(index) => Ok(Located::Occupied(index)),
            None => Ok(Located::Vacant),
        }
    }

    pub fn get<H>(&self, hooks: &H, key: &K) -> Result<Option<&V>, TableError>
    where
        H: HostHooks<K, V>,
    {
        let hash = hooks.hash(key)?;
        let (found, _) = self.locate(hooks, key, hash)?;
        Ok(found.map(|index| self.slot_value(index)))
    }

    pub fn get_mut<H>(&mut self, hooks: &H, key: &K) -> Result<Option<&mut V>, TableError>
    where
        H: HostHooks<K, V>,
    {
        let hash = hooks.hash(key)?;
        let (found, _) = self.locate(hooks, key, hash)?;
        Ok(found.map(move |index| self.slot_value_mut(index)))
    }

    pub fn contains_key<H>(&self, hooks: &H, key: &K) -> Result<bool, TableError>
    where
        H: HostHooks<K, V>,
    {
        Ok(matches!(self.find(hooks, key)?, Located::Occupied(_)))
    }

    /// Insert or update, returning the slot index that now holds `key` and
    /// the previous value if one was overwritten. §4.4.
    pub(crate) fn insert_raw<H>(
        &mut self,
        hooks: &H,
        key: K,
        value: V,
    ) -> Result<(usize, Option<V>), TableError>
    where
        H: HostHooks<K, V>,
    {
        let hash = hooks.hash(&key)?;

        if (self.used + 1) * 8 > self.capacity * 7 {
            let new_capacity = Self::next_capacity(self.used + 1);
            self.grow(new_capacity)?;
        }

        let (found, available) = self.locate(hooks, &key, hash)?;

        if let Some(index) = found {
            hooks.release_value(
                self.slots[index]
                    .value
                    .as_ref()
                    .expect("occupied slot has a value"),
            );
            hooks.acquire_value(&value);
            let old = self.slots[index].value.replace(value);
            self.version += 1;
            return Ok((index, old));
        }

        let index = available.expect("load-factor invariant guarantees an available slot after growth");
        let was_tombstone = self.ctrl[index] == TOMBSTONE;

        hooks.acquire_key(&key);
        hooks.acquire_value(&value);

        self.ctrl[index] = h2(hash);
        self.slots[index] = Slot {
            key: Some(key),
            value: Some(value),
            hash,
            prev: NIL,
            next: NIL,
        };
        self.link_tail(index);

        if was_tombstone {
            self.tombstones -= 1;
        }
        self.used += 1;
        self.version += 1;

        Ok((index, None))
    }

    pub fn insert<H>(&mut self, hooks: &H, key: K, value: V) -> Result<Option<V>, TableError>
    where
        H: HostHooks<K, V>,
    {
        self.insert_raw(hooks, key, value).map(|(_, old)| old)
    }

    /// Replace the value of an already-located occupied slot. Used by
    /// `OccupiedEntry::insert`, which has already paid for the lookup.
    pub(crate) fn replace_value<H>(&mut self, hooks: &H, index: usize, value: V) -> V
    where
        H: HostHooks<K, V>,
    {
        hooks.release_value(self.slots[index].value.as_ref().expect("occupied slot has a value"));
        hooks.acquire_value(&value);
        self.version += 1;
        self.slots[index].value.replace(value).expect("occupied slot has a value")
    }

    /// Remove the entry for `key`. §4.5.
    pub fn remove<H>(&mut self, hooks: &H, key: &K) -> Result<(K, V), TableError>
    where
        H: HostHooks<K, V>,
        K: core::fmt::Debug,
    {
        let hash = hooks.hash(key)?;
        let index = match self.locate(hooks, key, hash)?.0 {
            Some(index) => index,
            None => return Err(TableError::not_found(key)),
        };
        Ok(self.remove_at(hooks, index))
    }

    pub(crate) fn remove_at<H>(&mut self, hooks: &H, index: usize) -> (K, V)
    where
        H: HostHooks<K, V>,
    {
        self.unlink(index);

        let slot = &mut self.slots[index];
        let key = slot.key.take().expect("occupied slot has a key");
        let value = slot.value.take().expect("occupied slot has a value");

        hooks.release_key(&key);
        hooks.release_value(&value);

        let group_offset = (index / GROUP_SIZE) * GROUP_SIZE;
        let group = Group::load(&self.ctrl, group_offset);
        if group.match_empty().is_empty() {
            self.ctrl[index] = TOMBSTONE;
            self.tombstones += 1;
        } else {
            self.ctrl[index] = EMPTY;
        }

        self.used -= 1;
        self.version += 1;

        if self.used == 0 && self.capacity > MIN_CAPACITY {
            // A table that has been fully emptied has no occupied slots to
            // preserve the order of, so there is no reason to keep it sized
            // for whatever peak occupancy it once held. Allocation failure
            // here just leaves the table at its current (oversized but
            // still correct) capacity.
            let _ = self.shrink_to_minimum();
        } else if self.used * 2 < self.capacity && self.tombstones > self.capacity / 4 {
            // Allocation failure here is not fatal to the remove that already
            // happened; the table merely keeps its tombstones for now and
            // will retry the rehash on the next qualifying delete.
            let _ = self.rehash_in_place();
        }

        (key, value)
    }

    /// Release every live key/value share in insertion order, leaving the
    /// table empty but still allocated. Called by an owning map's `Drop`
    /// impl before its backing arrays are dropped, so a C-ABI host's
    /// `release` callback fires exactly once per occupied slot.
    pub(crate) fn drain_release<H>(&mut self, hooks: &H)
    where
        H: HostHooks<K, V>,
    {
        let mut cursor = self.head;
        while cursor != NIL {
            let next = self.slots[cursor].next;
            if let Some(key) = self.slots[cursor].key.take() {
                hooks.release_key(&key);
            }
            if let Some(value) = self.slots[cursor].value.take() {
                hooks.release_value(&value);
            }
            cursor = next;
        }
        self.head = NIL;
        self.tail = NIL;
        self.used = 0;
    }

    /// Consume the table, returning its entries in insertion order. Used by
    /// `StHashMap::into_iter`, which owns its hooks separately and releases
    /// them without going through the engine.
    pub(crate) fn into_entries(mut self) -> Vec<(K, V)> {
        let mut entries = Vec::with_capacity(self.used);
        let mut cursor = self.head;
        while cursor != NIL {
            let next = self.slots[cursor].next;
            let key = self.slots[cursor].key.take().expect("insertion-order list names only occupied slots");
            let value = self.slots[cursor].value.take().expect("insertion-order list names only occupied slots");
            entries.push((key, value));
            cursor = next;
        }
        entries
    }

    fn link_tail(&mut self, index: usize) {
        self.slots[index].prev = self.tail;
        self.slots[index].next = NIL;
        if self.tail == NIL {
            self.head = index;
        } else {
            self.slots[self.tail].next = index;
        }
        self.tail = index;
    }

    fn unlink(&mut self, index: usize) {
        let prev = self.slots[index].prev;
        let next = self.slots[index].next;
        if prev == NIL {
            self.head = next;
        } else {
            self.slots[prev].next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            self.slots[next].prev = prev;
        }
    }

    fn next_capacity(min_used: usize) -> usize {
        min_used.saturating_mul(2).max(MIN_CAPACITY).next_power_of_two()
    }

    fn grow(&mut self, new_capacity: usize) -> Result<(), TableError> {
        self.migrate(new_capacity, "load-factor")
    }

    fn rehash_in_place(&mut self) -> Result<(), TableError> {
        let capacity = self.capacity;
        self.migrate(capacity, "tombstone-ratio")
    }

    /// Reclaim a fully emptied table's backing storage down to
    /// [`MIN_CAPACITY`], rather than leaving it sized for whatever peak
    /// occupancy it once held.
    fn shrink_to_minimum(&mut self) -> Result<(), TableError> {
        self.migrate(MIN_CAPACITY, "empty-shrink")
    }

    /// Allocate-new, reinsert-all, free-old. §4.6.
    fn migrate(&mut self, new_capacity: usize, trigger: &'static str) -> Result<(), TableError> {
        let mut new_ctrl: Vec<u8> = Vec::new();
        new_ctrl
            .try_reserve_exact(new_capacity)
            .map_err(|_| TableError::OutOfMemory)?;
        new_ctrl.resize(new_capacity, EMPTY);

        let mut new_slots: Vec<Slot<K, V>> = Vec::new();
        new_slots
            .try_reserve_exact(new_capacity)
            .map_err(|_| TableError::OutOfMemory)?;
        new_slots.resize_with(new_capacity, Slot::empty);

        let groups = new_capacity / GROUP_SIZE;
        let mut new_head = NIL;
        let mut new_tail = NIL;

        let mut cursor = self.head;
        while cursor != NIL {
            let next_cursor = self.slots[cursor].next;
            let hash = self.slots[cursor].hash;
            let key = self.slots[cursor]
                .key
                .take()
                .expect("insertion-order list names only occupied slots");
            let value = self.slots[cursor]
                .value
                .take()
                .expect("insertion-order list names only occupied slots");

            let mut target = None;
            for group_index in ProbeSeq::new(hash, groups) {
                let offset = group_index * GROUP_SIZE;
                let group = Group::load(&new_ctrl, offset);
                if let Some(bit) = group.match_available().lowest_set_bit() {
                    target = Some(offset + bit);
                    break;
                }
            }
            let index = target.expect("a freshly sized table always has room for its own entries");

            new_ctrl[index] = h2(hash);
            new_slots[index] = Slot {
                key: Some(key),
                value: Some(value),
                hash,
                prev: new_tail,
                next: NIL,
            };
            if new_tail == NIL {
                new_head = index;
            } else {
                new_slots[new_tail].next = index;
            }
            new_tail = index;

            cursor = next_cursor;
        }

        let old_capacity = self.capacity;
        let old_tombstones = self.tombstones;

        self.ctrl = new_ctrl;
        self.slots = new_slots;
        self.capacity = new_capacity;
        self.head = new_head;
        self.tail = new_tail;
        self.tombstones = 0;
        self.version += 1;

        log::debug!(
            target: "strudel::table",
            "{trigger}: capacity {old_capacity} -> {new_capacity}, used {}, tombstones {old_tombstones} -> 0",
            self.used,
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::StdHooks;
    use std::collections::hash_map::RandomState;

    fn hooks() -> StdHooks<RandomState> {
        StdHooks::new(RandomState::new())
    }

    #[test]
    fn empty_table_reports_not_found() {
        let table = RawTable::<&str, i32>::new();
        let hooks = hooks();
        assert_eq!(table.len(), 0);
        assert!(table.get(&hooks, &"a").unwrap().is_none());
    }

    #[test]
    fn insert_then_get() {
        let mut table = RawTable::new();
        let hooks = hooks();
        table.insert(&hooks, "a", 1).unwrap();
        table.insert(&hooks, "b", 2).unwrap();
        assert_eq!(table.get(&hooks, &"a").unwrap(), Some(&1));
        assert_eq!(table.get(&hooks, &"b").unwrap(), Some(&2));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn overwrite_does_not_change_insertion_position() {
        let mut table = RawTable::new();
        let hooks = hooks();
        table.insert(&hooks, "a", 1).unwrap();
        table.insert(&hooks, "b", 2).unwrap();
        table.insert(&hooks, "c", 3).unwrap();
        let old = table.insert(&hooks, "b", 20).unwrap();
        assert_eq!(old, Some(2));

        let mut collected = Vec::new();
        let mut cursor = table.head();
        while cursor != NIL {
            collected.push((*table.slot_key(cursor), *table.slot_value(cursor)));
            cursor = table.slot_next(cursor);
        }
        assert_eq!(collected, vec![("a", 1), ("b", 20), ("c", 3)]);
    }

    #[test]
    fn delete_then_lookup_reports_not_found() {
        let mut table = RawTable::new();
        let hooks = hooks();
        table.insert(&hooks, "a", 1).unwrap();
        let (key, value) = table.remove(&hooks, &"a").unwrap();
        assert_eq!((key, value), ("a", 1));
        assert!(table.get(&hooks, &"a").unwrap().is_none());
        assert_eq!(table.len(), 0);
        assert!(table.remove(&hooks, &"a").is_err());
    }

    #[test]
    fn grows_past_seven_eighths_load_factor() {
        let mut table = RawTable::new();
        let hooks = hooks();
        for i in 0..1000 {
            table.insert(&hooks, i, i * i).unwrap();
        }
        assert_eq!(table.len(), 1000);
        assert!(table.capacity().is_power_of_two());
        assert!((table.len() as u64) * 8 <= (table.capacity() as u64) * 7);
        for i in 0..1000 {
            assert_eq!(table.get(&hooks, &i).unwrap(), Some(&(i * i)));
        }
    }

    #[test]
    fn insertion_order_survives_growth() {
        let mut table = RawTable::new();
        let hooks = hooks();
        for i in 0..100 {
            table.insert(&hooks, i, i * i).unwrap();
        }
        let mut collected = Vec::new();
        let mut cursor = table.head();
        while cursor != NIL {
            collected.push(*table.slot_key(cursor));
            cursor = table.slot_next(cursor);
        }
        assert_eq!(collected, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn deleting_even_keys_preserves_odd_order() {
        let mut table = RawTable::new();
        let hooks = hooks();
        for i in 0..1000 {
            table.insert(&hooks, i, i).unwrap();
        }
        for i in (0..1000).step_by(2) {
            table.remove(&hooks, &i).unwrap();
        }
        assert_eq!(table.len(), 500);
        assert_eq!(table.get(&hooks, &501).unwrap(), Some(&501));

        let mut collected = Vec::new();
        let mut cursor = table.head();
        while cursor != NIL {
            collected.push(*table.slot_key(cursor));
            cursor = table.slot_next(cursor);
        }
        assert_eq!(collected, (1..1000).step_by(2).collect::<Vec<_>>());
    }

    #[test]
    fn tombstone_heavy_delete_triggers_in_place_rehash() {
        let mut table = RawTable::new();
        let hooks = hooks();
        for i in 0..200 {
            table.insert(&hooks, i, i).unwrap();
        }
        let capacity_before = table.capacity();
        for i in 0..190 {
            table.remove(&hooks, &i).unwrap();
        }
        assert_eq!(table.capacity(), capacity_before);
        assert_eq!(table.len(), 10);
    }

    #[test]
    fn mass_insert_then_delete_all_then_reinsert() {
        let mut table = RawTable::new();
        let hooks = hooks();
        for i in 0..10_000 {
            table.insert(&hooks, i, i).unwrap();
        }
        for i in 0..10_000 {
            table.remove(&hooks, &i).unwrap();
        }
        assert_eq!(table.len(), 0);
        table.insert(&hooks, -1, 42).unwrap();
        assert_eq!(table.get(&hooks, &-1).unwrap(), Some(&42));
        // Scenario 5's capacity bound: a single-entry table after a mass
        // delete-all must not still be sized for the 10,000 entries it used
        // to hold. Emptying the table all the way to `used == 0` triggers
        // `shrink_to_minimum`, so the one reinserted key only grows the
        // table back up from `MIN_CAPACITY`, never from the old 10,000-entry
        // capacity.
        assert!(table.capacity() <= 4 * MIN_CAPACITY);
    }

    #[test]
    fn drain_release_empties_the_table() {
        let mut table = RawTable::new();
        let hooks = hooks();
        for i in 0..10 {
            table.insert(&hooks, i, i).unwrap();
        }
        table.drain_release(&hooks);
        assert_eq!(table.len(), 0);
        assert_eq!(table.head(), NIL);
        assert_eq!(table.tail(), NIL);
    }
}
