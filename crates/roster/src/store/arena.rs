//! Per-kind record arena.
//!
//! Records live in append-only slots addressed by [`Handle`]s; a key index maps
//! keys to slots. Vacated slots are never reused, so the slot vector grows with
//! every insert until the next `clear()` (each reload starts from zero).

use std::collections::BTreeMap;

use crate::record::{Handle, Kind, Record, RecordKey, Subscribers};

/// A stored record with its subscriber list.
#[derive(Debug)]
pub(crate) struct Entry {
    pub(crate) record: Record,
    pub(crate) subscribers: Subscribers,
}

/// One collection of the store.
#[derive(Debug)]
pub(crate) struct Arena {
    kind: Kind,
    slots: Vec<Option<Entry>>,
    by_key: BTreeMap<RecordKey, usize>,
}

impl Arena {
    pub(crate) fn new(kind: Kind) -> Self {
        Self {
            kind,
            slots: Vec::new(),
            by_key: BTreeMap::new(),
        }
    }

    /// Insert a record into a fresh slot. Returns `None` if its key is already
    /// taken.
    pub(crate) fn insert(&mut self, record: Record) -> Option<Handle> {
        let key = record.key();
        if self.by_key.contains_key(&key) {
            return None;
        }
        let slot = self.slots.len();
        self.slots.push(Some(Entry {
            record,
            subscribers: Subscribers::new(),
        }));
        self.by_key.insert(key, slot);
        Some(self.handle(slot))
    }

    pub(crate) fn find(&self, key: &RecordKey) -> Option<Handle> {
        self.by_key.get(key).map(|&slot| self.handle(slot))
    }

    pub(crate) fn contains(&self, key: &RecordKey) -> bool {
        self.by_key.contains_key(key)
    }

    pub(crate) fn get(&self, slot: usize) -> Option<&Entry> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, slot: usize) -> Option<&mut Entry> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    /// Remove a record and its key.
    pub(crate) fn remove(&mut self, slot: usize) -> Option<Entry> {
        let entry = self.slots.get_mut(slot)?.take()?;
        self.by_key.remove(&entry.record.key());
        Some(entry)
    }

    /// Lift an entry out while keeping its key resolvable.
    pub(crate) fn take(&mut self, slot: usize) -> Option<Entry> {
        self.slots.get_mut(slot)?.take()
    }

    /// Put back an entry lifted with [`Arena::take`].
    pub(crate) fn restore(&mut self, slot: usize, entry: Entry) {
        if let Some(place) = self.slots.get_mut(slot) {
            *place = Some(entry);
        }
    }

    /// Live handles in key order.
    pub(crate) fn handles(&self) -> Vec<Handle> {
        self.by_key.values().map(|&slot| self.handle(slot)).collect()
    }

    /// Live entries in key order.
    pub(crate) fn entries(&self) -> impl Iterator<Item = &Entry> + '_ {
        self.by_key.values().filter_map(|&slot| self.get(slot))
    }

    pub(crate) fn len(&self) -> usize {
        self.by_key.len()
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.by_key.clear();
    }

    fn handle(&self, slot: usize) -> Handle {
        Handle {
            kind: self.kind,
            slot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Gender, Kerbal, Role};

    fn kerbal(name: &str) -> Record {
        Kerbal::new(name, Gender::Male, Role::Pilot).into()
    }

    #[test]
    fn test_insert_rejects_duplicate_key() {
        let mut arena = Arena::new(Kind::Kerbal);
        assert!(arena.insert(kerbal("Jeb")).is_some());
        assert!(arena.insert(kerbal("Jeb")).is_none());
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_slots_are_not_reused() {
        let mut arena = Arena::new(Kind::Kerbal);
        let first = arena.insert(kerbal("Jeb")).unwrap();
        arena.remove(first.slot).unwrap();
        let second = arena.insert(kerbal("Jeb")).unwrap();
        assert_ne!(first, second);
        assert!(arena.get(first.slot).is_none());
    }

    #[test]
    fn test_take_keeps_key_resolvable() {
        let mut arena = Arena::new(Kind::Kerbal);
        let handle = arena.insert(kerbal("Bill")).unwrap();
        let entry = arena.take(handle.slot).unwrap();
        assert_eq!(arena.find(&RecordKey::from("Bill")), Some(handle));
        assert!(arena.get(handle.slot).is_none());
        arena.restore(handle.slot, entry);
        assert!(arena.get(handle.slot).is_some());
    }

    #[test]
    fn test_handles_in_key_order() {
        let mut arena = Arena::new(Kind::Kerbal);
        arena.insert(kerbal("Val"));
        arena.insert(kerbal("Bob"));
        arena.insert(kerbal("Jeb"));
        let names: Vec<String> = arena
            .entries()
            .map(|entry| entry.record.key().to_string())
            .collect();
        assert_eq!(names, vec!["Bob", "Jeb", "Val"]);
        assert_eq!(arena.handles()[0].slot, 1);
    }
}
