//! Per-build entry storage addressed by content id.

use std::collections::HashMap;

use super::Entry;
use crate::crypto::hash::Hash;
use crate::encoding::SerializationError;

/// Owns every entry created while mapping one transaction.
///
/// Entries live in insertion order in a `Vec`; the map is only an index from
/// id to slot. Links between entries are ids, so there are no references to
/// keep alive and nothing can form a cycle. Dropping the arena discards the
/// whole graph.
#[derive(Debug, Default)]
pub struct EntryArena {
    entries: Vec<Entry>,
    index: HashMap<Hash, usize>,
}

impl EntryArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash `entry`, store it, and return its id.
    ///
    /// Re-inserting identical content returns the existing id and keeps the
    /// first copy.
    pub fn insert(&mut self, entry: Entry) -> Result<Hash, SerializationError> {
        let id = entry.id()?;
        if !self.index.contains_key(&id) {
            self.index.insert(id, self.entries.len());
            self.entries.push(entry);
        }
        Ok(id)
    }

    pub fn get(&self, id: &Hash) -> Option<&Entry> {
        self.index.get(id).map(|&slot| &self.entries[slot])
    }

    /// Mutable access for non-hashed bookkeeping fields.
    pub fn get_mut(&mut self, id: &Hash) -> Option<&mut Entry> {
        match self.index.get(id) {
            Some(&slot) => self.entries.get_mut(slot),
            None => None,
        }
    }

    pub fn contains(&self, id: &Hash) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{Retirement, ValueSource};
    use crate::entry::types::AssetAmount;
    use crate::crypto::hash::AssetId;

    fn retirement(ordinal: u64) -> Entry {
        Entry::Retirement(Retirement {
            source: ValueSource::new(
                Hash::new([3; 32]),
                AssetAmount::new(AssetId::new([0xff; 32]), 1),
                ordinal,
            ),
            ordinal,
        })
    }

    #[test]
    fn insert_returns_content_id() {
        let mut arena = EntryArena::new();
        let entry = retirement(0);
        let expected = entry.id().unwrap();
        let id = arena.insert(entry.clone()).unwrap();
        assert_eq!(id, expected);
        assert_eq!(arena.get(&id), Some(&entry));
    }

    #[test]
    fn duplicate_content_is_stored_once() {
        let mut arena = EntryArena::new();
        let a = arena.insert(retirement(0)).unwrap();
        let b = arena.insert(retirement(0)).unwrap();
        assert_eq!(a, b);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn iteration_follows_insertion_order() {
        let mut arena = EntryArena::new();
        let first = arena.insert(retirement(5)).unwrap();
        let second = arena.insert(retirement(1)).unwrap();
        let ids: Vec<Hash> = arena.iter().map(|e| e.id().unwrap()).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[test]
    fn unknown_id_is_absent() {
        let mut arena = EntryArena::new();
        assert!(arena.get(&Hash::new([0; 32])).is_none());
        assert!(arena.get_mut(&Hash::new([0; 32])).is_none());
        assert!(arena.is_empty());
    }
}
