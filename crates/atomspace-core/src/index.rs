//! # Index Layer
//!
//! The three indices the store keeps in step with its atom table:
//!
//! - [`TypeIndex`]: exact type → handles
//! - [`ContentIndex`]: structural hash → candidate handles (dedup lookup)
//! - [`IncomingIndex`]: handle → links whose outgoing set contains it
//!
//! The indices only record relations between handles. They never own atoms;
//! the store mutates all of them inside one write critical section.

use crate::types::{Handle, TypeId};
use std::collections::{BTreeMap, BTreeSet, HashMap};

// =============================================================================
// TYPE INDEX
// =============================================================================

/// Handles bucketed by their exact type.
#[derive(Debug, Clone, Default)]
pub struct TypeIndex {
    buckets: BTreeMap<TypeId, BTreeSet<Handle>>,
}

impl TypeIndex {
    pub fn insert(&mut self, ty: TypeId, handle: Handle) {
        self.buckets.entry(ty).or_default().insert(handle);
    }

    pub fn remove(&mut self, ty: TypeId, handle: Handle) {
        if let Some(bucket) = self.buckets.get_mut(&ty) {
            bucket.remove(&handle);
            if bucket.is_empty() {
                self.buckets.remove(&ty);
            }
        }
    }

    /// Handles of exactly this type, ascending.
    #[must_use]
    pub fn exact(&self, ty: TypeId) -> Option<&BTreeSet<Handle>> {
        self.buckets.get(&ty)
    }

    /// Number of atoms of exactly this type.
    #[must_use]
    pub fn count(&self, ty: TypeId) -> usize {
        self.buckets.get(&ty).map_or(0, BTreeSet::len)
    }

    /// Union of the buckets of `types`, ascending.
    #[must_use]
    pub fn union(&self, types: &[TypeId]) -> Vec<Handle> {
        let mut merged = BTreeSet::new();
        for ty in types {
            if let Some(bucket) = self.buckets.get(ty) {
                merged.extend(bucket.iter().copied());
            }
        }
        merged.into_iter().collect()
    }

    #[must_use]
    pub fn contains(&self, ty: TypeId, handle: Handle) -> bool {
        self.buckets.get(&ty).is_some_and(|b| b.contains(&handle))
    }

    /// Non-empty buckets in type order.
    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &BTreeSet<Handle>)> {
        self.buckets.iter().map(|(t, b)| (*t, b))
    }
}

// =============================================================================
// CONTENT INDEX
// =============================================================================

/// Structural hash → handles whose key hashes to it.
///
/// Collisions are expected to be rare; callers resolve them with a full key
/// comparison. Never iterated in order, so a hash map keeps lookups O(1).
#[derive(Debug, Clone, Default)]
pub struct ContentIndex {
    buckets: HashMap<u64, Vec<Handle>>,
}

impl ContentIndex {
    pub fn insert(&mut self, hash: u64, handle: Handle) {
        let bucket = self.buckets.entry(hash).or_default();
        if !bucket.contains(&handle) {
            bucket.push(handle);
        }
    }

    pub fn remove(&mut self, hash: u64, handle: Handle) {
        if let Some(bucket) = self.buckets.get_mut(&hash) {
            bucket.retain(|h| *h != handle);
            if bucket.is_empty() {
                self.buckets.remove(&hash);
            }
        }
    }

    /// Candidate handles for a hash. Empty if none.
    #[must_use]
    pub fn candidates(&self, hash: u64) -> &[Handle] {
        self.buckets.get(&hash).map_or(&[], Vec::as_slice)
    }

    /// Total number of indexed handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

// =============================================================================
// INCOMING INDEX
// =============================================================================

/// Back-reference table: atom → links that contain it.
///
/// Every stored atom has an entry (possibly empty), so a missing entry means
/// the handle is unknown.
#[derive(Debug, Clone, Default)]
pub struct IncomingIndex {
    sets: BTreeMap<Handle, BTreeSet<Handle>>,
}

impl IncomingIndex {
    /// Start tracking a newly stored atom.
    pub fn register(&mut self, handle: Handle) {
        self.sets.entry(handle).or_default();
    }

    /// Stop tracking a removed atom.
    pub fn unregister(&mut self, handle: Handle) {
        self.sets.remove(&handle);
    }

    /// Record `link` as referencing each member of `outgoing`.
    pub fn add_link(&mut self, link: Handle, outgoing: &[Handle]) {
        for member in outgoing {
            self.sets.entry(*member).or_default().insert(link);
        }
    }

    /// Drop `link` from each member's incoming set.
    pub fn remove_link(&mut self, link: Handle, outgoing: &[Handle]) {
        for member in outgoing {
            if let Some(set) = self.sets.get_mut(member) {
                set.remove(&link);
            }
        }
    }

    /// Links referencing `handle`, ascending. `None` if the handle is unknown.
    #[must_use]
    pub fn incoming(&self, handle: Handle) -> Option<&BTreeSet<Handle>> {
        self.sets.get(&handle)
    }

    /// Size of the incoming set, 0 for unknown handles.
    #[must_use]
    pub fn degree(&self, handle: Handle) -> usize {
        self.sets.get(&handle).map_or(0, BTreeSet::len)
    }

    /// Number of tracked atoms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle, &BTreeSet<Handle>)> {
        self.sets.iter().map(|(h, s)| (*h, s))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_index_drops_empty_buckets() {
        let mut index = TypeIndex::default();
        index.insert(TypeId(5), Handle(1));
        assert!(index.contains(TypeId(5), Handle(1)));
        index.remove(TypeId(5), Handle(1));
        assert!(index.exact(TypeId(5)).is_none());
        assert_eq!(index.count(TypeId(5)), 0);
    }

    #[test]
    fn type_index_union_is_sorted() {
        let mut index = TypeIndex::default();
        index.insert(TypeId(5), Handle(4));
        index.insert(TypeId(6), Handle(2));
        index.insert(TypeId(5), Handle(1));
        let all = index.union(&[TypeId(5), TypeId(6)]);
        assert_eq!(all, vec![Handle(1), Handle(2), Handle(4)]);
    }

    #[test]
    fn content_index_keeps_collisions() {
        let mut index = ContentIndex::default();
        index.insert(42, Handle(1));
        index.insert(42, Handle(2));
        index.insert(42, Handle(2));
        assert_eq!(index.candidates(42), &[Handle(1), Handle(2)]);
        index.remove(42, Handle(1));
        assert_eq!(index.candidates(42), &[Handle(2)]);
        index.remove(42, Handle(2));
        assert!(index.is_empty());
    }

    #[test]
    fn content_index_finds_each_of_many_hashes() {
        let mut index = ContentIndex::default();
        for i in 0..10_000u64 {
            index.insert(i.wrapping_mul(0x9e37_79b9_7f4a_7c15), Handle(i));
        }
        assert_eq!(index.len(), 10_000);
        assert_eq!(
            index.candidates(777u64.wrapping_mul(0x9e37_79b9_7f4a_7c15)),
            &[Handle(777)]
        );
        assert!(index.candidates(1).is_empty());
    }

    #[test]
    fn incoming_distinguishes_unknown_from_empty() {
        let mut index = IncomingIndex::default();
        index.register(Handle(1));
        assert_eq!(index.incoming(Handle(1)).map(BTreeSet::len), Some(0));
        assert!(index.incoming(Handle(2)).is_none());
    }

    #[test]
    fn incoming_tracks_links() {
        let mut index = IncomingIndex::default();
        index.register(Handle(1));
        index.register(Handle(2));
        index.register(Handle(3));
        index.add_link(Handle(3), &[Handle(1), Handle(2), Handle(1)]);
        assert_eq!(index.degree(Handle(1)), 1);
        assert_eq!(index.degree(Handle(2)), 1);

        index.remove_link(Handle(3), &[Handle(1), Handle(2), Handle(1)]);
        assert_eq!(index.degree(Handle(1)), 0);
        assert_eq!(index.degree(Handle(2)), 0);
    }
}
