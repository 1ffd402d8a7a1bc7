//! Node arena with stable keys.
//!
//! The arena owns every node of a queue. Trees never own each other's nodes;
//! they coordinate arena keys, the same split between storage and structure
//! that lets a node be unlinked from one tree and relinked into another
//! without reallocating.
//!
//! Keys stay valid until the value is removed. Removed slots are reused by
//! later inserts, which is why the queue pairs keys with a stamp before
//! handing them out.

use core::ops::{Index, IndexMut};

use slab::Slab;

use crate::node::{EventKey, Node};

/// Growable slab storage addressed by `usize` keys.
///
/// Growth goes through the global allocator; allocation failure aborts.
#[derive(Debug)]
pub struct Arena<T> {
    slots: Slab<T>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    /// Creates an empty arena.
    #[inline]
    pub(crate) const fn new() -> Self {
        Self { slots: Slab::new() }
    }

    /// Creates an arena with room for `capacity` values before growing.
    #[inline]
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Slab::with_capacity(capacity),
        }
    }

    /// Returns the number of occupied slots.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if no slots are occupied.
    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Inserts a value, returning its stable key.
    #[inline]
    pub(crate) fn insert(&mut self, value: T) -> usize {
        self.slots.insert(value)
    }

    /// Removes and returns the value at `key`.
    ///
    /// # Panics
    ///
    /// Panics if `key` is vacant.
    #[inline]
    pub(crate) fn take(&mut self, key: usize) -> T {
        self.slots.remove(key)
    }

    /// Returns a reference to the value at `key`, if present.
    #[inline]
    pub(crate) fn get(&self, key: usize) -> Option<&T> {
        self.slots.get(key)
    }

    /// Drops every value and releases all slots in one step.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
    }
}

impl<P> Arena<Node<P>> {
    /// Ordering key of the node at `key`.
    ///
    /// # Panics
    ///
    /// Panics if `key` is vacant.
    #[inline]
    pub(crate) fn key_of(&self, key: usize) -> EventKey {
        self[key].key
    }
}

impl<T> Index<usize> for Arena<T> {
    type Output = T;

    /// # Panics
    ///
    /// Panics if `key` is vacant. Tree code only follows live links, so a
    /// panic here means a corrupted tree.
    #[inline]
    fn index(&self, key: usize) -> &T {
        &self.slots[key]
    }
}

impl<T> IndexMut<usize> for Arena<T> {
    #[inline]
    fn index_mut(&mut self, key: usize) -> &mut T {
        &mut self.slots[key]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_empty() {
        let arena: Arena<u64> = Arena::new();
        assert!(arena.is_empty());
        assert_eq!(arena.len(), 0);
    }

    #[test]
    fn with_capacity_starts_empty() {
        let arena: Arena<u64> = Arena::with_capacity(100);
        assert!(arena.is_empty());
    }

    #[test]
    fn insert_get_remove() {
        let mut arena: Arena<u64> = Arena::new();

        let key = arena.insert(42);
        assert_eq!(arena.len(), 1);
        assert_eq!(arena.get(key), Some(&42));
        assert_eq!(arena[key], 42);

        assert_eq!(arena.take(key), 42);
        assert_eq!(arena.get(key), None);
        assert!(arena.is_empty());
    }

    #[test]
    fn index_mut_updates() {
        let mut arena: Arena<u64> = Arena::new();
        let key = arena.insert(10);
        arena[key] = 20;
        assert_eq!(arena.get(key), Some(&20));
    }

    #[test]
    fn slot_reuse() {
        let mut arena: Arena<u64> = Arena::new();

        let k0 = arena.insert(0);
        let _k1 = arena.insert(1);
        arena.take(k0);

        let k2 = arena.insert(2);
        assert_eq!(k2, k0);
    }

    #[test]
    #[should_panic]
    fn double_take_panics() {
        let mut arena: Arena<u64> = Arena::new();
        let key = arena.insert(42);
        arena.take(key);
        arena.take(key);
    }

    #[test]
    #[should_panic]
    fn index_vacant_panics() {
        let mut arena: Arena<u64> = Arena::new();
        let key = arena.insert(1);
        arena.take(key);
        let _ = arena[key];
    }

    #[test]
    fn clear_drops_values() {
        use std::rc::Rc;

        let shared = Rc::new(());
        let mut arena: Arena<Rc<()>> = Arena::new();
        for _ in 0..3 {
            arena.insert(Rc::clone(&shared));
        }
        assert_eq!(Rc::strong_count(&shared), 4);

        arena.clear();
        assert!(arena.is_empty());
        assert_eq!(Rc::strong_count(&shared), 1);
    }
}
