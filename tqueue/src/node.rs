//! Queue nodes, ordering keys, and the public item handle.

use core::cmp::Ordering;

use crate::key::NIL;

/// Ordering key of a scheduled item.
///
/// Items order by `time`, then by `seq`. The queue hands out a fresh `seq`
/// on every insert and every move, so no two live items share a key and
/// items scheduled for the same instant come out in the order they were
/// scheduled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct EventKey {
    pub(crate) time: f64,
    pub(crate) seq: u64,
}

impl EventKey {
    #[inline]
    pub(crate) const fn new(time: f64, seq: u64) -> Self {
        Self { time, seq }
    }

    /// Returns `true` if `self` is delivered strictly before `other`.
    #[inline]
    pub(crate) fn precedes(&self, other: &Self) -> bool {
        self.cmp_key(other).is_lt()
    }

    /// Total order over keys.
    ///
    /// Times are never NaN inside a queue, so `partial_cmp` always answers.
    /// `f64::total_cmp` is not used because it puts `-0.0` before `0.0`,
    /// and the two must tie on time.
    #[inline]
    pub(crate) fn cmp_key(&self, other: &Self) -> Ordering {
        debug_assert!(!self.time.is_nan() && !other.time.is_nan());
        self.time
            .partial_cmp(&other.time)
            .unwrap_or(Ordering::Equal)
            .then(self.seq.cmp(&other.seq))
    }
}

/// Where a node lives.
///
/// `Primary` and `Fifo` pick the tree of the two-tree backend and mean the
/// same thing to single-tree backends. `Bin` nodes sit in the fixed-step
/// bin queue and never reach a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lane {
    /// Independently timed events.
    Primary,
    /// Events scheduled through `insert_fifo`.
    Fifo,
    /// Events scheduled through `enqueue_bin`.
    Bin,
}

/// A node in the queue's arena.
///
/// Links are arena keys with [`NIL`] for "none". `parent` is a plain back
/// reference and carries no ownership. Bin nodes reuse `left` and `right`
/// as the previous and next links of their bin.
#[derive(Debug)]
pub struct Node<P> {
    pub(crate) key: EventKey,
    pub(crate) stamp: u64,
    pub(crate) lane: Lane,
    pub(crate) left: usize,
    pub(crate) right: usize,
    pub(crate) parent: usize,
    /// Subtree weight for the weight-balanced tree, colour for the
    /// red-black tree, bin slot for bin nodes, unused by the splay trees.
    pub(crate) balance: u32,
    pub(crate) payload: P,
}

impl<P> Node<P> {
    pub(crate) fn new(key: EventKey, stamp: u64, lane: Lane, payload: P) -> Self {
        Self {
            key,
            stamp,
            lane,
            left: NIL,
            right: NIL,
            parent: NIL,
            balance: 0,
            payload,
        }
    }

    /// Clears all links, leaving the node detached.
    #[inline]
    pub(crate) fn detach(&mut self) {
        self.left = NIL;
        self.right = NIL;
        self.parent = NIL;
    }
}

/// Handle to one scheduled occurrence inside one queue.
///
/// Returned by [`TQueue::insert`](crate::TQueue::insert) and
/// [`TQueue::insert_fifo`](crate::TQueue::insert_fifo). A handle survives
/// moves of its item and is invalidated when the item is removed. Passing
/// an invalidated handle back to the queue panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Item {
    pub(crate) key: usize,
    pub(crate) stamp: u64,
}

impl Item {
    /// Arena slot of the item. Slots are reused after removal.
    #[inline]
    pub fn slot(&self) -> usize {
        self.key
    }
}
