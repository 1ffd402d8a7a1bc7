//! The time-ordered event queue.
//!
//! # Layout
//!
//! ```text
//!            TQueue
//!   ┌──────────────────────────┐
//!   │ least ──► node (detached)│
//!   │ backend ─► every other   │
//!   │ arena   ─► all nodes     │
//!   └──────────────────────────┘
//! ```
//!
//! The item with the smallest key is held outside the backend so that
//! peeking is a field read and the common "fire, then re-arm a little later"
//! pattern usually finishes without touching a tree. The backend only ever
//! sees the remaining items.
//!
//! Items scheduled through [`TQueue::enqueue_bin`] skip both and wait in a
//! fixed-step bin queue until the caller drains the current step.

use core::fmt;

use crate::backend::{Backend, SplayTree};
use crate::bin::BinQueue;
use crate::config::QueueConfig;
use crate::error::CheckError;
use crate::key::{Key, NIL};
use crate::node::{EventKey, Item, Lane, Node};
use crate::stats::{Counters, Stats};
use crate::storage::Arena;

/// A mutable priority queue of timed events.
///
/// Items order by delivery time; items at the same time come out in the
/// order they were scheduled or last moved. Only that order is guaranteed
/// for [`insert_fifo`](Self::insert_fifo); callers of
/// [`insert`](Self::insert) should treat tie order as unspecified.
///
/// The backend `B` is chosen per queue at compile time. All backends give
/// the same observable order and differ only in performance.
///
/// Under a fixed time step, events can instead go to the bin queue with
/// [`enqueue_bin`](Self::enqueue_bin). Bin items are delivered a whole step
/// at a time through [`dequeue_bin`](Self::dequeue_bin) and are invisible
/// to [`least`](Self::least), [`pop`](Self::pop) and [`find`](Self::find).
///
/// # Panics
///
/// Scheduling or moving to a NaN or infinite time panics, as does passing
/// an [`Item`] whose occurrence has already been removed.
///
/// # Example
///
/// ```
/// use tqueue::TQueue;
///
/// let mut queue: TQueue<&str> = TQueue::new();
/// queue.insert(5.0, "A");
/// queue.insert_fifo(3.0, "B");
/// queue.insert_fifo(3.0, "C");
///
/// assert_eq!(queue.least_t(), 3.0);
/// assert_eq!(queue.pop(), Some((3.0, "B")));
/// assert_eq!(queue.pop(), Some((3.0, "C")));
/// assert_eq!(queue.least_t(), 5.0);
/// ```
pub struct TQueue<P, B: Backend = SplayTree> {
    arena: Arena<Node<P>>,
    backend: B,
    bins: BinQueue,
    least: usize,
    next_seq: u64,
    next_stamp: u64,
    stats: Stats,
    verify: bool,
}

impl<P, B: Backend> Default for TQueue<P, B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, B: Backend> TQueue<P, B> {
    /// Creates an empty queue with the default configuration.
    pub fn new() -> Self {
        Self::with_config(QueueConfig::default())
    }

    /// Creates an empty queue with room for `capacity` items.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_config(QueueConfig {
            capacity,
            ..QueueConfig::default()
        })
    }

    /// Creates an empty queue from `config`.
    ///
    /// # Panics
    ///
    /// Panics if `config.bin_dt` is not positive and finite.
    pub fn with_config(config: QueueConfig) -> Self {
        Self {
            arena: Arena::with_capacity(config.capacity),
            backend: B::default(),
            bins: BinQueue::new(config.bin_dt, config.bin_count),
            least: NIL,
            next_seq: 0,
            next_stamp: 0,
            stats: Stats::default(),
            verify: config.verify,
        }
    }

    /// Number of queued items, bin items included.
    #[inline]
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Returns `true` if nothing is queued, in the trees or the bins.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    // =========================================================================
    // Scheduling
    // =========================================================================

    /// Schedules `payload` at `time`.
    ///
    /// Items sharing a time are not guaranteed to come out in any
    /// particular order; use [`insert_fifo`](Self::insert_fifo) when that
    /// matters.
    ///
    /// # Panics
    ///
    /// Panics if `time` is NaN or infinite.
    pub fn insert(&mut self, time: f64, payload: P) -> Item {
        self.schedule(time, payload, Lane::Primary)
    }

    /// Schedules `payload` at `time`, after every item already queued at
    /// exactly `time`.
    ///
    /// # Panics
    ///
    /// Panics if `time` is NaN or infinite.
    pub fn insert_fifo(&mut self, time: f64, payload: P) -> Item {
        self.stats.fifo_inserts += 1;
        self.schedule(time, payload, Lane::Fifo)
    }

    fn schedule(&mut self, time: f64, payload: P, lane: Lane) -> Item {
        check_time(time);
        let key = EventKey::new(time, self.bump_seq());
        let stamp = self.next_stamp;
        self.next_stamp += 1;

        let node = self.arena.insert(Node::new(key, stamp, lane, payload));
        self.stats.inserts += 1;
        self.place(node);
        self.verify_after("insert");

        Item { key: node, stamp }
    }

    /// Hands a detached, keyed node either to the least slot or to the
    /// backend.
    fn place(&mut self, node: usize) {
        if self.least.is_none() {
            self.least = node;
            return;
        }

        self.stats.comparisons += 1;
        if self.arena.key_of(node).precedes(&self.arena.key_of(self.least)) {
            let old = self.least;
            self.backend.insert(&mut self.arena, old);
            self.least = node;
        } else {
            self.backend.insert(&mut self.arena, node);
        }
    }

    #[inline]
    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    // =========================================================================
    // Peeking
    // =========================================================================

    /// Handle of the earliest item, without removing it.
    #[inline]
    pub fn least(&self) -> Option<Item> {
        self.stats.bump_least();
        self.least.is_some().then(|| self.handle(self.least))
    }

    /// Time of the earliest item, or `f64::INFINITY` when empty.
    #[inline]
    pub fn least_t(&self) -> f64 {
        self.stats.bump_least();
        self.peek_time()
    }

    // =========================================================================
    // Item access
    // =========================================================================

    /// Returns `true` if `item` still refers to a queued occurrence.
    #[inline]
    pub fn contains(&self, item: Item) -> bool {
        matches!(self.arena.get(item.key), Some(node) if node.stamp == item.stamp)
    }

    /// Delivery time of `item`.
    ///
    /// # Panics
    ///
    /// Panics if `item` is no longer queued.
    pub fn time(&self, item: Item) -> f64 {
        self.arena[self.resolve(item)].key.time
    }

    /// Payload of `item`.
    ///
    /// # Panics
    ///
    /// Panics if `item` is no longer queued.
    pub fn payload(&self, item: Item) -> &P {
        &self.arena[self.resolve(item)].payload
    }

    /// Mutable payload of `item`.
    ///
    /// # Panics
    ///
    /// Panics if `item` is no longer queued.
    pub fn payload_mut(&mut self, item: Item) -> &mut P {
        let key = self.resolve(item);
        &mut self.arena[key].payload
    }

    fn resolve(&self, item: Item) -> usize {
        match self.arena.get(item.key) {
            Some(node) if node.stamp == item.stamp => item.key,
            _ => panic!("precondition violated: {item:?} is not queued"),
        }
    }

    /// `least_t` without touching the counters.
    #[inline]
    fn peek_time(&self) -> f64 {
        if self.least.is_some() {
            self.arena[self.least].key.time
        } else {
            f64::INFINITY
        }
    }

    #[inline]
    fn handle(&self, key: usize) -> Item {
        Item {
            key,
            stamp: self.arena[key].stamp,
        }
    }

    // =========================================================================
    // Removal
    // =========================================================================

    /// Removes `item` and returns its payload.
    ///
    /// # Panics
    ///
    /// Panics if `item` is no longer queued.
    pub fn remove(&mut self, item: Item) -> P {
        let key = self.resolve(item);
        self.unlink(key);
        let node = self.arena.take(key);
        self.stats.removals += 1;
        self.verify_after("remove");
        node.payload
    }

    /// Removes the earliest item and returns its time and payload.
    pub fn pop(&mut self) -> Option<(f64, P)> {
        if self.least.is_none() {
            return None;
        }
        let key = self.least;
        self.unlink(key);
        let node = self.arena.take(key);
        self.stats.removals += 1;
        self.verify_after("pop");
        Some((node.key.time, node.payload))
    }

    /// Removes the earliest item if it is due at or before `until`.
    pub fn pop_due(&mut self, until: f64) -> Option<(f64, P)> {
        if self.least.is_some() && self.arena[self.least].key.time <= until {
            self.pop()
        } else {
            None
        }
    }

    /// Takes `key` out of whichever structure holds it. The node stays in
    /// the arena, detached.
    fn unlink(&mut self, key: usize) {
        if self.arena[key].lane == Lane::Bin {
            self.bins.remove(&mut self.arena, key);
        } else if key == self.least {
            self.least = self.backend.pop_first(&mut self.arena).unwrap_or(NIL);
        } else {
            self.backend.remove(&mut self.arena, key);
        }
    }

    // =========================================================================
    // Rescheduling
    // =========================================================================

    /// Reschedules `item` to `time`. The handle stays valid.
    ///
    /// Observably the same as removing the item and inserting it again at
    /// `time`: it sorts after every item already queued at that time.
    ///
    /// # Panics
    ///
    /// Panics if `item` is no longer queued, sits in the bin queue, or
    /// `time` is NaN or infinite.
    pub fn move_item(&mut self, item: Item, time: f64) {
        check_time(time);
        let key = self.resolve(item);
        assert!(
            self.arena[key].lane != Lane::Bin,
            "precondition violated: bin items cannot be moved"
        );
        self.stats.moves += 1;

        if key == self.least {
            self.rekey_least(time);
        } else {
            self.backend.remove(&mut self.arena, key);
            self.rekey(key, time);
            self.place(key);
        }
        self.verify_after("move");
    }

    /// Reschedules the earliest item to `time`.
    ///
    /// When the item is still earliest afterwards, no tree is touched.
    ///
    /// # Panics
    ///
    /// Panics if the queue is empty or `time` is NaN or infinite.
    pub fn move_least(&mut self, time: f64) {
        check_time(time);
        assert!(
            self.least.is_some(),
            "precondition violated: move_least on an empty queue"
        );
        self.stats.moves += 1;
        self.rekey_least(time);
        self.verify_after("move_least");
    }

    fn rekey_least(&mut self, time: f64) {
        let key = self.least;
        self.rekey(key, time);

        let Some(first) = self.backend.first(&self.arena) else {
            self.stats.fast_moves += 1;
            return;
        };

        self.stats.comparisons += 1;
        if self.arena.key_of(key).precedes(&self.arena.key_of(first)) {
            self.stats.fast_moves += 1;
            return;
        }

        self.least = self.backend.pop_first(&mut self.arena).unwrap_or(NIL);
        self.backend.insert(&mut self.arena, key);
    }

    #[inline]
    fn rekey(&mut self, key: usize, time: f64) {
        let seq = self.bump_seq();
        self.arena[key].key = EventKey::new(time, seq);
    }

    // =========================================================================
    // Bin queue
    // =========================================================================

    /// Schedules `payload` in the bin of the step that `time` falls in.
    ///
    /// Bin items come back through [`dequeue_bin`](Self::dequeue_bin) once
    /// their step is current, in the order they were binned. They can be
    /// removed by handle but not moved.
    ///
    /// # Panics
    ///
    /// Panics if `time` is NaN or infinite, or falls before the current
    /// step.
    ///
    /// # Example
    ///
    /// ```
    /// use tqueue::{QueueConfig, TQueue};
    ///
    /// let mut queue: TQueue<&str> = TQueue::with_config(QueueConfig {
    ///     bin_dt: 0.5,
    ///     ..QueueConfig::default()
    /// });
    /// queue.enqueue_bin(0.2, "now");
    /// queue.enqueue_bin(0.7, "next step");
    ///
    /// assert_eq!(queue.dequeue_bin(), Some((0.2, "now")));
    /// assert_eq!(queue.dequeue_bin(), None);
    ///
    /// queue.shift_bin(0.5);
    /// assert_eq!(queue.dequeue_bin(), Some((0.7, "next step")));
    /// ```
    pub fn enqueue_bin(&mut self, time: f64, payload: P) -> Item {
        check_time(time);
        let key = EventKey::new(time, self.bump_seq());
        let stamp = self.next_stamp;
        self.next_stamp += 1;

        let node = self.arena.insert(Node::new(key, stamp, Lane::Bin, payload));
        self.bins.enqueue(&mut self.arena, node);
        self.stats.inserts += 1;
        self.stats.bin_inserts += 1;
        self.verify_after("enqueue_bin");

        Item { key: node, stamp }
    }

    /// Handle of the next bin item of the current step, without removing
    /// it.
    pub fn bin_top(&self) -> Option<Item> {
        self.bins.top().map(|key| self.handle(key))
    }

    /// Removes the next bin item of the current step and returns its time
    /// and payload.
    pub fn dequeue_bin(&mut self) -> Option<(f64, P)> {
        let key = self.bins.dequeue(&mut self.arena)?;
        let node = self.arena.take(key);
        self.stats.removals += 1;
        self.verify_after("dequeue_bin");
        Some((node.key.time, node.payload))
    }

    /// Advances the bin queue to the next step, which starts at `time`.
    ///
    /// # Panics
    ///
    /// Panics if `time` is NaN or infinite, or the current step still holds
    /// bin items.
    pub fn shift_bin(&mut self, time: f64) {
        check_time(time);
        self.bins.shift(time);
        self.stats.bin_shifts += 1;
        tracing::trace!("bin queue shifted to t={}", time);
    }

    /// Start time of the current bin step.
    #[inline]
    pub fn bin_time(&self) -> f64 {
        self.bins.origin()
    }

    /// Number of items waiting in the bin queue.
    #[inline]
    pub fn bin_len(&self) -> usize {
        self.bins.len()
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Finds some item queued at exactly `time`.
    ///
    /// Which one is returned when several share the time is unspecified.
    /// Bin items are not searched.
    pub fn find(&mut self, time: f64) -> Option<Item> {
        self.stats.finds += 1;
        if self.least.is_none() {
            return None;
        }

        self.stats.comparisons += 1;
        if self.arena[self.least].key.time == time {
            return Some(self.handle(self.least));
        }
        let key = self.backend.find(&mut self.arena, time)?;
        Some(self.handle(key))
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Snapshot of the operation counters.
    pub fn statistics(&self) -> Counters {
        self.stats.snapshot(self.backend.counters())
    }

    /// Calls `f` on every item: tree items in delivery order, then bin
    /// items step by step from the current one.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(Item, f64, &P),
    {
        let mut visit = |key: usize| {
            let node = &self.arena[key];
            f(self.handle(key), node.key.time, &node.payload);
        };
        if self.least.is_some() {
            visit(self.least);
            self.backend.walk(&self.arena, &mut visit);
        }
        self.bins.walk(&self.arena, visit);
    }

    /// Logs every queued item at debug level and the counters at info
    /// level.
    pub fn print(&self) {
        let mut index = 0usize;
        let mut emit = |node: &Node<P>| {
            tracing::debug!(
                "{} {} seq={} lane={:?}",
                index,
                node.key.time,
                node.key.seq,
                node.lane
            );
            index += 1;
        };
        if self.least.is_some() {
            emit(&self.arena[self.least]);
            self.backend.walk(&self.arena, |key| emit(&self.arena[key]));
        }
        self.bins.walk(&self.arena, |key| emit(&self.arena[key]));
        tracing::info!(
            "{} queue: {} (bin queue holds {} in {} steps from t={})",
            B::NAME,
            self.statistics(),
            self.bins.len(),
            self.bins.bucket_count(),
            self.bins.origin()
        );
    }

    /// Verifies every structural invariant of the queue, its backend and
    /// its bin queue.
    pub fn validate(&self) -> Result<(), CheckError> {
        self.backend.validate(&self.arena)?;
        self.bins.validate(&self.arena)?;

        if self.least.is_none() {
            let reachable = self.backend.len() + self.bins.len();
            if !self.backend.is_empty() || reachable != self.arena.len() {
                return Err(CheckError::Length {
                    tracked: self.arena.len(),
                    reachable,
                });
            }
            return Ok(());
        }

        let least = &self.arena[self.least];
        if least.parent.is_some() || least.left.is_some() || least.right.is_some() {
            return Err(CheckError::ParentLink {
                node: self.least,
                expected: NIL,
                found: least.parent,
            });
        }

        if let Some(first) = self.backend.first(&self.arena) {
            if !least.key.precedes(&self.arena[first].key) {
                return Err(CheckError::StaleLeast {
                    least: least.key.time,
                    first: self.arena[first].key.time,
                });
            }
        }

        let reachable = self.backend.len() + self.bins.len() + 1;
        if reachable != self.arena.len() {
            return Err(CheckError::Length {
                tracked: self.arena.len(),
                reachable,
            });
        }
        Ok(())
    }

    /// Panics with `label` if any invariant is broken.
    ///
    /// # Panics
    ///
    /// Panics on the first violation [`validate`](Self::validate) reports.
    pub fn check(&self, label: &str) {
        if let Err(e) = self.validate() {
            tracing::error!("{} queue check failed at {}: {}", B::NAME, label, e);
            panic!("{label}: {e}");
        }
    }

    #[inline]
    fn verify_after(&self, label: &str) {
        if self.verify {
            self.check(label);
        }
    }

    /// Drops every queued item. Outstanding handles become invalid.
    pub fn clear(&mut self) {
        tracing::trace!("clearing {} queued items", self.len());
        self.backend.clear();
        self.bins.clear();
        self.arena.clear();
        self.least = NIL;
    }
}

impl<P, B: Backend> fmt::Debug for TQueue<P, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TQueue")
            .field("backend", &B::NAME)
            .field("len", &self.len())
            .field("bin_len", &self.bins.len())
            .field("least_t", &self.peek_time())
            .finish()
    }
}

#[inline]
fn check_time(time: f64) {
    assert!(
        time.is_finite(),
        "precondition violated: event time must be finite, got {time}"
    );
}
