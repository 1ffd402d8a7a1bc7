//! Fixed-step bin queue.
//!
//! Under a fixed integration step, events that only need delivering at the
//! next step boundary do not need a tree. Each one drops into the bucket of
//! the step it falls in. The buckets form a ring: `head` is the bucket of
//! the step being delivered, and every shift advances it by one. An event
//! further ahead than the ring reaches grows the ring.
//!
//! ```text
//!   buckets: [ . ][ a ][ . ][ b→c ][ . ]
//!                   ▲
//!                  head (step at `origin`)
//! ```
//!
//! Bucket lists are intrusive: a bin node's `left` and `right` are its
//! previous and next links, and `balance` holds its bucket index.

use crate::error::CheckError;
use crate::key::{Key, NIL};
use crate::node::{Lane, Node};
use crate::storage::Arena;

/// Added before truncating to a bucket index so that an event due exactly
/// on a step boundary is not rounded into the previous step.
const STEP_EPSILON: f64 = 1e-10;

/// Buckets added beyond the furthest event when the ring grows.
const GROW_SLACK: usize = 1000;

#[derive(Debug, Clone, Copy)]
struct Bucket {
    head: usize,
    tail: usize,
}

impl Bucket {
    const EMPTY: Self = Self {
        head: NIL,
        tail: NIL,
    };
}

#[derive(Debug)]
pub(crate) struct BinQueue {
    buckets: Vec<Bucket>,
    /// Ring index of the step being delivered.
    head: usize,
    /// Time at which the current step starts.
    origin: f64,
    rev_dt: f64,
    len: usize,
}

impl BinQueue {
    /// # Panics
    ///
    /// Panics if `dt` is not positive and finite.
    pub(crate) fn new(dt: f64, buckets: usize) -> Self {
        assert!(
            dt.is_finite() && dt > 0.0,
            "precondition violated: bin step must be positive and finite, got {dt}"
        );
        Self {
            buckets: vec![Bucket::EMPTY; buckets.max(1)],
            head: 0,
            origin: 0.0,
            rev_dt: 1.0 / dt,
            len: 0,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn origin(&self) -> f64 {
        self.origin
    }

    #[inline]
    pub(crate) fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// How many steps past the current one `time` falls.
    fn steps_ahead(&self, time: f64) -> usize {
        let steps = ((time - self.origin) * self.rev_dt + STEP_EPSILON).floor();
        assert!(
            steps >= 0.0,
            "precondition violated: bin event at t={time} is before the current step at t={}",
            self.origin
        );
        assert!(
            steps < f64::from(u32::MAX) - GROW_SLACK as f64,
            "precondition violated: bin event at t={time} is {steps} steps ahead"
        );
        steps as usize
    }

    /// Files a detached node under the step its time falls in. Nodes in
    /// the same step keep their filing order.
    pub(crate) fn enqueue<P>(&mut self, arena: &mut Arena<Node<P>>, node: usize) {
        let ahead = self.steps_ahead(arena[node].key.time);
        if ahead >= self.buckets.len() {
            self.resize(arena, ahead + GROW_SLACK);
        }

        let mut slot = self.head + ahead;
        if slot >= self.buckets.len() {
            slot -= self.buckets.len();
        }

        let tail = self.buckets[slot].tail;
        let n = &mut arena[node];
        n.detach();
        n.left = tail;
        n.balance = slot as u32;
        if tail.is_none() {
            self.buckets[slot].head = node;
        } else {
            arena[tail].right = node;
        }
        self.buckets[slot].tail = node;
        self.len += 1;
    }

    /// First node of the current step, left in place.
    #[inline]
    pub(crate) fn top(&self) -> Option<usize> {
        let node = self.buckets[self.head].head;
        node.is_some().then_some(node)
    }

    /// Unlinks and returns the first node of the current step.
    pub(crate) fn dequeue<P>(&mut self, arena: &mut Arena<Node<P>>) -> Option<usize> {
        let node = self.top()?;
        self.remove(arena, node);
        Some(node)
    }

    /// Unlinks `node` from its bucket, leaving it detached.
    pub(crate) fn remove<P>(&mut self, arena: &mut Arena<Node<P>>, node: usize) {
        let slot = arena[node].balance as usize;
        let (prev, next) = (arena[node].left, arena[node].right);

        if prev.is_none() {
            self.buckets[slot].head = next;
        } else {
            arena[prev].right = next;
        }
        if next.is_none() {
            self.buckets[slot].tail = prev;
        } else {
            arena[next].left = prev;
        }

        arena[node].detach();
        arena[node].balance = 0;
        self.len -= 1;
    }

    /// Moves on to the next step, which starts at `time`.
    ///
    /// # Panics
    ///
    /// Panics if the current step still holds events.
    pub(crate) fn shift(&mut self, time: f64) {
        assert!(
            self.buckets[self.head].head.is_none(),
            "precondition violated: shifting past undelivered bin events at t={}",
            self.origin
        );
        self.origin = time;
        self.head += 1;
        if self.head == self.buckets.len() {
            self.head = 0;
        }
    }

    /// Grows the ring to `size` buckets, unrolling it so the current step
    /// lands at index 0.
    fn resize<P>(&mut self, arena: &mut Arena<Node<P>>, size: usize) {
        tracing::debug!(
            "bin queue grows from {} to {} buckets",
            self.buckets.len(),
            size
        );

        let mut buckets = Vec::with_capacity(size);
        buckets.extend_from_slice(&self.buckets[self.head..]);
        buckets.extend_from_slice(&self.buckets[..self.head]);
        buckets.resize(size, Bucket::EMPTY);

        for (slot, bucket) in buckets.iter().enumerate() {
            let mut x = bucket.head;
            while x.is_some() {
                arena[x].balance = slot as u32;
                x = arena[x].right;
            }
        }

        self.buckets = buckets;
        self.head = 0;
    }

    /// Calls `f` on every filed node, step by step from the current one.
    pub(crate) fn walk<P, F: FnMut(usize)>(&self, arena: &Arena<Node<P>>, mut f: F) {
        let (behind, ahead) = self.buckets.split_at(self.head);
        for bucket in ahead.iter().chain(behind) {
            let mut x = bucket.head;
            while x.is_some() {
                f(x);
                x = arena[x].right;
            }
        }
    }

    /// Checks every bucket list and the tracked length.
    pub(crate) fn validate<P>(&self, arena: &Arena<Node<P>>) -> Result<(), CheckError> {
        let mut reachable = 0usize;
        for (slot, bucket) in self.buckets.iter().enumerate() {
            let mut prev = NIL;
            let mut x = bucket.head;
            while x.is_some() {
                reachable += 1;
                if reachable > self.len {
                    return Err(CheckError::Length {
                        tracked: self.len,
                        reachable,
                    });
                }

                let node = &arena[x];
                if node.lane != Lane::Bin || node.balance as usize != slot {
                    return Err(CheckError::Bin { node: x, slot });
                }
                if node.left != prev {
                    return Err(CheckError::ParentLink {
                        node: x,
                        expected: prev,
                        found: node.left,
                    });
                }
                prev = x;
                x = node.right;
            }

            if bucket.tail != prev {
                return Err(CheckError::BinTail {
                    slot,
                    cached: bucket.tail,
                    actual: prev,
                });
            }
        }

        if reachable != self.len {
            return Err(CheckError::Length {
                tracked: self.len,
                reachable,
            });
        }
        Ok(())
    }

    /// Forgets every filed node. The arena is cleared separately.
    pub(crate) fn clear(&mut self) {
        self.buckets.fill(Bucket::EMPTY);
        self.len = 0;
    }
}
