//! Self-adjusting splay tree.
//!
//! Inserts split the tree top-down around the new key and make the new node
//! the root. Removing the smallest node walks the left spine, rotating pairs
//! as it goes. Arbitrary removal and `find` splay the target to the root
//! bottom-up. No balance information is stored, so a degenerate shape of
//! depth O(n) is possible between operations; every walk here is iterative.

use super::{Backend, check_tree, successor_counted};
use crate::error::CheckError;
use crate::key::{Key, NIL};
use crate::node::Node;
use crate::stats::BackendCounters;
use crate::storage::Arena;

/// Splay tree over arena nodes with a cached leftmost node.
#[derive(Debug, Clone)]
pub struct SplayTree {
    root: usize,
    leftmost: usize,
    len: usize,
    counters: BackendCounters,
}

impl Default for SplayTree {
    fn default() -> Self {
        Self {
            root: NIL,
            leftmost: NIL,
            len: 0,
            counters: BackendCounters::default(),
        }
    }
}

impl SplayTree {
    #[inline]
    pub(crate) fn root(&self) -> usize {
        self.root
    }

    /// Top-down split around `n`'s key; `n` becomes the root.
    ///
    /// While descending, `left` is the largest node of the growing
    /// "before" tree and `right` the smallest node of the "after" tree. Both
    /// start out as `n` itself, so the two halves first hang off `n` with
    /// their sides exchanged and are swapped into place at the end.
    fn enqueue<P>(&mut self, arena: &mut Arena<Node<P>>, n: usize) {
        let key = arena.key_of(n);
        self.len += 1;

        if self.leftmost.is_none() {
            self.leftmost = n;
        } else {
            self.counters.comparisons += 1;
            if key.precedes(&arena.key_of(self.leftmost)) {
                self.leftmost = n;
            }
        }

        arena[n].parent = NIL;
        let mut next = self.root;
        self.root = n;
        if next.is_none() {
            arena[n].left = NIL;
            arena[n].right = NIL;
            return;
        }

        let mut left = n;
        let mut right = n;
        self.counters.comparisons += 1;
        let mut after = key.precedes(&arena.key_of(next));

        'split: loop {
            if !after {
                // `next` sorts before `n`: follow right links.
                loop {
                    let temp = arena[next].right;
                    if temp.is_none() {
                        arena[left].right = next;
                        arena[next].parent = left;
                        arena[right].left = NIL;
                        break 'split;
                    }
                    self.counters.comparisons += 1;
                    if key.precedes(&arena.key_of(temp)) {
                        arena[left].right = next;
                        arena[next].parent = left;
                        left = next;
                        next = temp;
                        after = true;
                        continue 'split;
                    }

                    // Zig-zig: rotate `temp` above `next`.
                    let inner = arena[temp].left;
                    arena[next].right = inner;
                    if inner.is_some() {
                        arena[inner].parent = next;
                    }
                    arena[left].right = temp;
                    arena[temp].parent = left;
                    arena[temp].left = next;
                    arena[next].parent = temp;
                    self.counters.rebalances += 1;

                    left = temp;
                    next = arena[temp].right;
                    if next.is_none() {
                        arena[right].left = NIL;
                        break 'split;
                    }
                    self.counters.comparisons += 1;
                    if key.precedes(&arena.key_of(next)) {
                        after = true;
                        continue 'split;
                    }
                }
            } else {
                // `next` sorts after `n`: follow left links.
                loop {
                    let temp = arena[next].left;
                    if temp.is_none() {
                        arena[right].left = next;
                        arena[next].parent = right;
                        arena[left].right = NIL;
                        break 'split;
                    }
                    self.counters.comparisons += 1;
                    if !key.precedes(&arena.key_of(temp)) {
                        arena[right].left = next;
                        arena[next].parent = right;
                        right = next;
                        next = temp;
                        after = false;
                        continue 'split;
                    }

                    let inner = arena[temp].right;
                    arena[next].left = inner;
                    if inner.is_some() {
                        arena[inner].parent = next;
                    }
                    arena[right].left = temp;
                    arena[temp].parent = right;
                    arena[temp].right = next;
                    arena[next].parent = temp;
                    self.counters.rebalances += 1;

                    right = temp;
                    next = arena[temp].left;
                    if next.is_none() {
                        arena[left].right = NIL;
                        break 'split;
                    }
                    self.counters.comparisons += 1;
                    if !key.precedes(&arena.key_of(next)) {
                        after = false;
                        continue 'split;
                    }
                }
            }
        }

        let node = &mut arena[n];
        core::mem::swap(&mut node.left, &mut node.right);
    }

    /// Unlinks the leftmost node of the subtree rooted at `top`.
    ///
    /// Returns the removed node and the new subtree root. The caller fixes
    /// the new root's parent link and detaches the removed node.
    fn dequeue_subtree<P>(&mut self, arena: &mut Arena<Node<P>>, top: usize) -> (usize, usize) {
        let mut next = top;
        let mut left = arena[next].left;
        if left.is_none() {
            return (next, arena[next].right);
        }

        loop {
            let farleft = arena[left].left;
            if farleft.is_none() {
                let rest = arena[left].right;
                arena[next].left = rest;
                if rest.is_some() {
                    arena[rest].parent = next;
                }
                return (left, top);
            }

            let farfarleft = arena[farleft].left;
            if farfarleft.is_none() {
                let rest = arena[farleft].right;
                arena[left].left = rest;
                if rest.is_some() {
                    arena[rest].parent = left;
                }
                return (farleft, top);
            }

            // Rotate `farleft` above `left` and keep walking.
            arena[next].left = farleft;
            arena[farleft].parent = next;
            let inner = arena[farleft].right;
            arena[left].left = inner;
            if inner.is_some() {
                arena[inner].parent = left;
            }
            arena[farleft].right = left;
            arena[left].parent = farleft;
            self.counters.rebalances += 1;

            next = farleft;
            left = farfarleft;
        }
    }

    /// Bottom-up splay of `n` to the root.
    ///
    /// Walks from `n` toward the root, collecting everything smaller into
    /// `left` and everything larger into `right`, rotating zig-zig pairs on
    /// the way.
    fn splay<P>(&mut self, arena: &mut Arena<Node<P>>, n: usize) {
        let mut left = arena[n].left;
        let mut right = arena[n].right;
        let mut prev = n;
        let mut up = arena[prev].parent;

        while up.is_some() {
            let mut upup = arena[up].parent;

            if arena[up].left == prev {
                // `up` and its right side sort after `n`.
                if upup.is_some() && arena[upup].left == up {
                    let upupup = arena[upup].parent;
                    let inner = arena[up].right;
                    arena[upup].left = inner;
                    if inner.is_some() {
                        arena[inner].parent = upup;
                    }
                    arena[up].right = upup;
                    arena[upup].parent = up;
                    if upupup.is_none() {
                        self.root = up;
                    } else if arena[upupup].left == upup {
                        arena[upupup].left = up;
                    } else {
                        arena[upupup].right = up;
                    }
                    arena[up].parent = upupup;
                    upup = upupup;
                    self.counters.rebalances += 1;
                }
                arena[up].left = right;
                if right.is_some() {
                    arena[right].parent = up;
                }
                right = up;
            } else {
                // `up` and its left side sort before `n`.
                if upup.is_some() && arena[upup].right == up {
                    let upupup = arena[upup].parent;
                    let inner = arena[up].left;
                    arena[upup].right = inner;
                    if inner.is_some() {
                        arena[inner].parent = upup;
                    }
                    arena[up].left = upup;
                    arena[upup].parent = up;
                    if upupup.is_none() {
                        self.root = up;
                    } else if arena[upupup].right == upup {
                        arena[upupup].right = up;
                    } else {
                        arena[upupup].left = up;
                    }
                    arena[up].parent = upupup;
                    upup = upupup;
                    self.counters.rebalances += 1;
                }
                arena[up].right = left;
                if left.is_some() {
                    arena[left].parent = up;
                }
                left = up;
            }

            prev = up;
            up = upup;
        }

        arena[n].left = left;
        arena[n].right = right;
        arena[n].parent = NIL;
        if left.is_some() {
            arena[left].parent = n;
        }
        if right.is_some() {
            arena[right].parent = n;
        }
        self.root = n;
    }
}

impl Backend for SplayTree {
    const NAME: &'static str = "splay";

    #[inline]
    fn len(&self) -> usize {
        self.len
    }

    fn insert<P>(&mut self, arena: &mut Arena<Node<P>>, node: usize) {
        self.enqueue(arena, node);
    }

    fn remove<P>(&mut self, arena: &mut Arena<Node<P>>, node: usize) {
        if node == self.leftmost {
            self.leftmost = successor_counted(arena, node, &mut self.counters.least_searches);
        }

        self.splay(arena, node);
        let left = arena[node].left;
        let right = arena[node].right;

        if right.is_none() {
            self.root = left;
            if left.is_some() {
                arena[left].parent = NIL;
            }
        } else {
            // The successor becomes the new root.
            let (succ, rest) = self.dequeue_subtree(arena, right);
            arena[succ].left = left;
            arena[succ].right = rest;
            arena[succ].parent = NIL;
            if left.is_some() {
                arena[left].parent = succ;
            }
            if rest.is_some() {
                arena[rest].parent = succ;
            }
            self.root = succ;
            self.counters.complex_removals += 1;
        }

        arena[node].detach();
        self.len -= 1;
    }

    #[inline]
    fn first<P>(&self, _arena: &Arena<Node<P>>) -> Option<usize> {
        self.leftmost.is_some().then_some(self.leftmost)
    }

    fn pop_first<P>(&mut self, arena: &mut Arena<Node<P>>) -> Option<usize> {
        if self.root.is_none() {
            return None;
        }

        let first = self.leftmost;
        let next = successor_counted(arena, first, &mut self.counters.least_searches);

        let (removed, top) = self.dequeue_subtree(arena, self.root);
        debug_assert_eq!(removed, first);
        self.root = top;
        if top.is_some() {
            arena[top].parent = NIL;
        }

        arena[removed].detach();
        self.leftmost = next;
        self.len -= 1;
        Some(removed)
    }

    fn find<P>(&mut self, arena: &mut Arena<Node<P>>, time: f64) -> Option<usize> {
        let mut x = self.root;
        while x.is_some() {
            self.counters.find_searches += 1;
            self.counters.comparisons += 1;
            let t = arena[x].key.time;
            if time == t {
                break;
            }
            x = if time < t { arena[x].left } else { arena[x].right };
        }

        if x.is_none() {
            return None;
        }
        self.splay(arena, x);
        Some(x)
    }

    fn walk<P, F: FnMut(usize)>(&self, arena: &Arena<Node<P>>, f: F) {
        super::InOrder::new(arena, self.root).for_each(f);
    }

    fn validate<P>(&self, arena: &Arena<Node<P>>) -> Result<(), CheckError> {
        check_tree(arena, self.root, self.len, self.leftmost, |_| Ok(()))
    }

    fn clear(&mut self) {
        self.root = NIL;
        self.leftmost = NIL;
        self.len = 0;
    }

    #[inline]
    fn counters(&self) -> BackendCounters {
        self.counters
    }
}
