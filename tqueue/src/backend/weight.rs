//! Weight-balanced binary tree.
//!
//! Every node stores the number of nodes in its subtree in `balance`. After
//! an insert the new node's ancestors are revisited bottom-up; whenever a
//! node's subtree is heavier than its sibling side warrants, the node is
//! rotated above its parent. Removal splices in the in-order predecessor.

use super::{
    Backend, InOrder, check_tree, replace_child, rightmost, rotate_left, rotate_right,
    successor_counted,
};
use crate::error::CheckError;
use crate::key::{Key, NIL};
use crate::node::Node;
use crate::stats::BackendCounters;
use crate::storage::Arena;

#[inline]
fn weight<P>(arena: &Arena<Node<P>>, x: usize) -> u32 {
    if x.is_some() { arena[x].balance } else { 0 }
}

/// Weight-balanced tree over arena nodes with a cached leftmost node.
#[derive(Debug, Clone)]
pub struct WeightBalancedTree {
    root: usize,
    leftmost: usize,
    len: usize,
    counters: BackendCounters,
}

impl Default for WeightBalancedTree {
    fn default() -> Self {
        Self {
            root: NIL,
            leftmost: NIL,
            len: 0,
            counters: BackendCounters::default(),
        }
    }
}

impl WeightBalancedTree {
    /// `x` would be better placed above its parent.
    fn unbalanced<P>(arena: &Arena<Node<P>>, x: usize) -> bool {
        let p = arena[x].parent;
        if p.is_none() {
            return false;
        }
        let skew =
            i64::from(weight(arena, arena[p].right)) - i64::from(weight(arena, arena[p].left));
        if arena[p].left == x {
            skew < -(i64::from(weight(arena, arena[x].right)) + 1)
        } else {
            skew > i64::from(weight(arena, arena[x].left)) + 1
        }
    }

    /// Rotates `x` above its parent and repairs the two weights involved.
    fn reverse<P>(&mut self, arena: &mut Arena<Node<P>>, x: usize) {
        let p = arena[x].parent;
        arena[x].balance = arena[p].balance;
        if arena[p].left == x {
            rotate_right(arena, &mut self.root, p);
        } else {
            rotate_left(arena, &mut self.root, p);
        }
        arena[p].balance = weight(arena, arena[p].left) + weight(arena, arena[p].right) + 1;
        self.counters.rebalances += 1;
    }

    /// Unlinks `i` and, if `adjust` is set, decrements its ancestors'
    /// weights.
    ///
    /// With a left subtree present, its rightmost node takes `i`'s place.
    /// That node is first unlinked by a nested call that already fixes the
    /// weights all the way up, so the outer call skips its own adjustment.
    fn detach<P>(&mut self, arena: &mut Arena<Node<P>>, i: usize, adjust: bool) {
        let p = arena[i].parent;
        let left = arena[i].left;
        let right = arena[i].right;
        let mut adjust = adjust;

        if left.is_some() {
            self.counters.complex_removals += 1;
            let x = rightmost(arena, left);
            if x == left {
                replace_child(arena, &mut self.root, p, i, x);
                arena[x].parent = p;
                arena[x].right = right;
                if right.is_some() {
                    arena[right].parent = x;
                }
                arena[x].balance = arena[i].balance - 1;
            } else {
                self.detach(arena, x, true);
                adjust = false;

                replace_child(arena, &mut self.root, p, i, x);
                let left = arena[i].left;
                let node = &mut arena[x];
                node.parent = p;
                node.left = left;
                node.right = right;
                arena[left].parent = x;
                if right.is_some() {
                    arena[right].parent = x;
                }
                arena[x].balance = arena[i].balance;
            }
        } else if right.is_some() {
            replace_child(arena, &mut self.root, p, i, right);
            arena[right].parent = p;
        } else {
            replace_child(arena, &mut self.root, p, i, NIL);
        }

        if adjust {
            let mut q = p;
            while q.is_some() {
                arena[q].balance -= 1;
                q = arena[q].parent;
            }
        }
        arena[i].detach();
    }
}

impl Backend for WeightBalancedTree {
    const NAME: &'static str = "weight";

    #[inline]
    fn len(&self) -> usize {
        self.len
    }

    fn insert<P>(&mut self, arena: &mut Arena<Node<P>>, node: usize) {
        let key = arena.key_of(node);

        if self.leftmost.is_none() {
            self.leftmost = node;
        } else {
            self.counters.comparisons += 1;
            if key.precedes(&arena.key_of(self.leftmost)) {
                self.leftmost = node;
            }
        }

        let mut p = self.root;
        if p.is_none() {
            self.root = node;
        } else {
            loop {
                self.counters.comparisons += 1;
                if key.precedes(&arena.key_of(p)) {
                    if arena[p].left.is_some() {
                        p = arena[p].left;
                    } else {
                        arena[p].left = node;
                        break;
                    }
                } else if arena[p].right.is_some() {
                    p = arena[p].right;
                } else {
                    arena[p].right = node;
                    break;
                }
            }
        }

        {
            let n = &mut arena[node];
            n.parent = p;
            n.left = NIL;
            n.right = NIL;
            n.balance = 1;
        }

        let mut q = p;
        while q.is_some() {
            arena[q].balance += 1;
            q = arena[q].parent;
        }

        // Each step either rotates `q` up a level or moves to its parent.
        let mut q = p;
        while q.is_some() {
            if Self::unbalanced(arena, q) {
                self.reverse(arena, q);
            } else {
                q = arena[q].parent;
            }
        }

        self.len += 1;
    }

    fn remove<P>(&mut self, arena: &mut Arena<Node<P>>, node: usize) {
        if node == self.leftmost {
            self.leftmost = successor_counted(arena, node, &mut self.counters.least_searches);
        }
        self.detach(arena, node, true);
        self.len -= 1;
    }

    #[inline]
    fn first<P>(&self, _arena: &Arena<Node<P>>) -> Option<usize> {
        self.leftmost.is_some().then_some(self.leftmost)
    }

    fn pop_first<P>(&mut self, arena: &mut Arena<Node<P>>) -> Option<usize> {
        let first = self.leftmost;
        if first.is_none() {
            return None;
        }
        self.remove(arena, first);
        Some(first)
    }

    fn find<P>(&mut self, arena: &mut Arena<Node<P>>, time: f64) -> Option<usize> {
        let mut x = self.root;
        while x.is_some() {
            self.counters.find_searches += 1;
            self.counters.comparisons += 1;
            let t = arena[x].key.time;
            if time == t {
                return Some(x);
            }
            x = if time < t { arena[x].left } else { arena[x].right };
        }
        None
    }

    fn walk<P, F: FnMut(usize)>(&self, arena: &Arena<Node<P>>, f: F) {
        InOrder::new(arena, self.root).for_each(f);
    }

    fn validate<P>(&self, arena: &Arena<Node<P>>) -> Result<(), CheckError> {
        check_tree(arena, self.root, self.len, self.leftmost, |node| {
            let n = &arena[node];
            let left = weight(arena, n.left);
            let right = weight(arena, n.right);
            if n.balance != left + right + 1 {
                return Err(CheckError::Weight {
                    node,
                    weight: n.balance,
                    left,
                    right,
                });
            }
            Ok(())
        })
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

#[cfg(test)]
mod tests {
    use super::super::testing::{drain, node, times};
    use super::*;

    fn depth(arena: &Arena<Node<u32>>, mut x: usize) -> usize {
        let mut d = 0;
        while x.is_some() {
            d += 1;
            x = arena[x].parent;
        }
        d
    }

    #[test]
    fn root_weight_is_len() {
        let mut arena = Arena::new();
        let mut tree = WeightBalancedTree::default();
        for i in 0..100u64 {
            let k = node(&mut arena, ((i * 17) % 100) as f64, i);
            tree.insert(&mut arena, k);
            tree.validate(&arena).unwrap();
            assert_eq!(arena[tree.root].balance as usize, tree.len());
        }
    }

    #[test]
    fn ascending_inserts_rebalance() {
        let mut arena = Arena::new();
        let mut tree = WeightBalancedTree::default();
        let mut last = NIL;
        for i in 0..512u64 {
            last = node(&mut arena, i as f64, i);
            tree.insert(&mut arena, last);
        }
        tree.validate(&arena).unwrap();
        assert!(tree.counters().rebalances > 0);
        // A plain BST would put the last key at depth 512.
        assert!(depth(&arena, last) < 64);
    }

    #[test]
    fn drain_sorted_with_ties() {
        let mut arena = Arena::new();
        let mut tree = WeightBalancedTree::default();
        for (seq, t) in [1.0, 1.0, 0.5, 1.0, 0.25].into_iter().enumerate() {
            let k = node(&mut arena, t, seq as u64);
            tree.insert(&mut arena, k);
        }
        assert_eq!(drain(&mut tree, &mut arena), vec![4, 2, 0, 1, 3]);
    }

    #[test]
    fn remove_keeps_weights() {
        let mut arena = Arena::new();
        let mut tree = WeightBalancedTree::default();
        let keys: Vec<_> = (0..50u64)
            .map(|i| {
                let k = node(&mut arena, ((i * 29) % 50) as f64, i);
                tree.insert(&mut arena, k);
                k
            })
            .collect();

        for i in 0..50usize {
            let k = keys[(i * 7) % 50];
            tree.remove(&mut arena, k);
            tree.validate(&arena).unwrap();
            if !tree.is_empty() {
                assert_eq!(arena[tree.root].balance as usize, tree.len());
            }
        }
        assert!(tree.is_empty());
        assert!(tree.counters().complex_removals > 0);
    }

    #[test]
    fn find_exact_time() {
        let mut arena = Arena::new();
        let mut tree = WeightBalancedTree::default();
        for i in 0..8u64 {
            let k = node(&mut arena, i as f64 * 0.25, i);
            tree.insert(&mut arena, k);
        }
        let hit = tree.find(&mut arena, 1.25).unwrap();
        assert_eq!(arena[hit].payload, 5);
        assert_eq!(tree.find(&mut arena, 3.0), None);
        assert_eq!(times(&tree, &arena).len(), 8);
    }

    #[test]
    fn validate_reports_bad_weight() {
        let mut arena = Arena::new();
        let mut tree = WeightBalancedTree::default();
        for i in 0..3u64 {
            let k = node(&mut arena, i as f64, i);
            tree.insert(&mut arena, k);
        }
        let root = tree.root;
        arena[root].balance += 1;
        assert!(matches!(
            tree.validate(&arena),
            Err(CheckError::Weight { .. })
        ));
    }
}
