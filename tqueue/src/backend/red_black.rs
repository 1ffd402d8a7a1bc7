//! Red-black tree.
//!
//! Colour lives in the node's `balance` field. Missing children count as
//! black. Depth stays within twice the optimum, so unlike the splay trees
//! no single operation degrades to linear time.

use super::{
    Backend, InOrder, check_tree, leftmost, replace_child, rotate_left, rotate_right,
    successor_counted,
};
use crate::error::CheckError;
use crate::key::{Key, NIL};
use crate::node::Node;
use crate::stats::BackendCounters;
use crate::storage::Arena;

const BLACK: u32 = 0;
const RED: u32 = 1;

#[inline]
fn is_red<P>(arena: &Arena<Node<P>>, x: usize) -> bool {
    x.is_some() && arena[x].balance == RED
}

/// Red-black tree over arena nodes with a cached leftmost node.
#[derive(Debug, Clone)]
pub struct RedBlackTree {
    root: usize,
    leftmost: usize,
    len: usize,
    counters: BackendCounters,
}

impl Default for RedBlackTree {
    fn default() -> Self {
        Self {
            root: NIL,
            leftmost: NIL,
            len: 0,
            counters: BackendCounters::default(),
        }
    }
}

impl RedBlackTree {
    #[inline]
    fn rotate_left<P>(&mut self, arena: &mut Arena<Node<P>>, x: usize) {
        rotate_left(arena, &mut self.root, x);
        self.counters.rebalances += 1;
    }

    #[inline]
    fn rotate_right<P>(&mut self, arena: &mut Arena<Node<P>>, x: usize) {
        rotate_right(arena, &mut self.root, x);
        self.counters.rebalances += 1;
    }

    /// Puts `v` where `u` hangs. `u`'s own links are left alone.
    fn transplant<P>(&mut self, arena: &mut Arena<Node<P>>, u: usize, v: usize) {
        let parent = arena[u].parent;
        replace_child(arena, &mut self.root, parent, u, v);
        if v.is_some() {
            arena[v].parent = parent;
        }
    }

    fn insert_fixup<P>(&mut self, arena: &mut Arena<Node<P>>, mut z: usize) {
        loop {
            let p = arena[z].parent;
            if !is_red(arena, p) {
                break;
            }
            // A red parent is never the root.
            let g = arena[p].parent;

            if p == arena[g].left {
                let uncle = arena[g].right;
                if is_red(arena, uncle) {
                    arena[p].balance = BLACK;
                    arena[uncle].balance = BLACK;
                    arena[g].balance = RED;
                    z = g;
                    continue;
                }
                if z == arena[p].right {
                    z = p;
                    self.rotate_left(arena, z);
                }
                let p = arena[z].parent;
                let g = arena[p].parent;
                arena[p].balance = BLACK;
                arena[g].balance = RED;
                self.rotate_right(arena, g);
            } else {
                let uncle = arena[g].left;
                if is_red(arena, uncle) {
                    arena[p].balance = BLACK;
                    arena[uncle].balance = BLACK;
                    arena[g].balance = RED;
                    z = g;
                    continue;
                }
                if z == arena[p].left {
                    z = p;
                    self.rotate_right(arena, z);
                }
                let p = arena[z].parent;
                let g = arena[p].parent;
                arena[p].balance = BLACK;
                arena[g].balance = RED;
                self.rotate_left(arena, g);
            }
        }

        let root = self.root;
        arena[root].balance = BLACK;
    }

    fn delete<P>(&mut self, arena: &mut Arena<Node<P>>, z: usize) {
        let mut removed_colour = arena[z].balance;
        let x;
        let x_parent;

        if arena[z].left.is_none() {
            x = arena[z].right;
            x_parent = arena[z].parent;
            self.transplant(arena, z, x);
        } else if arena[z].right.is_none() {
            x = arena[z].left;
            x_parent = arena[z].parent;
            self.transplant(arena, z, x);
        } else {
            self.counters.complex_removals += 1;
            let y = leftmost(arena, arena[z].right);
            removed_colour = arena[y].balance;
            x = arena[y].right;

            if arena[y].parent == z {
                x_parent = y;
            } else {
                x_parent = arena[y].parent;
                self.transplant(arena, y, x);
                let right = arena[z].right;
                arena[y].right = right;
                arena[right].parent = y;
            }

            self.transplant(arena, z, y);
            let left = arena[z].left;
            arena[y].left = left;
            arena[left].parent = y;
            arena[y].balance = arena[z].balance;
        }

        if removed_colour == BLACK {
            self.delete_fixup(arena, x, x_parent);
        }
        arena[z].detach();
    }

    /// Restores black height after a black node left the tree. `x` may be
    /// [`NIL`], so its parent is tracked separately.
    fn delete_fixup<P>(&mut self, arena: &mut Arena<Node<P>>, mut x: usize, mut parent: usize) {
        while x != self.root && !is_red(arena, x) {
            if x == arena[parent].left {
                let mut w = arena[parent].right;
                if is_red(arena, w) {
                    arena[w].balance = BLACK;
                    arena[parent].balance = RED;
                    self.rotate_left(arena, parent);
                    w = arena[parent].right;
                }
                if !is_red(arena, arena[w].left) && !is_red(arena, arena[w].right) {
                    arena[w].balance = RED;
                    x = parent;
                    parent = arena[x].parent;
                } else {
                    if !is_red(arena, arena[w].right) {
                        let wl = arena[w].left;
                        arena[wl].balance = BLACK;
                        arena[w].balance = RED;
                        self.rotate_right(arena, w);
                        w = arena[parent].right;
                    }
                    arena[w].balance = arena[parent].balance;
                    arena[parent].balance = BLACK;
                    let wr = arena[w].right;
                    if wr.is_some() {
                        arena[wr].balance = BLACK;
                    }
                    self.rotate_left(arena, parent);
                    x = self.root;
                    parent = NIL;
                }
            } else {
                let mut w = arena[parent].left;
                if is_red(arena, w) {
                    arena[w].balance = BLACK;
                    arena[parent].balance = RED;
                    self.rotate_right(arena, parent);
                    w = arena[parent].left;
                }
                if !is_red(arena, arena[w].right) && !is_red(arena, arena[w].left) {
                    arena[w].balance = RED;
                    x = parent;
                    parent = arena[x].parent;
                } else {
                    if !is_red(arena, arena[w].left) {
                        let wr = arena[w].right;
                        arena[wr].balance = BLACK;
                        arena[w].balance = RED;
                        self.rotate_left(arena, w);
                        w = arena[parent].left;
                    }
                    arena[w].balance = arena[parent].balance;
                    arena[parent].balance = BLACK;
                    let wl = arena[w].left;
                    if wl.is_some() {
                        arena[wl].balance = BLACK;
                    }
                    self.rotate_right(arena, parent);
                    x = self.root;
                    parent = NIL;
                }
            }
        }

        if x.is_some() {
            arena[x].balance = BLACK;
        }
    }

    /// Black nodes from `x` up to the root, `x` included.
    fn black_depth<P>(arena: &Arena<Node<P>>, mut x: usize) -> usize {
        let mut depth = 0;
        while x.is_some() {
            if arena[x].balance == BLACK {
                depth += 1;
            }
            x = arena[x].parent;
        }
        depth
    }
}

impl Backend for RedBlackTree {
    const NAME: &'static str = "red-black";

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

        let mut parent = NIL;
        let mut x = self.root;
        let mut goes_left = false;
        while x.is_some() {
            parent = x;
            self.counters.comparisons += 1;
            goes_left = key.precedes(&arena.key_of(x));
            x = if goes_left { arena[x].left } else { arena[x].right };
        }

        {
            let n = &mut arena[node];
            n.parent = parent;
            n.left = NIL;
            n.right = NIL;
            n.balance = RED;
        }
        if parent.is_none() {
            self.root = node;
        } else if goes_left {
            arena[parent].left = node;
        } else {
            arena[parent].right = node;
        }

        self.insert_fixup(arena, node);
        self.len += 1;
    }

    fn remove<P>(&mut self, arena: &mut Arena<Node<P>>, node: usize) {
        if node == self.leftmost {
            self.leftmost = successor_counted(arena, node, &mut self.counters.least_searches);
        }
        self.delete(arena, node);
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
        check_tree(arena, self.root, self.len, self.leftmost, |_| Ok(()))?;

        if is_red(arena, self.root) {
            return Err(CheckError::RedRoot { node: self.root });
        }

        let mut expected = None;
        for node in InOrder::new(arena, self.root) {
            let (left, right) = (arena[node].left, arena[node].right);
            if is_red(arena, node) {
                for child in [left, right] {
                    if is_red(arena, child) {
                        return Err(CheckError::RedChild { node, child });
                    }
                }
            }
            if left.is_none() || right.is_none() {
                let found = Self::black_depth(arena, node);
                match expected {
                    None => expected = Some(found),
                    Some(expected) if expected != found => {
                        return Err(CheckError::BlackHeight {
                            node,
                            expected,
                            found,
                        });
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(())
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
