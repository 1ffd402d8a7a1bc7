//! Interchangeable ordered structures behind the queue façade.
//!
//! A backend keeps a set of arena nodes ordered by time and sequence
//! number. It links a detached node, unlinks an arbitrary node, peeks at
//! and pops the first node, and finds a node by exact time. The queue picks one
//! backend per instance through its type parameter; nothing is dispatched
//! at runtime.
//!
//! | Backend | Balance rule | Strength |
//! |---------|--------------|----------|
//! | [`SplayTree`] | none, accessed nodes rotate to the root | temporal locality |
//! | [`TwoTreeSplay`] | two splay trees, FIFO lane | batches of identical delays |
//! | [`RedBlackTree`] | colour invariants | worst-case bounds |
//! | [`WeightBalancedTree`] | subtree weight ratio | insert-heavy loads |
//!
//! All backends are parent-linked binary search trees over the same node
//! layout, so the rotation and traversal primitives below are shared. The
//! arena and node types stay private to the crate, which keeps the set of
//! backends closed.

mod red_black;
mod splay;
mod two_tree;
mod weight;

pub use red_black::RedBlackTree;
pub use splay::SplayTree;
pub use two_tree::TwoTreeSplay;
pub use weight::WeightBalancedTree;

use crate::error::CheckError;
use crate::key::{Key, NIL};
use crate::node::Node;
use crate::stats::BackendCounters;
use crate::storage::Arena;

/// An ordered structure over arena nodes.
///
/// Nodes handed to [`insert`](Backend::insert) must be detached and already
/// carry their final key. Nodes handed to [`remove`](Backend::remove) must
/// currently be linked into this backend. Both are caller obligations; the
/// queue façade upholds them.
pub trait Backend: Default {
    /// Short name used in logs and benchmark labels.
    const NAME: &'static str;

    /// Number of linked nodes.
    fn len(&self) -> usize;

    /// Returns `true` if no nodes are linked.
    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Links a detached node.
    fn insert<P>(&mut self, arena: &mut Arena<Node<P>>, node: usize);

    /// Unlinks `node`, leaving it detached in the arena.
    fn remove<P>(&mut self, arena: &mut Arena<Node<P>>, node: usize);

    /// Returns the node with the smallest key without restructuring.
    fn first<P>(&self, arena: &Arena<Node<P>>) -> Option<usize>;

    /// Unlinks and returns the node with the smallest key.
    fn pop_first<P>(&mut self, arena: &mut Arena<Node<P>>) -> Option<usize>;

    /// Finds some node whose time equals `time` exactly.
    fn find<P>(&mut self, arena: &mut Arena<Node<P>>, time: f64) -> Option<usize>;

    /// Calls `f` on every linked node in ascending key order.
    fn walk<P, F: FnMut(usize)>(&self, arena: &Arena<Node<P>>, f: F);

    /// Verifies the structural invariants.
    fn validate<P>(&self, arena: &Arena<Node<P>>) -> Result<(), CheckError>;

    /// Forgets every node. The arena is cleared separately.
    fn clear(&mut self);

    /// Operation counters collected so far.
    fn counters(&self) -> BackendCounters;
}

// =============================================================================
// Tree primitives
// =============================================================================

/// Leftmost node of the subtree rooted at `x`.
#[inline]
pub(crate) fn leftmost<P>(arena: &Arena<Node<P>>, mut x: usize) -> usize {
    while arena[x].left.is_some() {
        x = arena[x].left;
    }
    x
}

/// Rightmost node of the subtree rooted at `x`.
#[inline]
pub(crate) fn rightmost<P>(arena: &Arena<Node<P>>, mut x: usize) -> usize {
    while arena[x].right.is_some() {
        x = arena[x].right;
    }
    x
}

/// In-order successor of `x`, or [`NIL`].
#[inline]
pub(crate) fn successor<P>(arena: &Arena<Node<P>>, x: usize) -> usize {
    successor_counted(arena, x, &mut 0)
}

/// [`successor`], adding every link it follows to `steps`.
pub(crate) fn successor_counted<P>(arena: &Arena<Node<P>>, x: usize, steps: &mut u64) -> usize {
    let mut y = arena[x].right;
    if y.is_some() {
        *steps += 1;
        while arena[y].left.is_some() {
            y = arena[y].left;
            *steps += 1;
        }
        return y;
    }

    let mut child = x;
    let mut up = arena[x].parent;
    *steps += 1;
    while up.is_some() && arena[up].right == child {
        child = up;
        up = arena[up].parent;
        *steps += 1;
    }
    up
}

/// Points `parent`'s link to `old` at `new` instead; with no parent, `new`
/// becomes the root. Does not touch `new.parent`.
#[inline]
pub(crate) fn replace_child<P>(
    arena: &mut Arena<Node<P>>,
    root: &mut usize,
    parent: usize,
    old: usize,
    new: usize,
) {
    if parent.is_none() {
        *root = new;
    } else if arena[parent].left == old {
        arena[parent].left = new;
    } else {
        arena[parent].right = new;
    }
}

/// Rotates `x`'s right child above `x`.
pub(crate) fn rotate_left<P>(arena: &mut Arena<Node<P>>, root: &mut usize, x: usize) {
    let y = arena[x].right;
    let inner = arena[y].left;

    arena[x].right = inner;
    if inner.is_some() {
        arena[inner].parent = x;
    }

    let parent = arena[x].parent;
    arena[y].parent = parent;
    replace_child(arena, root, parent, x, y);

    arena[y].left = x;
    arena[x].parent = y;
}

/// Rotates `x`'s left child above `x`.
pub(crate) fn rotate_right<P>(arena: &mut Arena<Node<P>>, root: &mut usize, x: usize) {
    let y = arena[x].left;
    let inner = arena[y].right;

    arena[x].left = inner;
    if inner.is_some() {
        arena[inner].parent = x;
    }

    let parent = arena[x].parent;
    arena[y].parent = parent;
    replace_child(arena, root, parent, x, y);

    arena[y].right = x;
    arena[x].parent = y;
}

// =============================================================================
// Traversal
// =============================================================================

/// In-order iterator following parent links. Allocation free.
pub(crate) struct InOrder<'a, P> {
    arena: &'a Arena<Node<P>>,
    next: usize,
}

impl<'a, P> InOrder<'a, P> {
    pub(crate) fn new(arena: &'a Arena<Node<P>>, root: usize) -> Self {
        let next = if root.is_some() {
            leftmost(arena, root)
        } else {
            NIL
        };
        Self { arena, next }
    }
}

impl<P> Iterator for InOrder<'_, P> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.next.is_none() {
            return None;
        }
        let current = self.next;
        self.next = successor(self.arena, current);
        Some(current)
    }
}

/// Verifies the binary-search-tree shape shared by every backend.
///
/// Walks with an explicit stack over child links only, so a corrupted
/// parent link is reported rather than followed. `per_node` runs on every
/// node in key order after its links have been checked.
pub(crate) fn check_tree<P, F>(
    arena: &Arena<Node<P>>,
    root: usize,
    len: usize,
    leftmost_cached: usize,
    mut per_node: F,
) -> Result<(), CheckError>
where
    F: FnMut(usize) -> Result<(), CheckError>,
{
    if root.is_some() && arena[root].parent.is_some() {
        return Err(CheckError::ParentLink {
            node: root,
            expected: NIL,
            found: arena[root].parent,
        });
    }

    let mut stack = Vec::new();
    let mut x = root;
    let mut prev = NIL;
    let mut first = NIL;
    let mut reachable = 0usize;

    while x.is_some() || !stack.is_empty() {
        while x.is_some() {
            if reachable + stack.len() > len {
                return Err(CheckError::Length {
                    tracked: len,
                    reachable: reachable + stack.len(),
                });
            }
            stack.push(x);
            x = arena[x].left;
        }
        let Some(node) = stack.pop() else { break };

        for child in [arena[node].left, arena[node].right] {
            if child.is_some() && arena[child].parent != node {
                return Err(CheckError::ParentLink {
                    node: child,
                    expected: node,
                    found: arena[child].parent,
                });
            }
        }

        if prev.is_some() {
            if !arena[prev].key.precedes(&arena[node].key) {
                return Err(CheckError::OutOfOrder {
                    node,
                    time: arena[node].key.time,
                    prev_time: arena[prev].key.time,
                });
            }
        } else {
            first = node;
        }

        per_node(node)?;

        reachable += 1;
        prev = node;
        x = arena[node].right;
    }

    if reachable != len {
        return Err(CheckError::Length {
            tracked: len,
            reachable,
        });
    }
    if first != leftmost_cached {
        return Err(CheckError::StaleLeftmost {
            cached: leftmost_cached,
            actual: first,
        });
    }
    Ok(())
}
