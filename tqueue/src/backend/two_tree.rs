//! Two splay trees sharing one arena.
//!
//! Nodes scheduled with a shared delay (`insert_fifo`) arrive in nearly
//! ascending time order. Keeping them in their own splay tree means each of
//! those inserts lands next to the previous one instead of splitting the
//! main tree. The lane is recorded on the node and survives moves.

use core::iter::Peekable;

use super::{Backend, InOrder, SplayTree};
use crate::error::CheckError;
use crate::node::{Lane, Node};
use crate::stats::BackendCounters;
use crate::storage::Arena;

/// A primary splay tree plus a FIFO-lane splay tree.
#[derive(Debug, Clone, Default)]
pub struct TwoTreeSplay {
    primary: SplayTree,
    fifo: SplayTree,
    comparisons: u64,
}

impl TwoTreeSplay {
    #[inline]
    fn tree_mut(&mut self, lane: Lane) -> &mut SplayTree {
        if lane == Lane::Fifo {
            &mut self.fifo
        } else {
            &mut self.primary
        }
    }

    /// Which tree holds the overall first node. Ties cannot occur because
    /// keys are unique; the FIFO lane wins anything that is not strictly
    /// later in the primary tree.
    fn first_lane<P>(&self, arena: &Arena<Node<P>>) -> Option<Lane> {
        match (self.primary.first(arena), self.fifo.first(arena)) {
            (None, None) => None,
            (Some(_), None) => Some(Lane::Primary),
            (None, Some(_)) => Some(Lane::Fifo),
            (Some(p), Some(f)) => {
                if arena.key_of(p).precedes(&arena.key_of(f)) {
                    Some(Lane::Primary)
                } else {
                    Some(Lane::Fifo)
                }
            }
        }
    }
}

impl Backend for TwoTreeSplay {
    const NAME: &'static str = "two-tree";

    #[inline]
    fn len(&self) -> usize {
        self.primary.len() + self.fifo.len()
    }

    fn insert<P>(&mut self, arena: &mut Arena<Node<P>>, node: usize) {
        let lane = arena[node].lane;
        self.tree_mut(lane).insert(arena, node);
    }

    fn remove<P>(&mut self, arena: &mut Arena<Node<P>>, node: usize) {
        let lane = arena[node].lane;
        self.tree_mut(lane).remove(arena, node);
    }

    fn first<P>(&self, arena: &Arena<Node<P>>) -> Option<usize> {
        if self.first_lane(arena)? == Lane::Fifo {
            self.fifo.first(arena)
        } else {
            self.primary.first(arena)
        }
    }

    fn pop_first<P>(&mut self, arena: &mut Arena<Node<P>>) -> Option<usize> {
        let lane = self.first_lane(arena)?;
        if !self.primary.is_empty() && !self.fifo.is_empty() {
            self.comparisons += 1;
        }
        self.tree_mut(lane).pop_first(arena)
    }

    fn find<P>(&mut self, arena: &mut Arena<Node<P>>, time: f64) -> Option<usize> {
        self.fifo
            .find(arena, time)
            .or_else(|| self.primary.find(arena, time))
    }

    fn walk<P, F: FnMut(usize)>(&self, arena: &Arena<Node<P>>, mut f: F) {
        let mut primary = InOrder::new(arena, self.primary.root()).peekable();
        let mut fifo = InOrder::new(arena, self.fifo.root()).peekable();
        while let Some(next) = merge_next(arena, &mut primary, &mut fifo) {
            f(next);
        }
    }

    fn validate<P>(&self, arena: &Arena<Node<P>>) -> Result<(), CheckError> {
        self.primary.validate(arena)?;
        self.fifo.validate(arena)?;

        for (tree, lane) in [(&self.primary, Lane::Primary), (&self.fifo, Lane::Fifo)] {
            if let Some(node) = InOrder::new(arena, tree.root()).find(|&k| arena[k].lane != lane) {
                return Err(CheckError::Lane { node });
            }
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.primary.clear();
        self.fifo.clear();
    }

    fn counters(&self) -> BackendCounters {
        let mut counters = self.primary.counters() + self.fifo.counters();
        counters.comparisons += self.comparisons;
        counters
    }
}

fn merge_next<P>(
    arena: &Arena<Node<P>>,
    primary: &mut Peekable<InOrder<'_, P>>,
    fifo: &mut Peekable<InOrder<'_, P>>,
) -> Option<usize> {
    match (primary.peek().copied(), fifo.peek().copied()) {
        (Some(p), Some(f)) if arena.key_of(p).precedes(&arena.key_of(f)) => primary.next(),
        (_, Some(_)) => fifo.next(),
        (Some(_), None) => primary.next(),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{drain, fifo_node, node, times};
    use super::*;

    #[test]
    fn lanes_route_by_tag() {
        let mut arena = Arena::new();
        let mut tree = TwoTreeSplay::default();

        let a = node(&mut arena, 2.0, 0);
        let b = fifo_node(&mut arena, 1.0, 1);
        let c = fifo_node(&mut arena, 3.0, 2);
        for k in [a, b, c] {
            tree.insert(&mut arena, k);
        }

        assert_eq!(tree.primary.len(), 1);
        assert_eq!(tree.fifo.len(), 2);
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.first(&arena), Some(b));
        tree.validate(&arena).unwrap();
    }

    #[test]
    fn walk_merges_lanes() {
        let mut arena = Arena::new();
        let mut tree = TwoTreeSplay::default();

        for seq in 0..10u64 {
            let k = if seq % 2 == 0 {
                node(&mut arena, seq as f64, seq)
            } else {
                fifo_node(&mut arena, seq as f64, seq)
            };
            tree.insert(&mut arena, k);
        }

        let expected: Vec<f64> = (0..10).map(|i| i as f64).collect();
        assert_eq!(times(&tree, &arena), expected);
    }

    #[test]
    fn drain_interleaves_lanes() {
        let mut arena = Arena::new();
        let mut tree = TwoTreeSplay::default();

        // Same time on both lanes: seq decides.
        let p = node(&mut arena, 1.0, 0);
        let f = fifo_node(&mut arena, 1.0, 1);
        let q = node(&mut arena, 0.5, 2);
        let g = fifo_node(&mut arena, 2.0, 3);
        for k in [p, f, q, g] {
            tree.insert(&mut arena, k);
        }

        assert_eq!(drain(&mut tree, &mut arena), vec![2, 0, 1, 3]);
    }

    #[test]
    fn remove_from_either_lane() {
        let mut arena = Arena::new();
        let mut tree = TwoTreeSplay::default();
        let a = node(&mut arena, 1.0, 0);
        let b = fifo_node(&mut arena, 2.0, 1);
        tree.insert(&mut arena, a);
        tree.insert(&mut arena, b);

        tree.remove(&mut arena, b);
        assert_eq!(tree.fifo.len(), 0);
        tree.remove(&mut arena, a);
        assert!(tree.is_empty());
        tree.validate(&arena).unwrap();
    }

    #[test]
    fn find_checks_fifo_lane_first() {
        let mut arena = Arena::new();
        let mut tree = TwoTreeSplay::default();
        let a = node(&mut arena, 4.0, 0);
        let b = fifo_node(&mut arena, 4.0, 1);
        let c = node(&mut arena, 5.0, 2);
        for k in [a, b, c] {
            tree.insert(&mut arena, k);
        }

        assert_eq!(tree.find(&mut arena, 4.0), Some(b));
        assert_eq!(tree.find(&mut arena, 5.0), Some(c));
        assert_eq!(tree.find(&mut arena, 6.0), None);
        tree.validate(&arena).unwrap();
    }

    #[test]
    fn validate_reports_wrong_lane() {
        let mut arena = Arena::new();
        let mut tree = TwoTreeSplay::default();
        let a = node(&mut arena, 1.0, 0);
        tree.insert(&mut arena, a);

        arena[a].lane = Lane::Fifo;
        assert_eq!(tree.validate(&arena), Err(CheckError::Lane { node: a }));
    }
}
