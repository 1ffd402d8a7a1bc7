//! Consistency-check errors.

/// An invariant violation found by [`TQueue::validate`](crate::TQueue::validate).
///
/// These only ever indicate a bug in a backend or a misused handle that
/// slipped past the handle checks; there is no recovery path.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[allow(missing_docs)]
pub enum CheckError {
    /// A child does not point back at its parent.
    #[error("node {node}: parent link points to {found}, expected {expected}")]
    ParentLink {
        node: usize,
        expected: usize,
        found: usize,
    },

    /// In-order traversal found keys out of order.
    #[error("node {node} (t={time}) is out of order after t={prev_time}")]
    OutOfOrder {
        node: usize,
        time: f64,
        prev_time: f64,
    },

    /// The item held outside the backend is not the earliest.
    #[error("cached least (t={least}) is not before backend first (t={first})")]
    StaleLeast { least: f64, first: f64 },

    /// A backend's cached first node is wrong.
    #[error("cached leftmost is {cached}, tree leftmost is {actual}")]
    StaleLeftmost { cached: usize, actual: usize },

    /// Tracked and reachable item counts differ.
    #[error("item count mismatch: tracked {tracked}, reachable {reachable}")]
    Length { tracked: usize, reachable: usize },

    /// A weight-balanced node's weight is not its subtree size.
    #[error("node {node}: weight {weight} inconsistent with left={left} and right={right}")]
    Weight {
        node: usize,
        weight: u32,
        left: u32,
        right: u32,
    },

    /// The red-black root is red.
    #[error("root node {node} is red")]
    RedRoot { node: usize },

    /// A red node has a red child.
    #[error("red node {node} has a red child {child}")]
    RedChild { node: usize, child: usize },

    /// Paths below the root differ in black height.
    #[error("black height {found} below node {node}, expected {expected}")]
    BlackHeight {
        node: usize,
        expected: usize,
        found: usize,
    },

    /// A node sits in the two-tree lane it was not scheduled on.
    #[error("node {node} is linked into the wrong lane")]
    Lane { node: usize },

    /// A node in bin `slot` is not a bin node or records another slot.
    #[error("node {node} is misfiled in bin {slot}")]
    Bin { node: usize, slot: usize },

    /// A bin's cached tail is not the last node of its list.
    #[error("bin {slot}: cached tail is {cached}, list ends at {actual}")]
    BinTail {
        slot: usize,
        cached: usize,
        actual: usize,
    },
}
