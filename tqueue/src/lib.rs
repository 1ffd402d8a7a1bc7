//! Time-ordered event queue for discrete-event simulation.
//!
//! A [`TQueue`] holds every pending occurrence of a simulation, each one a
//! delivery time plus a caller payload, and answers "what happens next, and
//! when" while events are scheduled, cancelled and rescheduled around it.
//!
//! # Access Pattern
//!
//! ```text
//! loop:
//!     t = queue.least_t()          O(1), cached
//!     fire the event
//!     queue.move_least(t + period) usually O(1), no tree work
//!       or queue.pop()             pulls the next least out of the backend
//! ```
//!
//! Beyond a plain priority queue, any queued item can be removed or
//! re-keyed through the [`Item`] handle returned when it was scheduled.
//!
//! # Quick Start
//!
//! ```
//! use tqueue::TQueue;
//!
//! let mut queue: TQueue<&str> = TQueue::new();
//! let timer = queue.insert(1.0, "timer");
//! queue.insert_fifo(2.0, "spike");
//!
//! // Fire the timer and re-arm it.
//! assert_eq!(queue.least(), Some(timer));
//! queue.move_least(3.0);
//!
//! assert_eq!(queue.pop(), Some((2.0, "spike")));
//! assert_eq!(queue.pop(), Some((3.0, "timer")));
//! assert!(queue.is_empty());
//! ```
//!
//! # Backends
//!
//! The ordered structure behind the queue is a type parameter:
//!
//! | Backend | Notes |
//! |---------|-------|
//! | [`SplayTree`] | Default. Fastest under temporal locality |
//! | [`TwoTreeSplay`] | Separate lane for `insert_fifo` batches |
//! | [`RedBlackTree`] | Worst-case O(log n) |
//! | [`WeightBalancedTree`] | Subtree-size balancing |
//!
//! ```
//! use tqueue::{RedBlackTree, TQueue};
//!
//! let mut queue: TQueue<u32, RedBlackTree> = TQueue::new();
//! queue.insert(0.5, 7);
//! assert_eq!(queue.pop(), Some((0.5, 7)));
//! ```
//!
//! Every backend produces the same order: items are keyed by time and a
//! per-queue sequence number, so items at the same time come out in the
//! order they were scheduled.
//!
//! # Feature Flags
//!
//! - `serde` - `Serialize`/`Deserialize` for [`QueueConfig`] and [`Counters`]

#![warn(missing_docs)]

pub mod backend;
mod bin;
pub mod config;
pub mod error;
mod key;
mod node;
pub mod queue;
pub mod stats;
mod storage;

pub use backend::{Backend, RedBlackTree, SplayTree, TwoTreeSplay, WeightBalancedTree};
pub use config::QueueConfig;
pub use error::CheckError;
pub use node::Item;
pub use queue::TQueue;
pub use stats::{BackendCounters, Counters};
