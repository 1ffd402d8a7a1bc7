//! Per-queue operation counters.

use core::cell::Cell;
use core::fmt;

/// Snapshot of a queue's operation counters.
///
/// Purely observational; collecting them never changes queue behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Counters {
    /// Calls to `insert` and `insert_fifo`.
    pub inserts: u64,
    /// The subset of `inserts` that went through `insert_fifo`.
    pub fifo_inserts: u64,
    /// The subset of `inserts` that went through `enqueue_bin`.
    pub bin_inserts: u64,
    /// Items taken out by `remove`, `pop`, `pop_due` or `dequeue_bin`.
    pub removals: u64,
    /// Calls to `move_item` and `move_least`.
    pub moves: u64,
    /// Moves that left the least item in place without touching a tree.
    pub fast_moves: u64,
    /// Calls to `least` and `least_t`.
    pub least_calls: u64,
    /// Calls to `find`.
    pub finds: u64,
    /// Tree nodes visited by `find`.
    pub find_searches: u64,
    /// Links followed to locate the next least item after one left.
    pub least_searches: u64,
    /// Calls to `shift_bin`.
    pub bin_shifts: u64,
    /// Key comparisons made by the queue and its backend.
    pub comparisons: u64,
    /// Rotations or weight reversals performed by the backend.
    pub rebalances: u64,
    /// Removals that had to splice a replacement node into place.
    pub complex_removals: u64,
}

impl fmt::Display for Counters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "insertions={} (fifo={} bin={}) moves={} fastmoves={} removals={} \
             calls to least={} calls to find={} comparisons={} leastsearch={} \
             findsearch={} balances={} complex removals={} bin shifts={}",
            self.inserts,
            self.fifo_inserts,
            self.bin_inserts,
            self.moves,
            self.fast_moves,
            self.removals,
            self.least_calls,
            self.finds,
            self.comparisons,
            self.least_searches,
            self.find_searches,
            self.rebalances,
            self.complex_removals,
            self.bin_shifts,
        )
    }
}

impl Counters {
    /// The spike-exchange summary: `[inserts, moves, removals]`.
    #[inline]
    pub fn spike_stat(&self) -> [u64; 3] {
        [self.inserts, self.moves, self.removals]
    }
}

/// Counters owned by the queue façade.
///
/// `least_calls` sits in a `Cell` so that peeking stays `&self`.
#[derive(Debug, Default)]
pub(crate) struct Stats {
    pub(crate) inserts: u64,
    pub(crate) fifo_inserts: u64,
    pub(crate) bin_inserts: u64,
    pub(crate) removals: u64,
    pub(crate) moves: u64,
    pub(crate) fast_moves: u64,
    pub(crate) least_calls: Cell<u64>,
    pub(crate) finds: u64,
    pub(crate) comparisons: u64,
    pub(crate) bin_shifts: u64,
}

impl Stats {
    #[inline]
    pub(crate) fn bump_least(&self) {
        self.least_calls.set(self.least_calls.get() + 1);
    }

    /// Combines the façade counters with the backend's.
    pub(crate) fn snapshot(&self, backend: BackendCounters) -> Counters {
        Counters {
            inserts: self.inserts,
            fifo_inserts: self.fifo_inserts,
            bin_inserts: self.bin_inserts,
            removals: self.removals,
            moves: self.moves,
            fast_moves: self.fast_moves,
            least_calls: self.least_calls.get(),
            finds: self.finds,
            find_searches: backend.find_searches,
            least_searches: backend.least_searches,
            bin_shifts: self.bin_shifts,
            comparisons: self.comparisons + backend.comparisons,
            rebalances: backend.rebalances,
            complex_removals: backend.complex_removals,
        }
    }
}

/// Counters a backend keeps for itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendCounters {
    /// Key comparisons.
    pub comparisons: u64,
    /// Rotations or weight reversals.
    pub rebalances: u64,
    /// Removals that spliced in a replacement node.
    pub complex_removals: u64,
    /// Nodes visited while searching by time.
    pub find_searches: u64,
    /// Links followed to refresh the cached first node.
    pub least_searches: u64,
}

impl core::ops::Add for BackendCounters {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            comparisons: self.comparisons + rhs.comparisons,
            rebalances: self.rebalances + rhs.rebalances,
            complex_removals: self.complex_removals + rhs.complex_removals,
            find_searches: self.find_searches + rhs.find_searches,
            least_searches: self.least_searches + rhs.least_searches,
        }
    }
}
