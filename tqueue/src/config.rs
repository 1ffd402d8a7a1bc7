//! Queue construction options.

/// Options for [`TQueue::with_config`](crate::TQueue::with_config).
///
/// # Example
///
/// ```
/// use tqueue::{QueueConfig, TQueue};
///
/// let config = QueueConfig {
///     capacity: 64,
///     bin_dt: 0.1,
///     ..QueueConfig::default()
/// };
/// let queue: TQueue<u32> = TQueue::with_config(config);
/// assert!(queue.is_empty());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct QueueConfig {
    /// Number of items the node arena holds before it has to grow.
    pub capacity: usize,
    /// Run the full consistency walk after every mutating call and panic
    /// on the first violation. Slow; meant for tests and debugging.
    pub verify: bool,
    /// Width of one step of the bin queue. Must be positive and finite.
    pub bin_dt: f64,
    /// Initial number of steps the bin queue ring covers.
    pub bin_count: usize,
}

impl QueueConfig {
    /// Arena pre-allocation used by [`QueueConfig::default`].
    pub const DEFAULT_CAPACITY: usize = 1000;

    /// Bin step used by [`QueueConfig::default`].
    pub const DEFAULT_BIN_DT: f64 = 0.025;

    /// Bin ring size used by [`QueueConfig::default`].
    pub const DEFAULT_BIN_COUNT: usize = 1000;
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: Self::DEFAULT_CAPACITY,
            verify: false,
            bin_dt: Self::DEFAULT_BIN_DT,
            bin_count: Self::DEFAULT_BIN_COUNT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = QueueConfig::default();
        assert_eq!(config.capacity, 1000);
        assert!(!config.verify);
        assert_eq!(config.bin_dt, 0.025);
        assert_eq!(config.bin_count, 1000);
    }
}
