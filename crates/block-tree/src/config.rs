//! Block tree configuration.

/// Default capacity of the header, block, and level caches. Doubles as the
/// width of the near-head cache admission window.
pub const DEFAULT_CACHE_CAPACITY: u32 = 64;

/// Default number of blocks replayed per batch during startup load.
pub const DEFAULT_LOAD_BATCH_SIZE: u64 = 1000;

/// Number of trailing full blocks replayed after a header-only range is
/// skipped during startup load.
pub const FAST_SYNC_TAIL: u64 = 1024;

/// Configuration for the block tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockTreeConfig {
    /// Capacity of each of the three caches.
    cache_capacity: u32,
    /// Blocks replayed per batch during startup load.
    load_batch_size: u64,
}

impl Default for BlockTreeConfig {
    fn default() -> Self {
        Self { cache_capacity: DEFAULT_CACHE_CAPACITY, load_batch_size: DEFAULT_LOAD_BATCH_SIZE }
    }
}

impl BlockTreeConfig {
    /// Creates a config with explicit bounds.
    pub const fn new(cache_capacity: u32, load_batch_size: u64) -> Self {
        Self { cache_capacity, load_batch_size }
    }

    /// Capacity of each of the three caches.
    pub const fn cache_capacity(&self) -> u32 {
        self.cache_capacity
    }

    /// Blocks replayed per batch during startup load.
    pub const fn load_batch_size(&self) -> u64 {
        self.load_batch_size
    }
}
