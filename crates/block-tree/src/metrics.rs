//! Block tree metrics.

use metrics::{counter, gauge, Counter, Gauge};
use std::fmt;

/// Metrics for the block tree.
pub(crate) struct TreeMetrics {
    /// Height of the current head.
    pub(crate) head_number: Gauge,
    /// Highest height with a stored level.
    pub(crate) best_known_number: Gauge,
    /// Total number of blocks accepted by suggestion.
    pub(crate) suggested_blocks: Counter,
    /// Total number of blocks promoted onto the main chain.
    pub(crate) promoted_blocks: Counter,
    /// Total number of blocks rejected by the processor.
    pub(crate) invalidated_blocks: Counter,
}

impl Default for TreeMetrics {
    fn default() -> Self {
        Self {
            head_number: gauge!("block_tree.head_number"),
            best_known_number: gauge!("block_tree.best_known_number"),
            suggested_blocks: counter!("block_tree.suggested_blocks"),
            promoted_blocks: counter!("block_tree.promoted_blocks"),
            invalidated_blocks: counter!("block_tree.invalidated_blocks"),
        }
    }
}

impl fmt::Debug for TreeMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeMetrics").finish_non_exhaustive()
    }
}
