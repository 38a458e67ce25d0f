//! Transaction pool seam.

use alloy_primitives::TxHash;
use std::fmt::Debug;

/// Handle the tree uses to drop transactions that were included in promoted
/// blocks.
pub trait TransactionPool: Send + Sync + Debug {
    /// Removes a mined transaction from the pool, if present.
    fn remove_transaction(&self, hash: TxHash);
}

/// A [`TransactionPool`] that ignores every removal.
#[derive(Debug, Clone, Copy, Default)]
#[non_exhaustive]
pub struct NoopTransactionPool;

impl TransactionPool for NoopTransactionPool {
    fn remove_transaction(&self, _hash: TxHash) {}
}
