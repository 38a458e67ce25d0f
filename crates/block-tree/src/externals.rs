//! Block tree externals.

use crate::pool::TransactionPool;
use lantern_primitives::ChainSpec;
use lantern_store::KeyValueStore;
use std::sync::Arc;

/// A container for external components.
///
/// This is a simple container for the stores and collaborators used
/// throughout the block tree implementation:
///
/// - `headers`: header bytes keyed by block hash
/// - `blocks`: body bytes keyed by block hash
/// - `meta`: chain levels keyed by 8-byte big-endian height, plus the head
///   and delete-pointer records
/// - the chain spec and the transaction pool seam
#[derive(Debug)]
pub struct TreeExternals<S> {
    /// Header store.
    pub(crate) headers: S,
    /// Block body store.
    pub(crate) blocks: S,
    /// Level and sentinel-record store.
    pub(crate) meta: S,
    /// Static chain parameters.
    pub(crate) chain_spec: Arc<ChainSpec>,
    /// Pool to drain when blocks reach the main chain.
    pub(crate) transaction_pool: Arc<dyn TransactionPool>,
}

impl<S: KeyValueStore> TreeExternals<S> {
    /// Creates new tree externals.
    pub fn new(
        headers: S,
        blocks: S,
        meta: S,
        chain_spec: Arc<ChainSpec>,
        transaction_pool: Arc<dyn TransactionPool>,
    ) -> Self {
        Self { headers, blocks, meta, chain_spec, transaction_pool }
    }
}
