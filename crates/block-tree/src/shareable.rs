//! Wrapper around [`BlockTree`] that allows for it to be shared.

use crate::{
    block_tree::{AddBlockOutcome, BlockTree},
    error::BlockTreeError,
    events::BlockTreeEvents,
};
use lantern_primitives::{BlockHash, BlockNumber, SealedBlock, SealedHeader};
use lantern_store::KeyValueStore;
use parking_lot::RwLock;
use std::sync::Arc;

/// Shareable block tree behind a reader-writer lock.
///
/// The lock serializes every level mutation: mutators, and lookups that may
/// repair a level entry, take the write half; plain viewers take the read
/// half. Clones share the same tree.
#[derive(Debug)]
pub struct ShareableBlockTree<S> {
    /// The wrapped tree.
    pub(crate) tree: Arc<RwLock<BlockTree<S>>>,
}

impl<S> Clone for ShareableBlockTree<S> {
    fn clone(&self) -> Self {
        Self { tree: Arc::clone(&self.tree) }
    }
}

impl<S: KeyValueStore + Clone> ShareableBlockTree<S> {
    /// Creates a new shareable tree.
    pub fn new(tree: BlockTree<S>) -> Self {
        Self { tree: Arc::new(RwLock::new(tree)) }
    }

    /// Suggests a header for inclusion in the tree.
    pub fn suggest_header(&self, header: SealedHeader) -> Result<AddBlockOutcome, BlockTreeError> {
        self.tree.write().suggest_header(header)
    }

    /// Suggests a block, storing its body alongside the header.
    pub fn suggest_block(
        &self,
        block: SealedBlock,
        should_process: bool,
    ) -> Result<AddBlockOutcome, BlockTreeError> {
        self.tree.write().suggest_block(block, should_process)
    }

    /// Promotes a contiguous run of processed blocks onto the main chain.
    pub fn update_main_chain(&self, blocks: &[SealedBlock]) -> Result<(), BlockTreeError> {
        self.tree.write().update_main_chain(blocks)
    }

    /// Removes a rejected block and all of its stored descendants.
    pub fn delete_invalid_block(&self, block: &SealedBlock) -> Result<(), BlockTreeError> {
        self.tree.write().delete_invalid_block(block)
    }

    /// Finds a stored header by hash.
    pub fn find_header(
        &self,
        hash: BlockHash,
        main_chain_only: bool,
    ) -> Result<Option<SealedHeader>, BlockTreeError> {
        self.tree.write().find_header(hash, main_chain_only)
    }

    /// Finds a stored block by hash.
    pub fn find_block(
        &self,
        hash: BlockHash,
        main_chain_only: bool,
    ) -> Result<Option<SealedBlock>, BlockTreeError> {
        self.tree.write().find_block(hash, main_chain_only)
    }

    /// Finds the main-chain (or unambiguous) header at `number`.
    pub fn find_header_by_number(
        &self,
        number: BlockNumber,
    ) -> Result<Option<SealedHeader>, BlockTreeError> {
        self.tree.write().find_header_by_number(number)
    }

    /// Finds the main-chain (or unambiguous) block at `number`.
    pub fn find_block_by_number(
        &self,
        number: BlockNumber,
    ) -> Result<Option<SealedBlock>, BlockTreeError> {
        self.tree.write().find_block_by_number(number)
    }

    /// Collects `count` headers walking from `start_hash` with stride
    /// `skip + 1`.
    pub fn find_headers(
        &self,
        start_hash: BlockHash,
        count: usize,
        skip: usize,
        reverse: bool,
    ) -> Result<Vec<Option<SealedHeader>>, BlockTreeError> {
        self.tree.write().find_headers(start_hash, count, skip, reverse)
    }

    /// Collects `count` blocks walking from `start_hash` with stride
    /// `skip + 1`.
    pub fn find_blocks(
        &self,
        start_hash: BlockHash,
        count: usize,
        skip: usize,
        reverse: bool,
    ) -> Result<Vec<Option<SealedBlock>>, BlockTreeError> {
        self.tree.write().find_blocks(start_hash, count, skip, reverse)
    }

    /// Header terminating the current main chain.
    pub fn head(&self) -> Option<SealedHeader> {
        self.tree.read().head().cloned()
    }

    /// The genesis header, once known.
    pub fn genesis(&self) -> Option<SealedHeader> {
        self.tree.read().genesis().cloned()
    }

    /// Known header with the highest total difficulty.
    pub fn best_suggested_header(&self) -> Option<SealedHeader> {
        self.tree.read().best_suggested_header().cloned()
    }

    /// Header of the best suggested block whose body is stored.
    pub fn best_suggested_block(&self) -> Option<SealedHeader> {
        self.tree.read().best_suggested_block().cloned()
    }

    /// Highest height for which a level exists.
    pub fn best_known_number(&self) -> BlockNumber {
        self.tree.read().best_known_number()
    }

    /// True while suggestions are being accepted.
    pub fn can_accept_new_blocks(&self) -> bool {
        self.tree.read().can_accept_new_blocks()
    }

    /// Network identifier, proxied from the chain spec.
    pub fn chain_id(&self) -> u64 {
        self.tree.read().chain_id()
    }

    /// Returns true if the block is already indexed.
    pub fn is_known_block(&self, number: BlockNumber, hash: BlockHash) -> Result<bool, BlockTreeError> {
        self.tree.read().is_known_block(number, hash)
    }

    /// Returns true if `hash` is the main-chain block at its height.
    pub fn is_main_chain(&self, hash: BlockHash) -> Result<bool, BlockTreeError> {
        self.tree.read().is_main_chain(hash)
    }

    /// Returns true if the indexed block was processed.
    pub fn was_processed(&self, number: BlockNumber, hash: BlockHash) -> Result<bool, BlockTreeError> {
        self.tree.read().was_processed(number, hash)
    }

    /// Registers a new event subscriber.
    pub fn subscribe_events(&self) -> BlockTreeEvents {
        self.tree.read().subscribe_events()
    }
}
