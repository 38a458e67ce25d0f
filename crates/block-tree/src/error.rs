//! Error handling for the block tree.

use alloy_primitives::{BlockHash, BlockNumber};
use lantern_store::StoreError;

/// Various error cases that can occur when an operation violates tree
/// assumptions or the persisted index is damaged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlockTreeError {
    /// Thrown when a genesis block is suggested to a tree that already
    /// tracks a best suggested header.
    #[error("genesis block {hash} suggested to a non-empty tree")]
    GenesisAlreadyKnown {
        /// Hash of the rejected genesis block.
        hash: BlockHash,
    },
    /// Thrown when a genesis block does not match the hash pinned by the
    /// chain spec.
    #[error("genesis block {stored} does not match the chain spec genesis {expected}")]
    GenesisMismatch {
        /// Genesis hash pinned by the chain spec.
        expected: BlockHash,
        /// Genesis hash the tree was given.
        stored: BlockHash,
    },
    /// Thrown when a block promoted to the main chain has no entry in its
    /// chain level.
    #[error("block {hash} at height {number} is missing from its chain level")]
    BlockNotFoundInLevel {
        /// Height of the missing entry.
        number: BlockNumber,
        /// Hash of the missing entry.
        hash: BlockHash,
    },
    /// Thrown when a by-number lookup hits a level with competing forks and
    /// no main-chain block.
    #[error("cannot choose a block by number: level {number} holds {candidates} competing blocks")]
    AmbiguousBlockNumber {
        /// Height of the forked level.
        number: BlockNumber,
        /// Number of competing entries.
        candidates: usize,
    },
    /// Thrown when total difficulty accumulation reaches a gap in the
    /// stored headers.
    #[error("parent header {parent_hash} of {hash} is not stored")]
    OrphanedHeader {
        /// Hash of the header being accumulated.
        hash: BlockHash,
        /// Hash of the missing parent.
        parent_hash: BlockHash,
    },
    /// Thrown when a block reaches head selection without an accumulated
    /// difficulty.
    #[error("head candidate {hash} has no total difficulty")]
    MissingTotalDifficulty {
        /// Hash of the offending block.
        hash: BlockHash,
    },
    /// The head record's header is stored but has no entry in its chain
    /// level, so its total difficulty cannot be restored.
    #[error("head header {hash} has no entry in its chain level")]
    CorruptHeadRecord {
        /// Hash the head record points at.
        hash: BlockHash,
    },
    /// A stored record failed to decode.
    #[error("failed to decode stored record: {0}")]
    Decode(#[from] alloy_rlp::Error),
    /// Failure reported by one of the key-value stores.
    #[error(transparent)]
    Store(#[from] StoreError),
}
