#![warn(missing_docs, unreachable_pub)]
#![deny(unused_must_use, rust_2018_idioms)]
//! Commonly used types for the lantern block tree.
//!
//! Headers and bodies are content-addressed by the keccak hash of their RLP
//! encoding; [`ChainLevelInfo`] is the persisted per-height index of every
//! block known at that height.

mod block;
pub use block::{Block, BlockBody, SealedBlock, Transaction};

mod header;
pub use header::{Header, SealedHeader};

mod level;
pub use level::{BlockInfo, ChainLevelInfo};

mod spec;
pub use spec::ChainSpec;

pub use alloy_eips::BlockNumHash;
pub use alloy_primitives::{Address, BlockHash, BlockNumber, Bytes, TxHash, B256, U256};
