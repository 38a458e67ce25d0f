#![warn(missing_docs, unreachable_pub)]
#![deny(unused_must_use, rust_2018_idioms)]
//! Implementation of a height-indexed tree of blocks for a chain client.
//!
//! The [`BlockTree`] tracks every known block header and body, organizes
//! them into per-height levels that fan out across competing forks, and
//! promotes the heaviest processed chain to be the main chain by cumulative
//! proof-of-work difficulty. State is persisted through three byte-keyed
//! store namespaces and fronted by bounded caches; a crash between store
//! writes is healed lazily on load.
//!
//! Consumers share the tree through [`ShareableBlockTree`], which serializes
//! writers behind a single reader-writer lock, and observe suggestions,
//! promotions, and head changes through the event channel.

pub mod block_tree;
pub use block_tree::{AddBlockOutcome, BlockTree, DELETE_POINTER_KEY, HEAD_KEY};

pub mod cache;
pub use cache::TreeCache;

pub mod config;
pub use config::{
    BlockTreeConfig, DEFAULT_CACHE_CAPACITY, DEFAULT_LOAD_BATCH_SIZE, FAST_SYNC_TAIL,
};

pub mod error;
pub use error::BlockTreeError;

pub mod events;
pub use events::{BlockTreeEvent, BlockTreeEvents, EventSender};

pub mod externals;
pub use externals::TreeExternals;

mod level_index;
mod loader;
mod metrics;
#[cfg(test)]
mod test_utils;

pub mod pool;
pub use pool::{NoopTransactionPool, TransactionPool};

pub mod shareable;
pub use shareable::ShareableBlockTree;
