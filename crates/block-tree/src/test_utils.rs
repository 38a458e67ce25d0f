//! Shared helpers for tree tests.

use crate::{
    block_tree::{AddBlockOutcome, BlockTree},
    config::BlockTreeConfig,
    externals::TreeExternals,
    pool::NoopTransactionPool,
};
use lantern_primitives::{
    Block, BlockBody, ChainSpec, Header, SealedBlock, SealedHeader, Transaction, U256,
};
use lantern_store::MemoryStore;
use rand::{thread_rng, Rng};
use std::sync::Arc;

/// The three store namespaces of a test tree, kept around so a test can
/// tamper with persisted bytes or reopen the tree over the same data.
pub(crate) struct TestStores {
    pub(crate) headers: MemoryStore,
    pub(crate) blocks: MemoryStore,
    pub(crate) meta: MemoryStore,
}

impl TestStores {
    pub(crate) fn new() -> Self {
        Self { headers: MemoryStore::new(), blocks: MemoryStore::new(), meta: MemoryStore::new() }
    }

    pub(crate) fn externals(&self) -> TreeExternals<MemoryStore> {
        TreeExternals::new(
            self.headers.clone(),
            self.blocks.clone(),
            self.meta.clone(),
            Arc::new(ChainSpec::new(1)),
            Arc::new(NoopTransactionPool),
        )
    }
}

pub(crate) fn setup() -> (BlockTree<MemoryStore>, TestStores) {
    let stores = TestStores::new();
    let tree = BlockTree::new(stores.externals(), BlockTreeConfig::default()).unwrap();
    (tree, stores)
}

pub(crate) fn genesis() -> SealedBlock {
    Block {
        header: Header {
            difficulty: U256::from(1),
            timestamp: 1_600_000_000,
            gas_limit: 8_000_000,
            ..Default::default()
        },
        body: BlockBody::default(),
    }
    .seal_slow()
}

/// Builds a child of `parent` carrying one random transaction.
pub(crate) fn child(parent: &SealedHeader, difficulty: u64) -> SealedBlock {
    let mut rng = thread_rng();
    let transaction = Transaction {
        nonce: rng.gen(),
        gas_limit: 21_000,
        value: U256::from(rng.gen::<u32>()),
        ..Default::default()
    };
    Block {
        header: Header {
            parent_hash: parent.hash(),
            number: parent.number + 1,
            difficulty: U256::from(difficulty),
            timestamp: parent.timestamp + 12,
            gas_limit: 8_000_000,
            gas_used: 21_000,
            nonce: rng.gen(),
            ..Default::default()
        },
        body: BlockBody { transactions: vec![transaction] },
    }
    .seal_slow()
}

/// Suggests and promotes genesis plus `length` children, each with
/// difficulty 100.
pub(crate) fn grow_chain(tree: &mut BlockTree<MemoryStore>, length: usize) -> Vec<SealedBlock> {
    let mut blocks = vec![genesis()];
    tree.suggest_block(blocks[0].clone(), true).unwrap();
    tree.update_main_chain(&[blocks[0].clone()]).unwrap();
    for _ in 0..length {
        let block = child(&blocks.last().unwrap().header, 100);
        assert_eq!(tree.suggest_block(block.clone(), true).unwrap(), AddBlockOutcome::Added);
        tree.update_main_chain(&[block.clone()]).unwrap();
        blocks.push(block);
    }
    blocks
}
