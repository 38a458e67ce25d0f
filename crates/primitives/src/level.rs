use alloy_primitives::{BlockHash, U256};
use alloy_rlp::{RlpDecodable, RlpEncodable};

/// Index entry for one block known at a height.
///
/// Belongs to exactly one [`ChainLevelInfo`]; the accumulated difficulty is
/// fixed at suggestion time and is the value lookups re-attach to loaded
/// headers.
#[derive(Debug, Clone, PartialEq, Eq, RlpEncodable, RlpDecodable)]
pub struct BlockInfo {
    /// Hash of the indexed block.
    pub block_hash: BlockHash,
    /// Sum of per-block difficulties from genesis up to this block.
    pub total_difficulty: U256,
    /// True once the processor has validated and executed the block.
    pub was_processed: bool,
}

/// The per-height index of all blocks known at that height.
///
/// When `has_block_on_main_chain` is set, the first entry of `block_infos`
/// is the main-chain block; all others are fork siblings. The encoding of
/// this type is the on-disk level format and must stay stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, RlpEncodable, RlpDecodable)]
pub struct ChainLevelInfo {
    /// True if one of the entries belongs to the main chain.
    pub has_block_on_main_chain: bool,
    /// All blocks known at this height.
    pub block_infos: Vec<BlockInfo>,
}

impl ChainLevelInfo {
    /// Creates a detached level holding a single block.
    pub fn new(info: BlockInfo) -> Self {
        Self { has_block_on_main_chain: false, block_infos: vec![info] }
    }

    /// Returns the main-chain entry, if the level has one.
    pub fn main_block_info(&self) -> Option<&BlockInfo> {
        self.has_block_on_main_chain.then(|| self.block_infos.first()).flatten()
    }

    /// Returns the position of the entry with the given hash.
    pub fn find_index(&self, hash: &BlockHash) -> Option<usize> {
        self.block_infos.iter().position(|info| &info.block_hash == hash)
    }

    /// Returns true if an entry with the given hash exists.
    pub fn contains(&self, hash: &BlockHash) -> bool {
        self.find_index(hash).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_rlp::Decodable;

    fn info(byte: u8, td: u64, processed: bool) -> BlockInfo {
        BlockInfo {
            block_hash: BlockHash::repeat_byte(byte),
            total_difficulty: U256::from(td),
            was_processed: processed,
        }
    }

    #[test]
    fn level_round_trips() {
        let level = ChainLevelInfo {
            has_block_on_main_chain: true,
            block_infos: vec![info(1, 100, true), info(2, 90, false)],
        };
        let encoded = alloy_rlp::encode(&level);
        let decoded = ChainLevelInfo::decode(&mut encoded.as_slice()).unwrap();
        assert_eq!(decoded, level);
    }

    #[test]
    fn main_block_requires_flag() {
        let mut level = ChainLevelInfo::new(info(1, 10, false));
        assert!(level.main_block_info().is_none());

        level.has_block_on_main_chain = true;
        assert_eq!(level.main_block_info().unwrap().block_hash, BlockHash::repeat_byte(1));
    }

    #[test]
    fn find_index_scans_in_order() {
        let level = ChainLevelInfo {
            has_block_on_main_chain: false,
            block_infos: vec![info(1, 10, false), info(2, 20, false)],
        };
        assert_eq!(level.find_index(&BlockHash::repeat_byte(2)), Some(1));
        assert_eq!(level.find_index(&BlockHash::repeat_byte(9)), None);
        assert!(level.contains(&BlockHash::repeat_byte(1)));
    }
}
