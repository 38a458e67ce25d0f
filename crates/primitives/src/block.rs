use crate::{Header, SealedHeader};
use alloy_eips::BlockNumHash;
use alloy_primitives::{keccak256, Address, BlockHash, Bytes, TxHash, U256};
use alloy_rlp::{RlpDecodable, RlpEncodable};
use derive_more::{AsRef, Deref};

/// A signed transaction as committed into a block body.
///
/// The tree treats transactions as opaque payloads; only the content hash is
/// ever consulted.
#[derive(Debug, Clone, Default, PartialEq, Eq, RlpEncodable, RlpDecodable)]
pub struct Transaction {
    /// Sender nonce.
    pub nonce: u64,
    /// Gas allowance of the transaction.
    pub gas_limit: u64,
    /// Recipient address.
    pub to: Address,
    /// Transferred value.
    pub value: U256,
    /// Call data.
    pub input: Bytes,
}

impl Transaction {
    /// Heavy function that hashes the RLP encoding of the transaction.
    pub fn hash(&self) -> TxHash {
        keccak256(alloy_rlp::encode(self))
    }
}

/// The body of a block: the ordered transaction list.
#[derive(Debug, Clone, Default, PartialEq, Eq, RlpEncodable, RlpDecodable)]
pub struct BlockBody {
    /// Transactions in the block.
    pub transactions: Vec<Transaction>,
}

/// A block: header plus body.
#[derive(Debug, Clone, Default, PartialEq, Eq, RlpEncodable, RlpDecodable)]
pub struct Block {
    /// Block header.
    pub header: Header,
    /// Block body.
    pub body: BlockBody,
}

impl Block {
    /// Seals the block with the computed header hash.
    pub fn seal_slow(self) -> SealedBlock {
        SealedBlock { header: self.header.seal_slow(), body: self.body }
    }

    /// Seals the block with the given known header hash.
    pub fn seal(self, hash: BlockHash) -> SealedBlock {
        SealedBlock { header: self.header.seal(hash), body: self.body }
    }
}

/// A block sealed at its header hash.
#[derive(Debug, Clone, PartialEq, Eq, AsRef, Deref)]
pub struct SealedBlock {
    /// Sealed header.
    #[as_ref]
    #[deref]
    pub header: SealedHeader,
    /// Block body.
    pub body: BlockBody,
}

impl SealedBlock {
    /// Creates a sealed block from its sealed header and body.
    pub const fn new(header: SealedHeader, body: BlockBody) -> Self {
        Self { header, body }
    }

    /// Returns the block hash.
    pub const fn hash(&self) -> BlockHash {
        self.header.hash()
    }

    /// Returns the number and hash tuple.
    pub const fn num_hash(&self) -> BlockNumHash {
        self.header.num_hash()
    }

    /// Returns the number and hash of the parent.
    pub const fn parent_num_hash(&self) -> BlockNumHash {
        self.header.parent_num_hash()
    }

    /// Splits the block into its sealed header and body.
    pub fn split(self) -> (SealedHeader, BlockBody) {
        (self.header, self.body)
    }

    /// Unseals the block.
    pub fn unseal(self) -> Block {
        Block { header: self.header.unseal(), body: self.body }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_rlp::Decodable;

    #[test]
    fn transaction_hash_tracks_contents() {
        let a = Transaction { nonce: 0, ..Default::default() };
        let b = Transaction { nonce: 1, ..Default::default() };
        assert_ne!(a.hash(), b.hash());
        assert_eq!(a.hash(), a.clone().hash());
    }

    #[test]
    fn body_round_trips() {
        let body = BlockBody {
            transactions: vec![
                Transaction { nonce: 3, gas_limit: 21_000, value: U256::from(10), ..Default::default() },
                Transaction::default(),
            ],
        };
        let encoded = alloy_rlp::encode(&body);
        let decoded = BlockBody::decode(&mut encoded.as_slice()).unwrap();
        assert_eq!(decoded, body);
    }
}
