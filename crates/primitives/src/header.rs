use alloy_eips::BlockNumHash;
use alloy_primitives::{keccak256, BlockHash, BlockNumber, Bytes, B256, U256};
use alloy_rlp::{Decodable, Encodable, RlpDecodable, RlpEncodable};
use bytes::BufMut;
use derive_more::{AsRef, Deref};

/// Block header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, RlpEncodable, RlpDecodable)]
pub struct Header {
    /// Hash of the parent header.
    pub parent_hash: B256,
    /// Root of the post-execution state.
    pub state_root: B256,
    /// Root of the block's transaction list.
    pub transactions_root: B256,
    /// Height of the block.
    pub number: BlockNumber,
    /// Proof-of-work difficulty target of this block.
    pub difficulty: U256,
    /// Gas ceiling of the block.
    pub gas_limit: u64,
    /// Gas spent by all transactions in the block.
    pub gas_used: u64,
    /// Unix timestamp of sealing.
    pub timestamp: u64,
    /// Arbitrary sealer payload.
    pub extra_data: Bytes,
    /// Proof-of-work nonce.
    pub nonce: u64,
}

impl Header {
    /// Returns true if this header is at height zero.
    pub const fn is_genesis(&self) -> bool {
        self.number == 0
    }

    /// Heavy function that hashes the RLP encoding of the header.
    pub fn hash_slow(&self) -> BlockHash {
        keccak256(alloy_rlp::encode(self))
    }

    /// Seals the header with its computed hash.
    pub fn seal_slow(self) -> SealedHeader {
        let hash = self.hash_slow();
        SealedHeader::new(self, hash)
    }

    /// Seals the header with the given known hash.
    ///
    /// The hash is not verified against the header contents.
    pub const fn seal(self, hash: BlockHash) -> SealedHeader {
        SealedHeader::new(self, hash)
    }
}

/// A [`Header`] that is sealed at a precalculated hash, use
/// [`SealedHeader::unseal()`] if you want to modify the header.
///
/// The accumulated chain difficulty is carried alongside the sealed fields.
/// It is derived from the block's level entry on load and is never part of
/// the persisted header bytes.
#[derive(Debug, Clone, PartialEq, Eq, AsRef, Deref)]
pub struct SealedHeader {
    /// Locked header hash.
    hash: BlockHash,
    /// Locked header fields.
    #[as_ref]
    #[deref]
    header: Header,
    /// Sum of per-block difficulties from genesis up to and including this
    /// header, when known.
    total_difficulty: Option<U256>,
}

impl SealedHeader {
    /// Creates the sealed header with the corresponding block hash.
    pub const fn new(header: Header, hash: BlockHash) -> Self {
        Self { header, hash, total_difficulty: None }
    }

    /// Returns the sealed header fields.
    pub const fn header(&self) -> &Header {
        &self.header
    }

    /// Returns the header hash.
    pub const fn hash(&self) -> BlockHash {
        self.hash
    }

    /// Returns the number and hash tuple.
    pub const fn num_hash(&self) -> BlockNumHash {
        BlockNumHash { number: self.header.number, hash: self.hash }
    }

    /// Returns the number and hash of the parent.
    pub const fn parent_num_hash(&self) -> BlockNumHash {
        BlockNumHash { number: self.header.number.saturating_sub(1), hash: self.header.parent_hash }
    }

    /// Returns the accumulated chain difficulty, if it has been attached.
    pub const fn total_difficulty(&self) -> Option<U256> {
        self.total_difficulty
    }

    /// Attaches the accumulated chain difficulty.
    pub fn set_total_difficulty(&mut self, total_difficulty: U256) {
        self.total_difficulty = Some(total_difficulty);
    }

    /// Returns the sealed header with the accumulated chain difficulty attached.
    pub const fn with_total_difficulty(mut self, total_difficulty: U256) -> Self {
        self.total_difficulty = Some(total_difficulty);
        self
    }

    /// Extracts the raw header that can be modified.
    pub fn unseal(self) -> Header {
        self.header
    }
}

impl Encodable for SealedHeader {
    fn encode(&self, out: &mut dyn BufMut) {
        self.header.encode(out);
    }
}

impl Decodable for SealedHeader {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let b = &mut &**buf;
        let started_len = buf.len();

        let header = Header::decode(b)?;

        // hash the consumed bytes, the rlp encoded header
        let consumed = started_len - b.len();
        let hash = keccak256(&buf[..consumed]);

        *buf = *b;

        Ok(Self { header, hash, total_difficulty: None })
    }
}
