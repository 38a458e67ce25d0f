use alloy_primitives::BlockHash;

/// Static chain parameters handed to the tree by the node builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSpec {
    /// Network identifier.
    pub chain_id: u64,
    /// Hash of the genesis block, when pinned by the spec. A pinned hash is
    /// enforced against every genesis the tree suggests or restores.
    pub genesis_hash: Option<BlockHash>,
}

impl ChainSpec {
    /// Creates a spec for the given network id.
    pub const fn new(chain_id: u64) -> Self {
        Self { chain_id, genesis_hash: None }
    }

    /// Pins the genesis hash the chain must start from.
    pub const fn with_genesis_hash(mut self, hash: BlockHash) -> Self {
        self.genesis_hash = Some(hash);
        self
    }
}

impl Default for ChainSpec {
    fn default() -> Self {
        Self::new(1)
    }
}
