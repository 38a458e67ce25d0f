//! Implementation of [`BlockTree`].

use crate::{
    cache::TreeCache,
    config::BlockTreeConfig,
    error::BlockTreeError,
    events::{BlockTreeEvent, BlockTreeEvents, EventSender},
    externals::TreeExternals,
    level_index::LevelIndex,
    metrics::TreeMetrics,
};
use alloy_primitives::{BlockHash, BlockNumber, B256, U256};
use alloy_rlp::Decodable;
use bytes::Bytes;
use lantern_primitives::{BlockBody, BlockInfo, Header, SealedBlock, SealedHeader};
use lantern_store::KeyValueStore;
use std::collections::{HashMap, HashSet};
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

/// Meta-store key holding the hash of the current head block.
pub const HEAD_KEY: B256 = B256::ZERO;

/// Meta-store key holding the resumable invalid-chain cleanup pointer.
pub const DELETE_POINTER_KEY: B256 = B256::repeat_byte(0xff);

/// Status of a suggested block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddBlockOutcome {
    /// The block was stored and appended to its level.
    Added,
    /// The block is already indexed.
    AlreadyKnown,
    /// The parent is not indexed; the caller should retry once the gap is
    /// filled.
    UnknownParent,
    /// The block was previously rejected by the processor.
    InvalidBlock,
    /// The tree is not accepting new blocks while a startup replay or an
    /// invalidation is in progress.
    CannotAccept,
}

/// One replayed height during startup load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LevelReplay {
    /// A full block was re-suggested to the processor.
    FullBlock,
    /// Only the header is stored (fast-sync artifact).
    HeaderOnly,
    /// The level or its objects are gone; replay must stop.
    Exhausted,
}

/// Tree of all known block headers and bodies, indexed by height.
///
/// Every height maps to a chain level that fans out across competing forks;
/// the main chain is the sequence of first-position level entries selected
/// by cumulative proof-of-work difficulty. The tree keeps four
/// representations in sync: the bounded caches, the header store, the body
/// store, and the level index in the meta store.
///
/// main functions:
/// * [`BlockTree::suggest_block`]: store a block and append it to its level,
///   advancing the best suggested header on a difficulty win.
/// * [`BlockTree::update_main_chain`]: promote a contiguous run of processed
///   blocks, re-pointing levels at the new fork and advancing the head.
/// * [`BlockTree::delete_invalid_block`]: remove a rejected block and all of
///   its stored descendants, resumable across a crash.
#[derive(Debug)]
pub struct BlockTree<S> {
    /// External stores and collaborators.
    externals: TreeExternals<S>,
    /// Height-indexed chain levels and the known frontier.
    levels: LevelIndex<S>,
    /// Bounded header cache keyed by hash.
    header_cache: TreeCache<BlockHash, SealedHeader>,
    /// Bounded block cache keyed by hash.
    block_cache: TreeCache<BlockHash, SealedBlock>,
    /// Blocks rejected by the processor, by height. Not persisted.
    invalid_blocks: HashMap<BlockNumber, HashSet<BlockHash>>,
    /// Header terminating the current main chain.
    head: Option<SealedHeader>,
    /// The genesis header, once known.
    genesis: Option<SealedHeader>,
    /// Known header with the highest total difficulty.
    best_suggested_header: Option<SealedHeader>,
    /// Header of the best suggested block whose body is stored and queued
    /// for processing.
    best_suggested_block: Option<SealedHeader>,
    /// Gate closed during startup replay and invalid-chain cleanup.
    can_accept_new_blocks: bool,
    /// Armed by the startup loader; fulfilled when the head reaches the
    /// batch end.
    db_load_batch: Option<(BlockNumber, oneshot::Sender<()>)>,
    /// Tree configuration.
    config: BlockTreeConfig,
    event_sender: EventSender<BlockTreeEvent>,
    metrics: TreeMetrics,
}

impl<S: KeyValueStore + Clone> BlockTree<S> {
    /// Opens the tree over existing stores.
    ///
    /// An interrupted invalid-chain cleanup is resumed before anything else
    /// is read. The head is then restored from its meta record, the level
    /// frontier is rediscovered by probing the meta store, and the genesis
    /// header is reloaded from level zero.
    pub fn new(externals: TreeExternals<S>, config: BlockTreeConfig) -> Result<Self, BlockTreeError> {
        let levels = LevelIndex::new(externals.meta.clone(), config.cache_capacity());
        let mut this = Self {
            levels,
            header_cache: TreeCache::new(config.cache_capacity()),
            block_cache: TreeCache::new(config.cache_capacity()),
            invalid_blocks: HashMap::default(),
            head: None,
            genesis: None,
            best_suggested_header: None,
            best_suggested_block: None,
            can_accept_new_blocks: true,
            db_load_batch: None,
            config,
            event_sender: EventSender::default(),
            metrics: TreeMetrics::default(),
            externals,
        };

        if let Some(pointer) = this.delete_pointer()? {
            debug!(target: "block_tree", ?pointer, "Resuming interrupted invalid chain cleanup");
            this.clean_invalid_blocks(pointer)?;
        }
        this.restore_head()?;
        let head_number = this.head.as_ref().map(|header| header.number).unwrap_or_default();
        this.levels.rediscover_best_known(head_number)?;
        this.restore_genesis()?;
        this.best_suggested_header = this.head.clone();
        this.best_suggested_block = this.head.clone();

        this.metrics.head_number.set(head_number as f64);
        this.metrics.best_known_number.set(this.levels.best_known_number() as f64);
        Ok(this)
    }

    /// Header terminating the current main chain.
    pub fn head(&self) -> Option<&SealedHeader> {
        self.head.as_ref()
    }

    /// The genesis header, once known.
    pub fn genesis(&self) -> Option<&SealedHeader> {
        self.genesis.as_ref()
    }

    /// Known header with the highest total difficulty.
    pub fn best_suggested_header(&self) -> Option<&SealedHeader> {
        self.best_suggested_header.as_ref()
    }

    /// Header of the best suggested block whose body is stored.
    pub fn best_suggested_block(&self) -> Option<&SealedHeader> {
        self.best_suggested_block.as_ref()
    }

    /// Highest height for which a level exists.
    pub fn best_known_number(&self) -> BlockNumber {
        self.levels.best_known_number()
    }

    /// True while suggestions are being accepted.
    pub fn can_accept_new_blocks(&self) -> bool {
        self.can_accept_new_blocks
    }

    /// Tree configuration.
    pub fn config(&self) -> &BlockTreeConfig {
        &self.config
    }

    /// Network identifier, proxied from the chain spec.
    pub fn chain_id(&self) -> u64 {
        self.externals.chain_spec.chain_id
    }

    /// Registers a new event subscriber.
    pub fn subscribe_events(&self) -> BlockTreeEvents {
        self.event_sender.subscribe()
    }

    /// Suggests a header for inclusion in the tree.
    pub fn suggest_header(&mut self, header: SealedHeader) -> Result<AddBlockOutcome, BlockTreeError> {
        self.suggest(header, None, true)
    }

    /// Suggests a block, storing its body alongside the header.
    ///
    /// With `should_process` the block becomes a processing candidate when
    /// it wins the difficulty comparison; without it only the header race is
    /// updated.
    pub fn suggest_block(
        &mut self,
        block: SealedBlock,
        should_process: bool,
    ) -> Result<AddBlockOutcome, BlockTreeError> {
        let (header, body) = block.split();
        self.suggest(header, Some(body), should_process)
    }

    fn suggest(
        &mut self,
        mut header: SealedHeader,
        body: Option<BlockBody>,
        should_process: bool,
    ) -> Result<AddBlockOutcome, BlockTreeError> {
        trace!(target: "block_tree", hash = ?header.hash(), number = header.number, "Suggesting block");

        if !self.can_accept_new_blocks {
            return Ok(AddBlockOutcome::CannotAccept)
        }
        if self.is_invalid(header.number, header.hash()) {
            return Ok(AddBlockOutcome::InvalidBlock)
        }
        if header.is_genesis() {
            if self.best_suggested_header.is_some() {
                return Err(BlockTreeError::GenesisAlreadyKnown { hash: header.hash() })
            }
            self.check_pinned_genesis(header.hash())?;
        } else {
            if self.is_known_block(header.number, header.hash())? {
                return Ok(AddBlockOutcome::AlreadyKnown)
            }
            if !self.is_known_block(header.number - 1, header.parent_hash)? {
                return Ok(AddBlockOutcome::UnknownParent)
            }
        }

        let total_difficulty = self.accumulate_total_difficulty(&header)?;
        header.set_total_difficulty(total_difficulty);

        if let Some(body) = &body {
            self.externals.blocks.put(header.hash().as_slice(), alloy_rlp::encode(body).into())?;
        }
        self.externals
            .headers
            .put(header.hash().as_slice(), alloy_rlp::encode(header.header()).into())?;

        let cache = self.should_cache(header.number);
        if cache {
            self.header_cache.insert(header.hash(), header.clone());
            if let Some(body) = &body {
                self.block_cache.insert(header.hash(), SealedBlock::new(header.clone(), body.clone()));
            }
        }

        self.levels.update_or_create(
            header.number,
            BlockInfo { block_hash: header.hash(), total_difficulty, was_processed: false },
            cache,
        )?;

        let best = self
            .best_suggested_header
            .as_ref()
            .and_then(|header| header.total_difficulty())
            .unwrap_or(U256::ZERO);
        if header.is_genesis() || total_difficulty > best {
            self.best_suggested_header = Some(header.clone());
            if body.is_some() && should_process {
                self.best_suggested_block = Some(header.clone());
            }
            self.event_sender.notify(BlockTreeEvent::NewBestSuggested(header));
        }

        self.metrics.suggested_blocks.increment(1);
        self.metrics.best_known_number.set(self.levels.best_known_number() as f64);
        Ok(AddBlockOutcome::Added)
    }

    /// Promotes a contiguous run of processed blocks onto the main chain.
    ///
    /// The run must be strictly ascending or strictly descending by height.
    /// When the run terminates below the previous head, the stale tail of
    /// the old main branch is detached first.
    pub fn update_main_chain(&mut self, blocks: &[SealedBlock]) -> Result<(), BlockTreeError> {
        let Some(last_number) = blocks.iter().map(|block| block.number).max() else {
            return Ok(())
        };
        let previous_head = self.head.as_ref().map(|header| header.number).unwrap_or_default();
        trace!(
            target: "block_tree",
            blocks = blocks.len(),
            last_number,
            previous_head,
            "Updating main chain"
        );

        if previous_head > last_number {
            for number in (last_number + 1)..=previous_head {
                match self.levels.load_forced(number)? {
                    Some(mut level) => {
                        level.has_block_on_main_chain = false;
                        let cache = self.should_cache(number);
                        self.levels.persist(number, &level, cache)?;
                    }
                    None => {
                        warn!(target: "block_tree", number, "Missing level while detaching old main chain")
                    }
                }
            }
        }

        for block in blocks {
            if self.should_cache(block.number) {
                self.block_cache.insert(block.hash(), block.clone());
                self.header_cache.insert(block.hash(), block.header.clone());
            }
            self.move_to_main(block)?;
        }
        Ok(())
    }

    /// Makes the block the main-chain block at its height.
    fn move_to_main(&mut self, block: &SealedBlock) -> Result<(), BlockTreeError> {
        trace!(target: "block_tree", hash = ?block.hash(), number = block.number, "Moving block to main chain");
        let number = block.number;
        let not_found = BlockTreeError::BlockNotFoundInLevel { number, hash: block.hash() };
        let mut level = self.levels.load_forced(number)?.ok_or(not_found.clone())?;
        let index = level.find_index(&block.hash()).ok_or(not_found)?;

        level.block_infos[index].was_processed = true;
        if index != 0 {
            level.block_infos.swap(0, index);
        }
        level.has_block_on_main_chain = true;
        let total_difficulty = level.block_infos[0].total_difficulty;
        let cache = self.should_cache(number);
        self.levels.persist(number, &level, cache)?;

        let mut block = block.clone();
        block.header.set_total_difficulty(total_difficulty);
        self.event_sender.notify(BlockTreeEvent::BlockAddedToMain(block.clone()));

        let head_difficulty = self
            .head
            .as_ref()
            .and_then(|header| header.total_difficulty())
            .unwrap_or(U256::ZERO);
        if block.is_genesis() || total_difficulty > head_difficulty {
            self.update_head_block(&block)?;
        }

        for transaction in &block.body.transactions {
            self.externals.transaction_pool.remove_transaction(transaction.hash());
        }
        self.metrics.promoted_blocks.increment(1);
        Ok(())
    }

    /// Advances the head to the given block.
    fn update_head_block(&mut self, block: &SealedBlock) -> Result<(), BlockTreeError> {
        if block.total_difficulty().is_none() {
            return Err(BlockTreeError::MissingTotalDifficulty { hash: block.hash() })
        }
        let header = block.header.clone();
        debug!(target: "block_tree", hash = ?header.hash(), number = header.number, "New head block");

        if header.is_genesis() {
            self.genesis = Some(header.clone());
        }
        self.head = Some(header.clone());
        self.externals
            .meta
            .put(HEAD_KEY.as_slice(), Bytes::copy_from_slice(header.hash().as_slice()))?;
        self.metrics.head_number.set(header.number as f64);
        self.event_sender.notify(BlockTreeEvent::NewHead(header.clone()));

        if let Some((batch_end, _)) = &self.db_load_batch {
            if header.number == *batch_end {
                if let Some((_, done)) = self.db_load_batch.take() {
                    let _ = done.send(());
                }
            }
        }
        Ok(())
    }

    /// Marks the block as rejected by the processor and removes it together
    /// with all of its stored descendants.
    ///
    /// The best suggested pointers are reset to the head so the pipeline
    /// re-proposes from a valid branch; suggestions are rejected for the
    /// duration of the cleanup.
    pub fn delete_invalid_block(&mut self, block: &SealedBlock) -> Result<(), BlockTreeError> {
        debug!(target: "block_tree", hash = ?block.hash(), number = block.number, "Deleting invalid block");
        self.invalid_blocks.entry(block.number).or_default().insert(block.hash());
        self.metrics.invalidated_blocks.increment(1);

        self.best_suggested_header = self.head.clone();
        self.best_suggested_block = self.head.clone();

        self.can_accept_new_blocks = false;
        let result = self.clean_invalid_blocks(block.hash());
        self.can_accept_new_blocks = true;
        result
    }

    /// Removes the chain starting at `start_hash` from all four
    /// representations, walking parent pointers toward higher heights.
    ///
    /// The descendant hash is recorded under [`DELETE_POINTER_KEY`] before
    /// each removal so an interrupted run resumes on the next open.
    pub(crate) fn clean_invalid_blocks(&mut self, start_hash: BlockHash) -> Result<(), BlockTreeError> {
        let mut current_hash = start_hash;
        loop {
            let Some(current) = self.load_header_raw(current_hash)? else {
                warn!(target: "block_tree", hash = ?current_hash, "Cleanup pointer at already removed block");
                self.externals.meta.delete(DELETE_POINTER_KEY.as_slice())?;
                return Ok(())
            };
            let number = current.number;
            let current_level = self.levels.load_forced(number)?;
            let next_level = self.levels.load_forced(number + 1)?;

            // locate the descendant before the current objects disappear
            let next_hash = match &next_level {
                Some(level) if level.block_infos.len() == 1 => Some(level.block_infos[0].block_hash),
                Some(level) => {
                    let mut found = None;
                    for info in &level.block_infos {
                        let candidate = self.load_header_raw(info.block_hash)?;
                        if candidate.is_some_and(|header| header.parent_hash == current_hash) {
                            found = Some(info.block_hash);
                            break
                        }
                    }
                    found
                }
                None => None,
            };

            match next_hash {
                Some(next) => self
                    .externals
                    .meta
                    .put(DELETE_POINTER_KEY.as_slice(), Bytes::copy_from_slice(next.as_slice()))?,
                None => self.externals.meta.delete(DELETE_POINTER_KEY.as_slice())?,
            }

            if let Some(mut level) = current_level {
                if level.block_infos.len() == 1 {
                    self.levels.remove(number)?;
                    if self.levels.best_known_number() >= number {
                        self.levels.set_best_known_number(number.saturating_sub(1));
                        self.metrics.best_known_number.set(self.levels.best_known_number() as f64);
                    }
                } else {
                    level.block_infos.retain(|info| info.block_hash != current_hash);
                    self.levels.persist(number, &level, false)?;
                }
            }

            self.block_cache.remove(&current_hash);
            self.header_cache.remove(&current_hash);
            self.externals.blocks.delete(current_hash.as_slice())?;
            self.externals.headers.delete(current_hash.as_slice())?;
            debug!(target: "block_tree", hash = ?current_hash, number, "Removed invalid block");

            match next_hash {
                Some(next) => current_hash = next,
                None => return Ok(()),
            }
        }
    }

    /// Returns true if the block is already indexed.
    pub fn is_known_block(&self, number: BlockNumber, hash: BlockHash) -> Result<bool, BlockTreeError> {
        if number > self.levels.best_known_number() {
            return Ok(false)
        }
        if self.head.as_ref().is_some_and(|header| header.hash() == hash) {
            return Ok(true)
        }
        if self.header_cache.contains(&hash) {
            return Ok(true)
        }
        Ok(self.levels.load(number)?.is_some_and(|level| level.contains(&hash)))
    }

    /// Returns true if `hash` is the main-chain block at its height.
    pub fn is_main_chain(&self, hash: BlockHash) -> Result<bool, BlockTreeError> {
        let Some(header) = self.load_header_raw(hash)? else { return Ok(false) };
        self.is_main_chain_at(header.number, hash)
    }

    /// Returns true if the indexed block was processed.
    pub fn was_processed(&self, number: BlockNumber, hash: BlockHash) -> Result<bool, BlockTreeError> {
        let not_found = BlockTreeError::BlockNotFoundInLevel { number, hash };
        let level = self.levels.load_forced(number)?.ok_or(not_found.clone())?;
        let index = level.find_index(&hash).ok_or(not_found)?;
        Ok(level.block_infos[index].was_processed)
    }

    /// Finds a stored header by hash, attaching its accumulated difficulty.
    ///
    /// With `main_chain_only`, the header is returned only when it is the
    /// main-chain block at its height.
    pub fn find_header(
        &mut self,
        hash: BlockHash,
        main_chain_only: bool,
    ) -> Result<Option<SealedHeader>, BlockTreeError> {
        if hash.is_zero() {
            return Ok(None)
        }
        let Some(mut header) = self.load_header_raw(hash)? else { return Ok(None) };
        let info = match self.stored_block_info(header.number, hash)? {
            Some(info) => info,
            None => self.repair_block_info(&header)?,
        };
        header.set_total_difficulty(info.total_difficulty);

        if main_chain_only && !self.is_main_chain_at(header.number, hash)? {
            return Ok(None)
        }
        Ok(Some(header))
    }

    /// Finds a stored block by hash.
    pub fn find_block(
        &mut self,
        hash: BlockHash,
        main_chain_only: bool,
    ) -> Result<Option<SealedBlock>, BlockTreeError> {
        if hash.is_zero() {
            return Ok(None)
        }
        // the header lookup attaches the total difficulty and performs any
        // pending level repair
        let Some(header) = self.find_header(hash, main_chain_only)? else { return Ok(None) };
        if let Some(mut block) = self.block_cache.get(&hash) {
            if let Some(total_difficulty) = header.total_difficulty() {
                block.header.set_total_difficulty(total_difficulty);
            }
            return Ok(Some(block))
        }
        let Some(bytes) = self.externals.blocks.get(hash.as_slice())? else { return Ok(None) };
        let body = BlockBody::decode(&mut bytes.as_ref())?;
        Ok(Some(SealedBlock::new(header, body)))
    }

    /// Finds the main-chain (or unambiguous) header at `number`.
    pub fn find_header_by_number(
        &mut self,
        number: BlockNumber,
    ) -> Result<Option<SealedHeader>, BlockTreeError> {
        match self.main_or_only_hash(number)? {
            Some(hash) => self.find_header(hash, false),
            None => Ok(None),
        }
    }

    /// Finds the main-chain (or unambiguous) block at `number`.
    pub fn find_block_by_number(
        &mut self,
        number: BlockNumber,
    ) -> Result<Option<SealedBlock>, BlockTreeError> {
        match self.main_or_only_hash(number)? {
            Some(hash) => self.find_block(hash, false),
            None => Ok(None),
        }
    }

    /// Collects `count` headers walking from `start_hash` with stride
    /// `skip + 1`, ascending by default and descending with `reverse`.
    ///
    /// The returned slice always has length `count`; heights past the end of
    /// the chain (or below genesis) stay empty.
    pub fn find_headers(
        &mut self,
        start_hash: BlockHash,
        count: usize,
        skip: usize,
        reverse: bool,
    ) -> Result<Vec<Option<SealedHeader>>, BlockTreeError> {
        let mut headers = vec![None; count];
        if count == 0 {
            return Ok(headers)
        }
        let Some(start) = self.find_header(start_hash, false)? else { return Ok(headers) };
        let start_number = start.number;
        let stride = skip as u64 + 1;
        headers[0] = Some(start);

        for (i, slot) in headers.iter_mut().enumerate().skip(1) {
            let Some(number) = self.walk_target(start_number, stride, i as u64, reverse) else {
                break
            };
            *slot = self.find_header_by_number(number)?;
        }
        Ok(headers)
    }

    /// Block variant of [`Self::find_headers`].
    pub fn find_blocks(
        &mut self,
        start_hash: BlockHash,
        count: usize,
        skip: usize,
        reverse: bool,
    ) -> Result<Vec<Option<SealedBlock>>, BlockTreeError> {
        let mut blocks = vec![None; count];
        if count == 0 {
            return Ok(blocks)
        }
        let Some(start) = self.find_block(start_hash, false)? else { return Ok(blocks) };
        let start_number = start.number;
        let stride = skip as u64 + 1;
        blocks[0] = Some(start);

        for (i, slot) in blocks.iter_mut().enumerate().skip(1) {
            let Some(number) = self.walk_target(start_number, stride, i as u64, reverse) else {
                break
            };
            *slot = self.find_block_by_number(number)?;
        }
        Ok(blocks)
    }

    fn walk_target(
        &self,
        start: BlockNumber,
        stride: u64,
        step: u64,
        reverse: bool,
    ) -> Option<BlockNumber> {
        let offset = stride * step;
        if reverse {
            start.checked_sub(offset)
        } else {
            Some(start + offset)
        }
    }

    /// Resolves the unambiguous hash at `number`: the main-chain block when
    /// the level is attached, or the sole entry of a single-block level.
    fn main_or_only_hash(&self, number: BlockNumber) -> Result<Option<BlockHash>, BlockTreeError> {
        let Some(level) = self.levels.load(number)? else { return Ok(None) };
        if let Some(info) = level.main_block_info() {
            return Ok(Some(info.block_hash))
        }
        match level.block_infos.as_slice() {
            [info] => Ok(Some(info.block_hash)),
            infos => Err(BlockTreeError::AmbiguousBlockNumber { number, candidates: infos.len() }),
        }
    }

    fn is_main_chain_at(&self, number: BlockNumber, hash: BlockHash) -> Result<bool, BlockTreeError> {
        Ok(self
            .levels
            .load_forced(number)?
            .as_ref()
            .and_then(|level| level.main_block_info())
            .is_some_and(|info| info.block_hash == hash))
    }

    fn is_invalid(&self, number: BlockNumber, hash: BlockHash) -> bool {
        self.invalid_blocks.get(&number).is_some_and(|hashes| hashes.contains(&hash))
    }

    /// Near-head cache admission policy.
    fn should_cache(&self, number: BlockNumber) -> bool {
        if number == 0 {
            return true
        }
        let Some(head) = &self.head else { return true };
        let window = self.config.cache_capacity() as u64;
        number <= head.number + 1 && head.number < number + window
    }

    /// Reads a header from cache or store without attaching its total
    /// difficulty.
    fn load_header_raw(&self, hash: BlockHash) -> Result<Option<SealedHeader>, BlockTreeError> {
        if let Some(header) = self.header_cache.get(&hash) {
            return Ok(Some(header))
        }
        let Some(bytes) = self.externals.headers.get(hash.as_slice())? else { return Ok(None) };
        Ok(Some(Header::decode(&mut bytes.as_ref())?.seal(hash)))
    }

    /// Level entry for the given block, if one is indexed.
    fn stored_block_info(
        &self,
        number: BlockNumber,
        hash: BlockHash,
    ) -> Result<Option<BlockInfo>, BlockTreeError> {
        Ok(self
            .levels
            .load_forced(number)?
            .and_then(|level| level.find_index(&hash).map(|index| level.block_infos[index].clone())))
    }

    /// Computes the cumulative difficulty of `header` from its parent chain.
    fn accumulate_total_difficulty(&mut self, header: &SealedHeader) -> Result<U256, BlockTreeError> {
        if header.is_genesis() {
            return Ok(header.difficulty)
        }
        let parent = self.find_header(header.parent_hash, false)?.ok_or(
            BlockTreeError::OrphanedHeader { hash: header.hash(), parent_hash: header.parent_hash },
        )?;
        let parent_difficulty = parent
            .total_difficulty()
            .ok_or(BlockTreeError::MissingTotalDifficulty { hash: parent.hash() })?;
        Ok(parent_difficulty + header.difficulty)
    }

    /// Rebuilds the missing level entry for a stored header.
    ///
    /// A crash between the header write and the level write leaves the
    /// header orphaned from the index; this walks back to the closest
    /// indexed ancestor and re-applies difficulties forward, indexing every
    /// header on the way.
    fn repair_block_info(&mut self, header: &SealedHeader) -> Result<BlockInfo, BlockTreeError> {
        debug!(target: "block_tree", hash = ?header.hash(), number = header.number, "Repairing missing level entry");
        let mut pending = Vec::new();
        let mut cursor = header.clone();
        let mut base = U256::ZERO;
        loop {
            if cursor.is_genesis() {
                pending.push(cursor);
                break
            }
            match self.stored_block_info(cursor.number, cursor.hash())? {
                Some(info) => {
                    base = info.total_difficulty;
                    break
                }
                None => {
                    let parent_hash = cursor.parent_hash;
                    let parent = self.load_header_raw(parent_hash)?.ok_or(
                        BlockTreeError::OrphanedHeader { hash: cursor.hash(), parent_hash },
                    )?;
                    pending.push(cursor);
                    cursor = parent;
                }
            }
        }

        let mut total_difficulty = base;
        for repaired in pending.into_iter().rev() {
            total_difficulty += repaired.difficulty;
            let cache = self.should_cache(repaired.number);
            self.levels.update_or_create(
                repaired.number,
                BlockInfo {
                    block_hash: repaired.hash(),
                    total_difficulty,
                    was_processed: false,
                },
                cache,
            )?;
        }
        Ok(BlockInfo { block_hash: header.hash(), total_difficulty, was_processed: false })
    }

    /// Replays one persisted height during startup load.
    pub(crate) fn replay_level(&mut self, number: BlockNumber) -> Result<LevelReplay, BlockTreeError> {
        let Some(level) = self.levels.load(number)? else {
            warn!(target: "block_tree", number, "Missing level during startup load");
            return Ok(LevelReplay::Exhausted)
        };

        // heaviest entry wins, ties keep the earliest
        let mut best: Option<&BlockInfo> = None;
        for info in &level.block_infos {
            if best.is_none_or(|current| info.total_difficulty > current.total_difficulty) {
                best = Some(info);
            }
        }
        let Some(info) = best else {
            warn!(target: "block_tree", number, "Empty level during startup load");
            return Ok(LevelReplay::Exhausted)
        };
        let hash = info.block_hash;

        if let Some(block) = self.find_block(hash, false)? {
            let header = block.header.clone();
            self.best_suggested_header = Some(header.clone());
            self.best_suggested_block = Some(header.clone());
            self.event_sender.notify(BlockTreeEvent::NewBestSuggested(header));
            return Ok(LevelReplay::FullBlock)
        }
        if let Some(header) = self.find_header(hash, false)? {
            self.best_suggested_header = Some(header);
            return Ok(LevelReplay::HeaderOnly)
        }

        self.levels.remove(number)?;
        if self.levels.best_known_number() >= number {
            self.levels.set_best_known_number(number.saturating_sub(1));
            self.metrics.best_known_number.set(self.levels.best_known_number() as f64);
        }
        warn!(target: "block_tree", number, "Level without stored header or body, truncating frontier");
        Ok(LevelReplay::Exhausted)
    }

    /// Arms the batch rendezvous; [`Self::update_head_block`] fulfills it
    /// when the head reaches `batch_end`.
    pub(crate) fn arm_db_load_batch(&mut self, batch_end: BlockNumber) -> oneshot::Receiver<()> {
        let (done, receiver) = oneshot::channel();
        self.db_load_batch = Some((batch_end, done));
        receiver
    }

    pub(crate) fn disarm_db_load_batch(&mut self) {
        self.db_load_batch = None;
    }

    pub(crate) fn set_can_accept_new_blocks(&mut self, can_accept: bool) {
        self.can_accept_new_blocks = can_accept;
    }

    pub(crate) fn set_head(&mut self, head: Option<SealedHeader>) {
        self.head = head;
    }

    /// Reads the resumable cleanup pointer, if one was left behind.
    pub(crate) fn delete_pointer(&self) -> Result<Option<BlockHash>, BlockTreeError> {
        let Some(bytes) = self.externals.meta.get(DELETE_POINTER_KEY.as_slice())? else {
            return Ok(None)
        };
        if bytes.len() != 32 {
            return Err(BlockTreeError::Decode(alloy_rlp::Error::UnexpectedLength))
        }
        Ok(Some(BlockHash::from_slice(bytes.as_ref())))
    }

    fn restore_head(&mut self) -> Result<(), BlockTreeError> {
        let Some(bytes) = self.externals.meta.get(HEAD_KEY.as_slice())? else { return Ok(()) };
        if bytes.len() != 32 {
            return Err(BlockTreeError::Decode(alloy_rlp::Error::UnexpectedLength))
        }
        let hash = BlockHash::from_slice(bytes.as_ref());

        let Some(mut header) = self.load_header_raw(hash)? else {
            warn!(target: "block_tree", ?hash, "Head record points at a removed header");
            return Ok(())
        };
        let info = self
            .stored_block_info(header.number, hash)?
            .ok_or(BlockTreeError::CorruptHeadRecord { hash })?;
        header.set_total_difficulty(info.total_difficulty);
        self.head = Some(header);
        Ok(())
    }

    fn restore_genesis(&mut self) -> Result<(), BlockTreeError> {
        let Some(level) = self.levels.load_forced(0)? else { return Ok(()) };
        let Some(first) = level.block_infos.first() else { return Ok(()) };
        let hash = level.main_block_info().map(|info| info.block_hash).unwrap_or(first.block_hash);
        if let Some(header) = self.find_header(hash, false)? {
            self.check_pinned_genesis(header.hash())?;
            self.genesis = Some(header);
        }
        Ok(())
    }

    /// Enforces the chain spec's pinned genesis hash, when one is set.
    fn check_pinned_genesis(&self, hash: BlockHash) -> Result<(), BlockTreeError> {
        match self.externals.chain_spec.genesis_hash {
            Some(expected) if expected != hash => {
                Err(BlockTreeError::GenesisMismatch { expected, stored: hash })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        pool::NoopTransactionPool,
        test_utils::{child, genesis, grow_chain, setup, TestStores},
    };
    use assert_matches::assert_matches;
    use lantern_primitives::{Block, ChainLevelInfo, ChainSpec};
    use lantern_store::MemoryStore;
    use rand::{thread_rng, Rng};
    use std::sync::Arc;
    use tokio::sync::broadcast::error::TryRecvError;

    /// Grows `g, b1, b2, b3`, then suggests and promotes a heavier fork
    /// `f2, f3` on top of `b1`.
    ///
    /// Chain state after the reorg:
    ///
    /// g --- b1 --- b2 --- b3
    ///        \
    ///         f2 --- f3   (main chain, head f3)
    fn fork_state() -> (BlockTree<MemoryStore>, TestStores, Vec<SealedBlock>, SealedBlock, SealedBlock)
    {
        let stores = TestStores::new();
        let mut tree = BlockTree::new(stores.externals(), BlockTreeConfig::default()).unwrap();
        let blocks = grow_chain(&mut tree, 3);
        let fork_mid = child(&blocks[1].header, 250);
        let fork_tip = child(&fork_mid.header, 100);
        assert_eq!(tree.suggest_block(fork_mid.clone(), true).unwrap(), AddBlockOutcome::Added);
        assert_eq!(tree.suggest_block(fork_tip.clone(), true).unwrap(), AddBlockOutcome::Added);
        tree.update_main_chain(&[fork_mid.clone(), fork_tip.clone()]).unwrap();
        (tree, stores, blocks, fork_mid, fork_tip)
    }

    #[test]
    fn genesis_bootstrap() {
        let (mut tree, _stores) = setup();
        let mut events = tree.subscribe_events();
        let genesis = genesis();

        assert_eq!(tree.suggest_block(genesis.clone(), true).unwrap(), AddBlockOutcome::Added);
        assert!(tree.head().is_none());
        assert_eq!(tree.best_suggested_header().unwrap().hash(), genesis.hash());
        assert_matches!(
            events.try_recv(),
            Ok(BlockTreeEvent::NewBestSuggested(header)) if header.hash() == genesis.hash()
        );

        tree.update_main_chain(&[genesis.clone()]).unwrap();
        assert_eq!(tree.head().unwrap().hash(), genesis.hash());
        assert_eq!(tree.genesis().unwrap().hash(), genesis.hash());

        assert_matches!(events.try_recv(), Ok(BlockTreeEvent::BlockAddedToMain(_)));
        assert_matches!(
            events.try_recv(),
            Ok(BlockTreeEvent::NewHead(header)) if header.hash() == genesis.hash()
        );
        assert_matches!(events.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn linear_chain_promotion() {
        let (mut tree, _stores) = setup();
        let blocks = grow_chain(&mut tree, 3);

        let found = tree.find_block_by_number(2).unwrap().unwrap();
        assert_eq!(found.hash(), blocks[2].hash());
        assert_eq!(found.body, blocks[2].body);
        assert!(tree.is_main_chain(blocks[2].hash()).unwrap());
        assert_eq!(tree.best_known_number(), 3);
        assert_eq!(tree.head().unwrap().hash(), blocks[3].hash());
    }

    #[test]
    fn suggest_is_idempotent() {
        let (mut tree, _stores) = setup();
        let blocks = grow_chain(&mut tree, 1);
        let block = child(&blocks[1].header, 100);

        assert_eq!(tree.suggest_block(block.clone(), true).unwrap(), AddBlockOutcome::Added);
        assert_eq!(tree.suggest_block(block.clone(), true).unwrap(), AddBlockOutcome::AlreadyKnown);
        assert_eq!(tree.levels.load_forced(2).unwrap().unwrap().block_infos.len(), 1);
    }

    #[test]
    fn second_genesis_is_rejected() {
        let (mut tree, _stores) = setup();
        tree.suggest_block(genesis(), true).unwrap();

        let other = Block {
            header: Header { difficulty: U256::from(2), ..Default::default() },
            body: BlockBody::default(),
        }
        .seal_slow();
        assert_matches!(
            tree.suggest_block(other, true),
            Err(BlockTreeError::GenesisAlreadyKnown { .. })
        );
    }

    #[test]
    fn pinned_genesis_hash_is_enforced() {
        let genesis = genesis();
        let stores = TestStores::new();
        let externals = |spec: ChainSpec| {
            TreeExternals::new(
                stores.headers.clone(),
                stores.blocks.clone(),
                stores.meta.clone(),
                Arc::new(spec),
                Arc::new(NoopTransactionPool),
            )
        };

        // a pin on a different hash rejects the suggestion
        let wrong = ChainSpec::new(1).with_genesis_hash(BlockHash::repeat_byte(0xbe));
        let mut tree = BlockTree::new(externals(wrong.clone()), BlockTreeConfig::default()).unwrap();
        assert_matches!(
            tree.suggest_block(genesis.clone(), true),
            Err(BlockTreeError::GenesisMismatch { .. })
        );

        // the matching pin accepts it, and the pin holds across a reopen
        let matching = ChainSpec::new(1).with_genesis_hash(genesis.hash());
        let mut tree =
            BlockTree::new(externals(matching.clone()), BlockTreeConfig::default()).unwrap();
        assert_eq!(tree.suggest_block(genesis.clone(), true).unwrap(), AddBlockOutcome::Added);
        tree.update_main_chain(&[genesis.clone()]).unwrap();
        drop(tree);

        let reopened = BlockTree::new(externals(matching), BlockTreeConfig::default()).unwrap();
        assert_eq!(reopened.genesis().unwrap().hash(), genesis.hash());

        // reopening under a different pin fails the restore
        assert_matches!(
            BlockTree::new(externals(wrong), BlockTreeConfig::default()),
            Err(BlockTreeError::GenesisMismatch { .. })
        );
    }

    #[test]
    fn unknown_parent_is_reported() {
        let (mut tree, _stores) = setup();
        let orphan = Header {
            parent_hash: BlockHash::repeat_byte(9),
            number: 5,
            difficulty: U256::from(1),
            ..Default::default()
        }
        .seal_slow();
        assert_eq!(tree.suggest_header(orphan).unwrap(), AddBlockOutcome::UnknownParent);
    }

    #[test]
    fn gate_rejects_when_closed() {
        let (mut tree, _stores) = setup();
        tree.set_can_accept_new_blocks(false);
        assert_eq!(tree.suggest_block(genesis(), true).unwrap(), AddBlockOutcome::CannotAccept);

        tree.set_can_accept_new_blocks(true);
        assert_eq!(tree.suggest_block(genesis(), true).unwrap(), AddBlockOutcome::Added);
    }

    #[test]
    fn fork_promotion_reorders_levels() {
        let (mut tree, _stores, blocks, fork_mid, fork_tip) = fork_state();

        let level2 = tree.levels.load_forced(2).unwrap().unwrap();
        assert!(level2.has_block_on_main_chain);
        assert_eq!(level2.block_infos[0].block_hash, fork_mid.hash());
        assert_eq!(level2.block_infos[1].block_hash, blocks[2].hash());

        let level3 = tree.levels.load_forced(3).unwrap().unwrap();
        assert!(level3.has_block_on_main_chain);
        assert_eq!(level3.block_infos[0].block_hash, fork_tip.hash());
        assert_eq!(level3.block_infos[1].block_hash, blocks[3].hash());

        assert_eq!(tree.head().unwrap().hash(), fork_tip.hash());
        assert!(tree.is_main_chain(fork_mid.hash()).unwrap());
        assert!(!tree.is_main_chain(blocks[2].hash()).unwrap());

        // main-chain-only lookups follow the reorg
        assert!(tree.find_header(blocks[2].hash(), true).unwrap().is_none());
        assert_eq!(
            tree.find_header(fork_mid.hash(), true).unwrap().unwrap().hash(),
            fork_mid.hash()
        );
    }

    #[test]
    fn detach_clears_stale_main_levels() {
        let (mut tree, _stores) = setup();
        let blocks = grow_chain(&mut tree, 4);

        // a single heavier block below the old head re-points the chain
        let heavy = child(&blocks[1].header, 500);
        assert_eq!(tree.suggest_block(heavy.clone(), true).unwrap(), AddBlockOutcome::Added);
        tree.update_main_chain(std::slice::from_ref(&heavy)).unwrap();

        assert_eq!(tree.head().unwrap().hash(), heavy.hash());
        assert!(!tree.levels.load_forced(3).unwrap().unwrap().has_block_on_main_chain);
        assert!(!tree.levels.load_forced(4).unwrap().unwrap().has_block_on_main_chain);
        assert!(tree.is_main_chain(heavy.hash()).unwrap());
        assert!(tree.is_main_chain(blocks[1].hash()).unwrap());
    }

    #[test]
    fn total_difficulty_accumulates() {
        let (mut tree, _stores) = setup();
        let mut rng = thread_rng();

        let genesis = genesis();
        tree.suggest_block(genesis.clone(), true).unwrap();
        tree.update_main_chain(&[genesis.clone()]).unwrap();

        let mut expected = U256::from(1);
        let mut parent = genesis.header.clone();
        for _ in 0..5 {
            let difficulty = rng.gen_range(1..1_000u64);
            let block = child(&parent, difficulty);
            tree.suggest_block(block.clone(), true).unwrap();
            tree.update_main_chain(&[block.clone()]).unwrap();

            expected += U256::from(difficulty);
            let loaded = tree.find_header(block.hash(), false).unwrap().unwrap();
            assert_eq!(loaded.total_difficulty(), Some(expected));
            parent = block.header.clone();
        }

        // the head dominates every main-chain block and the chain is
        // contiguous from genesis
        let head = tree.head().unwrap().clone();
        assert_eq!(head.total_difficulty(), Some(expected));
        for number in 0..=head.number {
            let level = tree.levels.load_forced(number).unwrap().unwrap();
            assert!(level.has_block_on_main_chain);
            assert!(level.block_infos[0].total_difficulty <= expected);
        }
    }

    #[test]
    fn invalidate_descendant_chain() {
        let (mut tree, _stores, blocks, fork_mid, fork_tip) = fork_state();

        tree.delete_invalid_block(&fork_mid).unwrap();

        assert!(tree.find_header(fork_mid.hash(), false).unwrap().is_none());
        assert!(tree.find_header(fork_tip.hash(), false).unwrap().is_none());
        assert!(tree.find_block(fork_mid.hash(), false).unwrap().is_none());

        let level2 = tree.levels.load_forced(2).unwrap().unwrap();
        assert_eq!(level2.block_infos.len(), 1);
        assert_eq!(level2.block_infos[0].block_hash, blocks[2].hash());
        let level3 = tree.levels.load_forced(3).unwrap().unwrap();
        assert_eq!(level3.block_infos.len(), 1);
        assert_eq!(level3.block_infos[0].block_hash, blocks[3].hash());

        // the invalid block stays rejected, the old branch stays known
        assert_eq!(
            tree.suggest_block(fork_mid.clone(), true).unwrap(),
            AddBlockOutcome::InvalidBlock
        );
        assert_eq!(
            tree.suggest_block(blocks[2].clone(), true).unwrap(),
            AddBlockOutcome::AlreadyKnown
        );

        assert_eq!(
            tree.best_suggested_header().unwrap().hash(),
            tree.head().unwrap().hash()
        );
        assert!(tree.can_accept_new_blocks());
        assert!(tree.delete_pointer().unwrap().is_none());
        assert_eq!(tree.best_known_number(), 3);
    }

    #[test]
    fn invalidating_the_frontier_shrinks_it() {
        let (mut tree, _stores) = setup();
        let blocks = grow_chain(&mut tree, 2);

        let frontier = child(&blocks[2].header, 100);
        tree.suggest_block(frontier.clone(), true).unwrap();
        assert_eq!(tree.best_known_number(), 3);

        tree.delete_invalid_block(&frontier).unwrap();
        assert_eq!(tree.best_known_number(), 2);
        assert!(tree.levels.load_forced(3).unwrap().is_none());
    }

    #[test]
    fn crash_resume_completes_cleanup() {
        let (tree, stores, blocks, fork_mid, fork_tip) = fork_state();
        drop(tree);

        // simulate the first cleanup iteration completing just before a
        // crash: the fork mid-block is gone and the pointer names its child
        let key = crate::level_index::level_key(2);
        let mut level2 =
            ChainLevelInfo::decode(&mut stores.meta.get(&key).unwrap().unwrap().as_ref()).unwrap();
        level2.block_infos.retain(|info| info.block_hash != fork_mid.hash());
        stores.meta.put(&key, alloy_rlp::encode(&level2).into()).unwrap();
        stores.headers.delete(fork_mid.hash().as_slice()).unwrap();
        stores.blocks.delete(fork_mid.hash().as_slice()).unwrap();
        stores
            .meta
            .put(
                DELETE_POINTER_KEY.as_slice(),
                Bytes::copy_from_slice(fork_tip.hash().as_slice()),
            )
            .unwrap();

        let mut reopened = BlockTree::new(stores.externals(), BlockTreeConfig::default()).unwrap();

        assert!(reopened.delete_pointer().unwrap().is_none());
        assert!(reopened.find_header(fork_tip.hash(), false).unwrap().is_none());
        let level3 = reopened.levels.load_forced(3).unwrap().unwrap();
        assert_eq!(level3.block_infos.len(), 1);
        assert_eq!(level3.block_infos[0].block_hash, blocks[3].hash());

        // the head record named the removed fork tip, so the head resets
        assert!(reopened.head().is_none());
        assert_eq!(reopened.best_known_number(), 3);
        assert_eq!(reopened.genesis().unwrap().hash(), blocks[0].hash());
    }

    #[test]
    fn was_processed_flips_on_promotion() {
        let (mut tree, _stores) = setup();
        let blocks = grow_chain(&mut tree, 1);

        let block = child(&blocks[1].header, 100);
        tree.suggest_block(block.clone(), true).unwrap();
        assert!(!tree.was_processed(2, block.hash()).unwrap());

        tree.update_main_chain(&[block.clone()]).unwrap();
        assert!(tree.was_processed(2, block.hash()).unwrap());

        assert_matches!(
            tree.was_processed(2, BlockHash::repeat_byte(7)),
            Err(BlockTreeError::BlockNotFoundInLevel { number: 2, .. })
        );
    }

    #[test]
    fn lazy_repair_recreates_level_entry() {
        let (mut tree, stores) = setup();
        let blocks = grow_chain(&mut tree, 2);

        // a crash between stores: the header was written but the level
        // entry never made it
        let orphan = child(&blocks[2].header, 100);
        stores
            .headers
            .put(orphan.hash().as_slice(), alloy_rlp::encode(orphan.header.header()).into())
            .unwrap();

        let repaired = tree.find_header(orphan.hash(), false).unwrap().unwrap();
        assert_eq!(repaired.total_difficulty(), Some(U256::from(301)));

        let level3 = tree.levels.load_forced(3).unwrap().unwrap();
        assert_eq!(level3.block_infos.len(), 1);
        assert_eq!(level3.block_infos[0].block_hash, orphan.hash());

        // repair is idempotent
        tree.find_header(orphan.hash(), false).unwrap().unwrap();
        assert_eq!(tree.levels.load_forced(3).unwrap().unwrap().block_infos.len(), 1);
    }

    #[test]
    fn ambiguous_number_lookup_fails() {
        let (mut tree, _stores) = setup();
        let blocks = grow_chain(&mut tree, 1);

        let left = child(&blocks[1].header, 100);
        let right = child(&blocks[1].header, 90);
        tree.suggest_block(left, true).unwrap();
        tree.suggest_block(right, true).unwrap();

        assert_matches!(
            tree.find_header_by_number(2),
            Err(BlockTreeError::AmbiguousBlockNumber { number: 2, candidates: 2 })
        );
    }

    #[test]
    fn find_headers_walks_with_stride() {
        let (mut tree, _stores) = setup();
        let blocks = grow_chain(&mut tree, 5);

        let strided = tree.find_headers(blocks[1].hash(), 3, 1, false).unwrap();
        let hashes: Vec<_> =
            strided.iter().map(|header| header.as_ref().unwrap().hash()).collect();
        assert_eq!(hashes, vec![blocks[1].hash(), blocks[3].hash(), blocks[5].hash()]);

        let reversed = tree.find_headers(blocks[4].hash(), 4, 0, true).unwrap();
        let numbers: Vec<_> =
            reversed.iter().map(|header| header.as_ref().unwrap().number).collect();
        assert_eq!(numbers, vec![4, 3, 2, 1]);

        // past the tip the slice stays sparse
        let sparse = tree.find_headers(blocks[3].hash(), 4, 0, false).unwrap();
        assert_eq!(sparse[2].as_ref().unwrap().hash(), blocks[5].hash());
        assert!(sparse[3].is_none());

        // below genesis the walk stops
        let low = tree.find_headers(blocks[1].hash(), 3, 0, true).unwrap();
        assert_eq!(low[1].as_ref().unwrap().number, 0);
        assert!(low[2].is_none());

        let unknown = tree.find_headers(BlockHash::repeat_byte(0xaa), 2, 0, false).unwrap();
        assert!(unknown.iter().all(Option::is_none));
    }

    #[test]
    fn find_blocks_returns_bodies() {
        let (mut tree, _stores) = setup();
        let blocks = grow_chain(&mut tree, 3);

        let found = tree.find_blocks(blocks[1].hash(), 3, 0, false).unwrap();
        for (slot, expected) in found.iter().zip(&blocks[1..=3]) {
            let block = slot.as_ref().unwrap();
            assert_eq!(block.hash(), expected.hash());
            assert_eq!(block.body, expected.body);
            assert!(block.total_difficulty().is_some());
        }
    }

    #[test]
    fn is_known_block_fast_paths() {
        let (mut tree, _stores) = setup();
        let blocks = grow_chain(&mut tree, 2);

        assert!(tree.is_known_block(2, blocks[2].hash()).unwrap());
        // beyond the frontier nothing is known
        assert!(!tree.is_known_block(9, blocks[2].hash()).unwrap());
        assert!(!tree.is_known_block(2, BlockHash::repeat_byte(0xab)).unwrap());
    }

    #[test]
    fn reopen_restores_state() {
        let stores = TestStores::new();
        let mut tree = BlockTree::new(stores.externals(), BlockTreeConfig::default()).unwrap();
        let blocks = grow_chain(&mut tree, 3);
        drop(tree);

        let mut reopened = BlockTree::new(stores.externals(), BlockTreeConfig::default()).unwrap();
        assert_eq!(reopened.head().unwrap().hash(), blocks[3].hash());
        assert_eq!(reopened.genesis().unwrap().hash(), blocks[0].hash());
        assert_eq!(reopened.best_known_number(), 3);
        assert_eq!(
            reopened.best_suggested_header().unwrap().hash(),
            blocks[3].hash()
        );

        let next = child(&blocks[3].header, 100);
        assert_eq!(reopened.suggest_block(next, true).unwrap(), AddBlockOutcome::Added);
        assert_eq!(reopened.best_known_number(), 4);
    }
}
