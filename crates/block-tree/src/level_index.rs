//! Per-height chain level management.

use crate::{cache::TreeCache, error::BlockTreeError};
use alloy_primitives::BlockNumber;
use alloy_rlp::Decodable;
use lantern_primitives::{BlockInfo, ChainLevelInfo};
use lantern_store::KeyValueStore;
use tracing::trace;

/// Width of the probe window used to rediscover the highest stored level.
const BEST_KNOWN_SEARCH_WINDOW: u64 = 10_000_000;

/// Encodes a level number as its 8-byte big-endian meta-store key.
pub(crate) fn level_key(number: BlockNumber) -> [u8; 8] {
    number.to_be_bytes()
}

/// Index over persisted [`ChainLevelInfo`] records.
///
/// The meta store is ground truth and the cache is write-through. All
/// logical mutation takes `&mut self`; the owning tree serializes mutators
/// behind its write lock so a read-modify-write of a level cannot lose a
/// concurrent append.
#[derive(Debug)]
pub(crate) struct LevelIndex<S> {
    store: S,
    cache: TreeCache<BlockNumber, ChainLevelInfo>,
    best_known_number: BlockNumber,
}

impl<S: KeyValueStore> LevelIndex<S> {
    pub(crate) fn new(store: S, cache_capacity: u32) -> Self {
        Self { store, cache: TreeCache::new(cache_capacity), best_known_number: 0 }
    }

    /// Highest height for which a level exists.
    pub(crate) fn best_known_number(&self) -> BlockNumber {
        self.best_known_number
    }

    pub(crate) fn set_best_known_number(&mut self, number: BlockNumber) {
        self.best_known_number = number;
    }

    /// Loads the level at `number`, short-circuiting heights beyond the
    /// known frontier.
    pub(crate) fn load(&self, number: BlockNumber) -> Result<Option<ChainLevelInfo>, BlockTreeError> {
        if number > self.best_known_number {
            return Ok(None)
        }
        self.load_forced(number)
    }

    /// Loads the level at `number` regardless of the tracked frontier.
    pub(crate) fn load_forced(
        &self,
        number: BlockNumber,
    ) -> Result<Option<ChainLevelInfo>, BlockTreeError> {
        if let Some(level) = self.cache.get(&number) {
            return Ok(Some(level))
        }
        self.read_from_store(number)
    }

    /// Reads the level bytes straight from the meta store, bypassing the
    /// cache.
    fn read_from_store(
        &self,
        number: BlockNumber,
    ) -> Result<Option<ChainLevelInfo>, BlockTreeError> {
        let Some(bytes) = self.store.get(&level_key(number))? else { return Ok(None) };
        Ok(Some(ChainLevelInfo::decode(&mut bytes.as_ref())?))
    }

    /// Write-through persist. `cache` controls admission per the near-head
    /// policy; an already cached level is refreshed regardless so the cache
    /// never serves stale bytes.
    pub(crate) fn persist(
        &mut self,
        number: BlockNumber,
        level: &ChainLevelInfo,
        cache: bool,
    ) -> Result<(), BlockTreeError> {
        if cache || self.cache.contains(&number) {
            self.cache.insert(number, level.clone());
        }
        self.store.put(&level_key(number), alloy_rlp::encode(level).into())?;
        Ok(())
    }

    /// Removes the level record and any cached copy.
    pub(crate) fn remove(&mut self, number: BlockNumber) -> Result<(), BlockTreeError> {
        self.cache.remove(&number);
        self.store.delete(&level_key(number))?;
        Ok(())
    }

    /// Appends `info` to the level at `number`, creating the level when
    /// absent. An entry with the same hash is left untouched, which keeps
    /// the torn-write repair path idempotent.
    pub(crate) fn update_or_create(
        &mut self,
        number: BlockNumber,
        info: BlockInfo,
        cache: bool,
    ) -> Result<(), BlockTreeError> {
        if number > self.best_known_number {
            self.best_known_number = number;
        }
        let level = match self.load_forced(number)? {
            Some(mut level) => {
                if level.contains(&info.block_hash) {
                    return Ok(())
                }
                level.block_infos.push(info);
                level
            }
            None => ChainLevelInfo::new(info),
        };
        self.persist(number, &level, cache)
    }

    /// Rediscovers the highest stored level by bisecting above `from`.
    ///
    /// The probe reads the meta store directly so a stale cache cannot
    /// shrink the frontier.
    pub(crate) fn rediscover_best_known(
        &mut self,
        from: BlockNumber,
    ) -> Result<(), BlockTreeError> {
        let mut lo = from;
        let mut hi = from + BEST_KNOWN_SEARCH_WINDOW;
        while lo < hi {
            let mid = lo + (hi - lo + 1) / 2;
            if self.read_from_store(mid)?.is_some() {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }
        trace!(target: "block_tree", best_known = lo, "Rediscovered level frontier");
        self.best_known_number = lo;
        Ok(())
    }
}
