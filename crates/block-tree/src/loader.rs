//! Startup replay of persisted blocks.

use crate::{
    block_tree::LevelReplay, config::FAST_SYNC_TAIL, error::BlockTreeError,
    shareable::ShareableBlockTree,
};
use alloy_primitives::BlockNumber;
use lantern_store::KeyValueStore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

impl<S: KeyValueStore + Clone> ShareableBlockTree<S> {
    /// Replays persisted levels from the database, feeding re-suggested
    /// blocks to the processor with batch backpressure.
    ///
    /// Suggestions are rejected for the duration of the replay. With an
    /// explicit `start_number` the head is first rewound to the header at
    /// the preceding height. `batch_size` bounds how far the replay may run
    /// ahead of the processor, falling back to the configured load batch
    /// size when not given; `max_blocks_to_load` caps the whole run.
    ///
    /// Cancellation takes effect between heights and leaves the tree
    /// consistent.
    pub async fn load_blocks_from_db(
        &self,
        cancellation: &CancellationToken,
        start_number: Option<BlockNumber>,
        batch_size: Option<u64>,
        max_blocks_to_load: u64,
    ) -> Result<(), BlockTreeError> {
        let batch_size =
            batch_size.unwrap_or_else(|| self.tree.read().config().load_batch_size());
        self.tree.write().set_can_accept_new_blocks(false);
        let result = self.replay(cancellation, start_number, batch_size, max_blocks_to_load).await;
        self.tree.write().set_can_accept_new_blocks(true);
        result
    }

    async fn replay(
        &self,
        cancellation: &CancellationToken,
        start_number: Option<BlockNumber>,
        batch_size: u64,
        max_blocks_to_load: u64,
    ) -> Result<(), BlockTreeError> {
        {
            let mut tree = self.tree.write();
            if let Some(pointer) = tree.delete_pointer()? {
                debug!(target: "block_tree::loader", ?pointer, "Resuming interrupted invalid chain cleanup");
                tree.clean_invalid_blocks(pointer)?;
            }
        }

        let (start, blocks_to_load) = {
            let mut tree = self.tree.write();
            let start = match start_number {
                Some(start) => {
                    let head =
                        if start == 0 { None } else { tree.find_header_by_number(start - 1)? };
                    tree.set_head(head);
                    start
                }
                None => tree.head().map(|header| header.number).unwrap_or_default(),
            };
            let head_number = tree.head().map(|header| header.number).unwrap_or_default();
            let blocks_to_load =
                tree.best_known_number().saturating_sub(head_number).min(max_blocks_to_load);
            (start, blocks_to_load)
        };
        if blocks_to_load == 0 {
            return Ok(())
        }
        info!(target: "block_tree::loader", start, blocks_to_load, "Replaying persisted blocks");

        // both endpoints replay: the head's own height plus `blocks_to_load`
        // heights above it
        let mut number = start;
        let mut loaded = 0u64;
        while loaded <= blocks_to_load {
            if cancellation.is_cancelled() {
                debug!(target: "block_tree::loader", number, "Startup replay cancelled");
                return Ok(())
            }

            let level_replay = self.tree.write().replay_level(number)?;
            match level_replay {
                LevelReplay::FullBlock => {
                    loaded += 1;
                    number += 1;
                    if loaded % batch_size == 0 {
                        self.wait_for_batch(cancellation, number, batch_size).await;
                    }
                }
                LevelReplay::HeaderOnly => {
                    let remaining = blocks_to_load.saturating_sub(loaded);
                    if remaining > FAST_SYNC_TAIL {
                        // headers for the skipped range were persisted by a
                        // prior sync; only the tail is replayed in full
                        let jump = remaining - FAST_SYNC_TAIL - 1;
                        debug!(target: "block_tree::loader", from = number, jump, "Skipping header-only range");
                        number += jump;
                        loaded += jump;
                    }
                    loaded += 1;
                    number += 1;
                }
                LevelReplay::Exhausted => break,
            }
        }

        info!(target: "block_tree::loader", loaded, "Startup block replay finished");
        Ok(())
    }

    /// Suspends until the processor's head reaches the end of the previous
    /// batch, or until cancellation.
    async fn wait_for_batch(
        &self,
        cancellation: &CancellationToken,
        number: BlockNumber,
        batch_size: u64,
    ) {
        let receiver = {
            let mut tree = self.tree.write();
            let head_number = tree.head().map(|header| header.number).unwrap_or_default();
            (number > head_number + batch_size).then(|| tree.arm_db_load_batch(number - batch_size))
        };
        let Some(receiver) = receiver else { return };

        debug!(target: "block_tree::loader", awaiting = number - batch_size, "Waiting for processor to catch up");
        tokio::select! {
            _ = receiver => {}
            _ = cancellation.cancelled() => {
                self.tree.write().disarm_db_load_batch();
                debug!(target: "block_tree::loader", "Cancelled while awaiting batch completion");
            }
        }
    }
}
