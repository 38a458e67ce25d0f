//! Tree event broadcasting.

use lantern_primitives::{SealedBlock, SealedHeader};
use tokio::sync::broadcast;

const DEFAULT_EVENT_CHANNEL_SIZE: usize = 256;

/// Events published by the block tree.
///
/// Receivers are decoupled from the publishing operation: a slow receiver
/// lags the channel instead of blocking tree writers, and a receiver can
/// only observe a mutation after the originating writer released its lock.
#[derive(Debug, Clone)]
pub enum BlockTreeEvent {
    /// The known header with the highest total difficulty advanced.
    NewBestSuggested(SealedHeader),
    /// A processed block was promoted onto the main chain.
    BlockAddedToMain(SealedBlock),
    /// The head of the main chain advanced.
    NewHead(SealedHeader),
}

/// Receiver half for tree events.
pub type BlockTreeEvents = broadcast::Receiver<BlockTreeEvent>;

/// Broadcast sender that tolerates having no subscribers.
#[derive(Debug, Clone)]
pub struct EventSender<T> {
    sender: broadcast::Sender<T>,
}

impl<T: Clone + Send + Sync + 'static> Default for EventSender<T> {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CHANNEL_SIZE)
    }
}

impl<T: Clone + Send + Sync + 'static> EventSender<T> {
    /// Creates a sender with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Sends an event to all current subscribers.
    pub fn notify(&self, event: T) {
        let _ = self.sender.send(event);
    }

    /// Registers a new subscriber.
    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.sender.subscribe()
    }
}
