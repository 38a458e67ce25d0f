use bytes::Bytes;
use std::fmt::Debug;

/// Errors returned by [`KeyValueStore`] implementations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Failure reported by the underlying database engine.
    #[error("key-value backend failure: {0}")]
    Backend(String),
}

/// Contract for a byte-keyed, byte-valued store.
///
/// No transactions and no ordered iteration are required. Implementations
/// must be safe for concurrent access; a handle is expected to be cheap to
/// clone and to alias the same underlying data.
pub trait KeyValueStore: Send + Sync + Debug {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &[u8]) -> Result<Option<Bytes>, StoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn put(&self, key: &[u8], value: Bytes) -> Result<(), StoreError>;

    /// Removes the value stored under `key`, if any.
    fn delete(&self, key: &[u8]) -> Result<(), StoreError>;

    /// Returns true if `key` maps to a value.
    fn contains(&self, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }
}
