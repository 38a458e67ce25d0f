//! Bounded caches for hot tree objects.

use parking_lot::Mutex;
use schnellru::{ByLength, LruMap};
use std::{fmt, hash::Hash};

/// A bounded LRU cache safe for concurrent use.
///
/// The cache is advisory: the key-value stores remain ground truth and any
/// entry may be evicted at any time.
pub struct TreeCache<K, V>
where
    K: Hash + PartialEq,
{
    inner: Mutex<LruMap<K, V>>,
}

impl<K, V> TreeCache<K, V>
where
    K: Hash + PartialEq,
    V: Clone,
{
    /// Creates a cache bounded to `capacity` entries.
    pub fn new(capacity: u32) -> Self {
        Self { inner: Mutex::new(LruMap::new(ByLength::new(capacity))) }
    }

    /// Returns a clone of the cached value and marks it most recently used.
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.lock().get(key).map(|value| value.clone())
    }

    /// Inserts or refreshes an entry.
    pub fn insert(&self, key: K, value: V) {
        self.inner.lock().insert(key, value);
    }

    /// Expels an entry if present.
    pub fn remove(&self, key: &K) {
        self.inner.lock().remove(key);
    }

    /// Returns true without touching the usage order.
    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().peek(key).is_some()
    }

    /// Returns the number of cached entries.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> fmt::Debug for TreeCache<K, V>
where
    K: Hash + PartialEq,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeCache").field("len", &self.inner.lock().len()).finish()
    }
}
