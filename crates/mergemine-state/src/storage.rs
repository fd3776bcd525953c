// Contract storage and per-invocation write isolation.
//
// SAFETY INVARIANTS:
// 1. Storage is scoped to one contract address; keys never collide across contracts
// 2. There is no delete primitive; records are overwritten, never removed
// 3. Writes made during a failed invocation never reach the backing store

use log::{debug, error};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("Failed to encode record {record}: {reason}")]
    Encode { record: &'static str, reason: String },

    #[error("Corrupted record {record} at key {key}: {reason}")]
    Corrupted { record: &'static str, key: String, reason: String },

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Key-value namespace of one contract.
pub trait ContractStorage {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError>;

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StateError>;
}

/// In-memory storage backend, used by tests and local replays.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStorage {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ContractStorage for MemoryStorage {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StateError> {
        self.entries.insert(key.to_vec(), value.to_vec());
        Ok(())
    }
}

/// Buffers the writes of a single invocation on top of a backing store.
///
/// Reads see pending writes first. Dropping the overlay discards them;
/// [`StorageOverlay::commit`] flushes them in key order.
pub struct StorageOverlay<'a> {
    base: &'a mut dyn ContractStorage,
    pending: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl<'a> StorageOverlay<'a> {
    pub fn new(base: &'a mut dyn ContractStorage) -> Self {
        StorageOverlay {
            base,
            pending: BTreeMap::new(),
        }
    }

    /// Flush all buffered writes to the backing store. Returns the number of keys written.
    pub fn commit(self) -> Result<usize, StateError> {
        let count = self.pending.len();
        for (key, value) in &self.pending {
            if let Err(e) = self.base.put(key, value) {
                error!("Commit failed at key {}: {}", hex::encode(key), e);
                return Err(e);
            }
        }
        debug!("Committed {} storage writes", count);
        Ok(count)
    }
}

impl ContractStorage for StorageOverlay<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError> {
        match self.pending.get(key) {
            Some(value) => Ok(Some(value.clone())),
            None => self.base.get(key),
        }
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StateError> {
        self.pending.insert(key.to_vec(), value.to_vec());
        Ok(())
    }
}
