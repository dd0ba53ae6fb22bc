//! The pluggable storage interface (`spec.md` §6) and a default in-memory
//! implementation. The teacher never had a storage layer of its own to
//! imitate — `lumen-wasm` kept everything in a JS-side object — so this is
//! new code, shaped after the trait-object pluggability the rest of the
//! pack favors (storage/HTTP/EVM are all "pure capability objects").

use parking_lot::RwLock;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("storage backend unavailable: {reason}")]
    Unavailable { reason: String },
}

/// A byte-oriented key/value store. Every method is synchronous: the core
/// never suspends on storage I/O, so an embedder backed by a real database
/// must make `get`/`set`/`del` block to completion itself.
pub trait StoragePlugin: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;
    /// Atomic replace: a concurrent reader never observes a partial write.
    fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;
    fn del(&self, key: &str) -> Result<(), StorageError>;
    /// Capacity bound handed to `store::SyncCommitteeStore`'s eviction
    /// policy; a plugin with no inherent limit should return a sensible
    /// default rather than `usize::MAX` so eviction still runs.
    fn max_sync_states(&self) -> usize {
        8
    }
}

/// A `HashMap` behind a `parking_lot::RwLock` — the `NullStorage` used by
/// tests and doctests, and a reasonable default for single-process
/// embedders with no durability requirement.
#[derive(Default)]
pub struct InMemoryStorage {
    data: RwLock<HashMap<String, Vec<u8>>>,
    max_sync_states: usize,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            max_sync_states: 8,
        }
    }

    pub fn with_capacity(max_sync_states: usize) -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            max_sync_states,
        }
    }
}

impl StoragePlugin for InMemoryStorage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.data.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        self.data.write().insert(key.to_string(), value);
        Ok(())
    }

    fn del(&self, key: &str) -> Result<(), StorageError> {
        self.data.write().remove(key);
        Ok(())
    }

    fn max_sync_states(&self) -> usize {
        self.max_sync_states
    }
}
