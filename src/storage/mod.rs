//! Ledger checkpointing.
//!
//! The engine is in-memory-first; storage is a checkpoint facility behind a
//! narrow backend trait, not a write-ahead log. Backends store opaque
//! key/value bytes and are interchangeable.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::core::ledger::GlobalLedger;
use crate::error::{Error, Result};

/// Storage key for the position-ledger checkpoint
const LEDGER_KEY: &[u8] = b"ledger/positions";

// ═══════════════════════════════════════════════════════════════════════════════
// STORAGE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Trait for checkpoint storage backends
pub trait StorageBackend: Send + Sync {
    /// Get a value by key
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Set a value for a key
    fn set(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Delete a key, reporting whether it existed
    fn delete(&self, key: &[u8]) -> Result<bool>;

    /// Check if a key exists
    fn exists(&self, key: &[u8]) -> Result<bool>;

    /// Flush any pending writes to persistent storage
    fn flush(&self) -> Result<()>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// IN-MEMORY STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// In-memory storage backend (for testing and ephemeral use)
#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: RwLock<HashMap<Vec<u8>, Vec<u8>>>,
}

impl InMemoryStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.data.read().map(|data| data.len()).unwrap_or(0)
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StorageBackend for InMemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let data = self
            .data
            .read()
            .map_err(|e| Error::Storage(format!("lock error: {}", e)))?;
        Ok(data.get(key).cloned())
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut data = self
            .data
            .write()
            .map_err(|e| Error::Storage(format!("lock error: {}", e)))?;
        data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<bool> {
        let mut data = self
            .data
            .write()
            .map_err(|e| Error::Storage(format!("lock error: {}", e)))?;
        Ok(data.remove(key).is_some())
    }

    fn exists(&self, key: &[u8]) -> Result<bool> {
        let data = self
            .data
            .read()
            .map_err(|e| Error::Storage(format!("lock error: {}", e)))?;
        Ok(data.contains_key(key))
    }

    fn flush(&self) -> Result<()> {
        // Nothing pending for an in-memory store
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LEDGER CHECKPOINTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Save a position-ledger checkpoint into `store`
pub fn save_ledger<B: StorageBackend>(store: &B, ledger: &GlobalLedger) -> Result<()> {
    let bytes = ledger.to_bytes()?;
    store.set(LEDGER_KEY, &bytes)?;
    store.flush()
}

/// Load the position-ledger checkpoint from `store`, if one exists
pub fn load_ledger<B: StorageBackend>(store: &B) -> Result<Option<GlobalLedger>> {
    match store.get(LEDGER_KEY)? {
        Some(bytes) => Ok(Some(GlobalLedger::from_bytes(&bytes)?)),
        None => Ok(None),
    }
}
