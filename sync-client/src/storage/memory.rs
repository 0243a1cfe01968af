//! In-memory storage.
//!
//! Allows seeding values, inspecting writes and injecting failures.

use super::{LocalStorage, StorageError};
use async_trait::async_trait;
use devbits_sync_types::StorageKey;
use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex, PoisonError};

/// In-memory [`LocalStorage`].
///
/// Clones share the same underlying map.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<MemoryStorageInner>>,
}

#[derive(Debug, Default)]
struct MemoryStorageInner {
    values: HashMap<StorageKey, String>,
    writes: usize,
    fail_next_get: Option<String>,
    fail_next_set: Option<String>,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryStorageInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Raw text stored under `key`.
    pub fn raw(&self, key: &StorageKey) -> Option<String> {
        self.lock().values.get(key).cloned()
    }

    /// Number of successful `set` calls.
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    /// Number of keys present.
    pub fn len(&self) -> usize {
        self.lock().values.len()
    }

    /// Whether no key is present.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cause the next `get()` to fail with the given error.
    pub fn fail_next_get(&self, error: &str) {
        self.lock().fail_next_get = Some(error.to_string());
    }

    /// Cause the next `set()` to fail with the given error.
    pub fn fail_next_set(&self, error: &str) {
        self.lock().fail_next_set = Some(error.to_string());
    }
}

impl Clone for MemoryStorage {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl LocalStorage for MemoryStorage {
    async fn get(&self, key: &StorageKey) -> Result<Option<String>, StorageError> {
        let mut inner = self.lock();
        if let Some(error) = inner.fail_next_get.take() {
            return Err(io::Error::new(io::ErrorKind::Other, error).into());
        }
        Ok(inner.values.get(key).cloned())
    }

    async fn set(&self, key: &StorageKey, value: &str) -> Result<(), StorageError> {
        let mut inner = self.lock();
        if let Some(error) = inner.fail_next_set.take() {
            return Err(io::Error::new(io::ErrorKind::Other, error).into());
        }
        inner.values.insert(key.clone(), value.to_string());
        inner.writes += 1;
        Ok(())
    }
}
