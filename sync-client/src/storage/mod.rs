//! Local key-value storage for persisted sync state.
//!
//! Values are JSON text keyed by [`StorageKey`]. Two backends ship here:
//! - [`FileStorage`] writes one file per key under a data directory
//! - [`MemoryStorage`] keeps everything in memory (tests, ephemeral runs)
//!
//! Stores never surface storage failures to their callers. The helpers
//! [`read_json`] and [`write_json`] log and swallow them.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use async_trait::async_trait;
use devbits_sync_types::StorageKey;
use serde_json::Value;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing medium failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Key-value store holding JSON text.
#[async_trait]
pub trait LocalStorage: Send + Sync {
    /// Read the value for `key`. Missing keys yield `Ok(None)`.
    async fn get(&self, key: &StorageKey) -> Result<Option<String>, StorageError>;

    /// Write `value` under `key`, replacing any previous value.
    async fn set(&self, key: &StorageKey, value: &str) -> Result<(), StorageError>;
}

/// Read and parse the JSON value under `key`.
///
/// Missing keys, read failures and malformed JSON all yield `None`.
pub async fn read_json(storage: &dyn LocalStorage, key: &StorageKey) -> Option<Value> {
    let raw = match storage.get(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!("Failed to read {}: {}", key, e);
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Ignoring malformed value under {}: {}", key, e);
            None
        }
    }
}

/// Serialize and write `value` under `key`.
///
/// Returns whether the write succeeded; failures are logged.
pub async fn write_json(storage: &dyn LocalStorage, key: &StorageKey, value: &Value) -> bool {
    match storage.set(key, &value.to_string()).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Failed to persist {}: {}", key, e);
            false
        }
    }
}
