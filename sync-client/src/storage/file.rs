//! File-backed storage.
//!
//! Layout under the root directory:
//!
//! ```text
//! <root>/<namespace>/anonymous.json
//! <root>/<namespace>/user-<hex(username)>.json
//! ```
//!
//! Hex-encoding the username keeps every user in its own file whatever
//! characters the name contains.

use super::{LocalStorage, StorageError};
use async_trait::async_trait;
use devbits_sync_types::{Identity, StorageKey};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// [`LocalStorage`] that keeps one JSON file per key.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Create storage rooted at `root`. Directories are created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File that holds the value for `key`.
    pub fn path_for(&self, key: &StorageKey) -> PathBuf {
        let file_name = match key.identity() {
            Identity::Anonymous => "anonymous.json".to_string(),
            Identity::User(name) => format!("user-{}.json", hex::encode(name.as_str())),
        };
        self.root.join(key.namespace().as_str()).join(file_name)
    }
}

#[async_trait]
impl LocalStorage for FileStorage {
    async fn get(&self, key: &StorageKey) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &StorageKey, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }

        // Write-then-rename; every writer gets its own temp file
        let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = path.with_extension(format!("json.{}-{}.tmp", std::process::id(), seq));
        if let Err(e) = tokio::fs::write(&tmp, value).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}
