//! CLI command implementations.

pub mod prefs;
pub mod saved;

#[cfg(test)]
pub(crate) mod test_support {
    use devbits_sync_client::{ClientConfig, FileStorage, OfflineRemote, SyncContext};
    use std::path::Path;
    use std::sync::Arc;

    /// Context over a file store in `dir` with the offline remote.
    pub fn context(dir: &Path) -> SyncContext {
        SyncContext::new(
            Arc::new(FileStorage::new(dir)),
            Arc::new(OfflineRemote),
            ClientConfig::default(),
        )
    }
}
