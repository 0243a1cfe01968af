//! SyncContext - the entry point applications construct once.
//!
//! Owns the preference store, both saved-set stores and both event buses,
//! all sharing one [`LocalStorage`] and one [`RemoteApi`].
//!
//! # Example
//!
//! ```ignore
//! use devbits_sync_client::{ClientConfig, FileStorage, SyncContext};
//!
//! let config = ClientConfig::default();
//! let storage = Arc::new(FileStorage::new(&config.storage.dir));
//! let ctx = SyncContext::new(storage, remote, config);
//!
//! ctx.set_identity(Identity::from_optional(Some("ada"))).await;
//! ctx.saved_posts().toggle(EntityId::new(42)).await?;
//! ```

use crate::config::ClientConfig;
use crate::preferences::PreferenceStore;
use crate::remote::RemoteApi;
use crate::saved::{SavedKind, SavedSetStore};
use crate::scheduler::AutoRefresh;
use crate::storage::LocalStorage;
use devbits_sync_core::{PostEvents, ProjectEvents};
use devbits_sync_types::Identity;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

/// Container for the client-side sync state of one app session.
pub struct SyncContext {
    config: ClientConfig,
    remote: Arc<dyn RemoteApi>,
    identity: Mutex<Identity>,
    preferences: Arc<PreferenceStore>,
    saved_posts: Arc<SavedSetStore>,
    saved_streams: Arc<SavedSetStore>,
    post_events: PostEvents,
    project_events: ProjectEvents,
}

impl SyncContext {
    /// Build a context for an anonymous identity. Stores start empty until
    /// [`set_identity`](Self::set_identity) hydrates them.
    pub fn new(
        storage: Arc<dyn LocalStorage>,
        remote: Arc<dyn RemoteApi>,
        config: ClientConfig,
    ) -> Self {
        Self {
            preferences: Arc::new(PreferenceStore::new(Arc::clone(&storage), Arc::clone(&remote))),
            saved_posts: Arc::new(SavedSetStore::new(
                SavedKind::Posts,
                Arc::clone(&storage),
                Arc::clone(&remote),
            )),
            saved_streams: Arc::new(SavedSetStore::new(
                SavedKind::Streams,
                storage,
                Arc::clone(&remote),
            )),
            post_events: PostEvents::new(),
            project_events: ProjectEvents::new(),
            identity: Mutex::new(Identity::Anonymous),
            remote,
            config,
        }
    }

    /// Switch identity (sign-in, sign-out, account switch) and reload every
    /// store for it.
    pub async fn set_identity(&self, identity: Identity) {
        let previous = std::mem::replace(
            &mut *self.identity.lock().unwrap_or_else(PoisonError::into_inner),
            identity.clone(),
        );
        tracing::info!("Identity changed: {} -> {}", previous, identity);

        tokio::join!(
            self.preferences.load(identity.clone()),
            self.saved_posts.load(identity.clone()),
            self.saved_streams.load(identity),
        );
    }

    /// Current identity.
    pub fn identity(&self) -> Identity {
        self.identity
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Preference store.
    pub fn preferences(&self) -> &Arc<PreferenceStore> {
        &self.preferences
    }

    /// Saved-posts store.
    pub fn saved_posts(&self) -> &Arc<SavedSetStore> {
        &self.saved_posts
    }

    /// Followed-streams store.
    pub fn saved_streams(&self) -> &Arc<SavedSetStore> {
        &self.saved_streams
    }

    /// Store for `kind`.
    pub fn saved(&self, kind: SavedKind) -> &Arc<SavedSetStore> {
        match kind {
            SavedKind::Posts => &self.saved_posts,
            SavedKind::Streams => &self.saved_streams,
        }
    }

    /// Post mutation bus.
    pub fn post_events(&self) -> &PostEvents {
        &self.post_events
    }

    /// Project mutation bus.
    pub fn project_events(&self) -> &ProjectEvents {
        &self.project_events
    }

    /// Configuration this context was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build a refresh scheduler for one screen, driven by this context's
    /// preferences.
    pub fn auto_refresh<F, Fut>(&self, callback: F) -> AutoRefresh
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        AutoRefresh::new(
            callback,
            Arc::clone(&self.remote),
            self.preferences.subscribe(),
            self.config.refresh.focus_policy(),
            self.config.refresh.fresh_read_window(),
        )
    }

    /// End the session and release the stores.
    ///
    /// Schedulers built from this context keep their last timer cadence
    /// until they are dropped.
    pub fn shutdown(self) {
        tracing::info!(
            "Sync context shut down ({} post listeners, {} project listeners)",
            self.post_events.listener_count(),
            self.project_events.listener_count()
        );
    }
}

impl std::fmt::Debug for SyncContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncContext")
            .field("identity", &self.identity())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
