//! Durable preference store.
//!
//! Holds the normalized [`Preferences`] for the current identity and keeps
//! them in local storage. For signed-in users the server copy is read on
//! load and written on every update.
//!
//! # Policy
//!
//! - Hydration: defaults, then the local copy, then the server copy. A
//!   server copy is written back locally.
//! - Updates apply locally first. A failed server write leaves the local
//!   value in place; there is no rollback and no retry.
//! - Every load starts a new generation. Server replies that belong to an
//!   older generation are dropped.
//! - While a load is running, updates only change memory. Nothing is
//!   written locally or pushed until hydration finishes, and the hydrated
//!   value replaces them.

use crate::remote::RemoteApi;
use crate::storage::{read_json, write_json, LocalStorage};
use devbits_sync_types::{Identity, Namespace, Preferences, PreferencesPatch, StorageKey};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;

#[derive(Debug, Clone, Default)]
struct Session {
    identity: Identity,
    generation: u64,
    hydrating: bool,
}

/// Preference store shared by every screen.
pub struct PreferenceStore {
    storage: Arc<dyn LocalStorage>,
    remote: Arc<dyn RemoteApi>,
    state: watch::Sender<Preferences>,
    loading: watch::Sender<bool>,
    session: Mutex<Session>,
}

impl PreferenceStore {
    /// Create a store holding the defaults for an anonymous identity.
    ///
    /// Call [`load`](Self::load) to hydrate it.
    pub fn new(storage: Arc<dyn LocalStorage>, remote: Arc<dyn RemoteApi>) -> Self {
        Self {
            storage,
            remote,
            state: watch::Sender::new(Preferences::default()),
            loading: watch::Sender::new(false),
            session: Mutex::new(Session::default()),
        }
    }

    fn session(&self) -> Session {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn is_current(&self, generation: u64) -> bool {
        self.session().generation == generation
    }

    /// Clear the hydrating flag if `generation` is still current.
    fn finish_hydration(&self, generation: u64) -> bool {
        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        if session.generation != generation {
            return false;
        }
        session.hydrating = false;
        true
    }

    /// Hydrate for `identity`. Never fails; problems fall back to defaults.
    pub async fn load(&self, identity: Identity) -> Preferences {
        let generation = {
            let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
            session.identity = identity.clone();
            session.generation += 1;
            session.hydrating = true;
            session.generation
        };
        self.loading.send_replace(true);
        tracing::debug!("Loading preferences for {}", identity);

        let key = StorageKey::new(Namespace::Preferences, identity.clone());
        let mut prefs = match read_json(self.storage.as_ref(), &key).await {
            Some(local) => Preferences::from_json(&local),
            None => Preferences::default(),
        };

        if let Some(user) = identity.username() {
            match self.remote.fetch_user_settings(user).await {
                Ok(Some(server)) => {
                    prefs.apply(&PreferencesPatch::from_json(&server));
                    if self.is_current(generation) {
                        write_json(self.storage.as_ref(), &key, &prefs.to_json()).await;
                    }
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("Failed to fetch settings for {}: {}", user, e),
            }
        }

        if self.finish_hydration(generation) {
            self.state.send_replace(prefs.clone());
            self.loading.send_replace(false);
        } else {
            tracing::debug!("Discarding stale preference load for {}", identity);
        }
        prefs
    }

    /// Apply `patch` and persist it. Returns the value now in effect.
    pub async fn update(&self, patch: PreferencesPatch) -> Preferences {
        let Session {
            identity,
            generation,
            hydrating,
        } = self.session();
        let key = StorageKey::new(Namespace::Preferences, identity.clone());

        let mut applied = Preferences::default();
        self.state.send_modify(|prefs| {
            prefs.apply(&patch);
            applied = prefs.clone();
        });
        if hydrating {
            tracing::debug!("Preferences for {} still loading, update kept in memory", identity);
            return applied;
        }
        write_json(self.storage.as_ref(), &key, &applied.to_json()).await;

        let Some(user) = identity.username() else {
            return applied;
        };
        match self.remote.push_user_settings(user, &applied.to_json()).await {
            Ok(Some(server)) => {
                if !self.is_current(generation) {
                    tracing::debug!("Discarding settings reply for previous identity {}", user);
                    return applied;
                }
                let reconciled = applied.merged(&PreferencesPatch::from_json(&server));
                self.state.send_replace(reconciled.clone());
                write_json(self.storage.as_ref(), &key, &reconciled.to_json()).await;
                reconciled
            }
            Ok(None) => applied,
            Err(e) => {
                tracing::warn!("Failed to push settings for {}: {}", user, e);
                applied
            }
        }
    }

    /// Current preferences.
    pub fn current(&self) -> Preferences {
        self.state.borrow().clone()
    }

    /// Receiver that observes every change.
    pub fn subscribe(&self) -> watch::Receiver<Preferences> {
        self.state.subscribe()
    }

    /// Whether a load is running.
    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    /// Identity of the last load.
    pub fn identity(&self) -> Identity {
        self.session().identity
    }
}

impl std::fmt::Debug for PreferenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferenceStore")
            .field("identity", &self.identity())
            .field("preferences", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}
