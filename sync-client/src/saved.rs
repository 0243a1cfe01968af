//! Saved-set stores: saved posts and followed streams.
//!
//! One [`SavedSetStore`] per [`SavedKind`]. Signed-in users are
//! server-backed: toggles wait for the remote call and only then change
//! local state. Anonymous users keep the set in local storage.

use crate::remote::{RemoteApi, RemoteError};
use crate::storage::{read_json, write_json, LocalStorage};
use devbits_sync_core::{InFlightSet, SavedSet, ToggleAction};
use devbits_sync_types::{EntityId, Identity, Namespace, StorageKey, Username};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::sync::watch;

/// Which set a store holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SavedKind {
    /// Saved posts.
    Posts,
    /// Followed streams (projects).
    Streams,
}

impl SavedKind {
    /// Storage namespace for this kind.
    pub fn namespace(self) -> Namespace {
        match self {
            Self::Posts => Namespace::SavedPosts,
            Self::Streams => Namespace::SavedStreams,
        }
    }

    /// Lower-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Posts => "posts",
            Self::Streams => "streams",
        }
    }
}

impl fmt::Display for SavedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Saved-set errors.
#[derive(Debug, Error)]
pub enum SavedError {
    /// The remote call failed; local state is unchanged.
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// A toggle for this id has not finished yet.
    #[error("toggle already in flight for {0}")]
    ToggleInFlight(EntityId),
}

#[derive(Debug, Clone, Default)]
struct Session {
    identity: Identity,
    generation: u64,
}

/// Store for one saved set.
pub struct SavedSetStore {
    kind: SavedKind,
    storage: Arc<dyn LocalStorage>,
    remote: Arc<dyn RemoteApi>,
    state: watch::Sender<SavedSet>,
    loading: watch::Sender<bool>,
    session: Mutex<Session>,
    in_flight: InFlightSet<EntityId>,
}

impl SavedSetStore {
    /// Create an empty store for an anonymous identity.
    pub fn new(kind: SavedKind, storage: Arc<dyn LocalStorage>, remote: Arc<dyn RemoteApi>) -> Self {
        Self {
            kind,
            storage,
            remote,
            state: watch::Sender::new(SavedSet::new()),
            loading: watch::Sender::new(false),
            session: Mutex::new(Session::default()),
            in_flight: InFlightSet::new(),
        }
    }

    /// Which set this store holds.
    pub fn kind(&self) -> SavedKind {
        self.kind
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

    fn key(&self, identity: &Identity) -> StorageKey {
        StorageKey::new(self.kind.namespace(), identity.clone())
    }

    async fn fetch_remote(&self, user: &Username) -> Result<Vec<EntityId>, RemoteError> {
        match self.kind {
            SavedKind::Posts => self.remote.fetch_saved_post_ids(user).await,
            SavedKind::Streams => self.remote.fetch_followed_project_ids(user).await,
        }
    }

    async fn push_remote(
        &self,
        user: &Username,
        id: EntityId,
        action: ToggleAction,
    ) -> Result<(), RemoteError> {
        match (self.kind, action) {
            (SavedKind::Posts, ToggleAction::Add) => self.remote.save_post(user, id).await,
            (SavedKind::Posts, ToggleAction::Remove) => self.remote.unsave_post(user, id).await,
            (SavedKind::Streams, ToggleAction::Add) => self.remote.follow_project(user, id).await,
            (SavedKind::Streams, ToggleAction::Remove) => {
                self.remote.unfollow_project(user, id).await
            }
        }
    }

    async fn persist_local(&self, identity: &Identity) {
        let snapshot = self.state.borrow().to_json();
        write_json(self.storage.as_ref(), &self.key(identity), &snapshot).await;
    }

    /// Hydrate for `identity`. Never fails; problems yield an empty set.
    pub async fn load(&self, identity: Identity) -> SavedSet {
        let generation = {
            let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
            session.identity = identity.clone();
            session.generation += 1;
            session.generation
        };
        self.loading.send_replace(true);
        tracing::debug!("Loading saved {} for {}", self.kind, identity);

        let set = match identity.username() {
            Some(user) => match self.fetch_remote(user).await {
                Ok(ids) => SavedSet::from_ids(ids),
                Err(e) => {
                    tracing::warn!("Failed to fetch saved {} for {}: {}", self.kind, user, e);
                    SavedSet::new()
                }
            },
            None => read_json(self.storage.as_ref(), &self.key(&identity))
                .await
                .map(|value| SavedSet::from_json(&value))
                .unwrap_or_default(),
        };

        if self.is_current(generation) {
            self.state.send_replace(set.clone());
            self.loading.send_replace(false);
        } else {
            tracing::debug!("Discarding stale saved {} load for {}", self.kind, identity);
        }
        set
    }

    /// Flip membership of `id`. Returns `true` if the id is now in the set.
    ///
    /// For signed-in users the remote call must succeed before local state
    /// changes; on failure the error is returned and nothing changes.
    pub async fn toggle(&self, id: EntityId) -> Result<bool, SavedError> {
        let _token = self
            .in_flight
            .try_acquire(id)
            .ok_or(SavedError::ToggleInFlight(id))?;
        let Session {
            identity,
            generation,
        } = self.session();
        let action = self.state.borrow().plan_toggle(id);

        let Some(user) = identity.username() else {
            self.state.send_modify(|set| {
                set.apply(id, action);
            });
            self.persist_local(&identity).await;
            return Ok(action == ToggleAction::Add);
        };

        match self.push_remote(user, id, action).await {
            Ok(()) => {}
            Err(RemoteError::AlreadyApplied(message)) => {
                tracing::debug!("Saved {} {} already applied: {}", self.kind, id, message);
            }
            Err(e) => return Err(e.into()),
        }

        if !self.is_current(generation) {
            return Ok(action == ToggleAction::Add);
        }
        self.state.send_modify(|set| {
            set.apply(id, action);
        });

        if self.kind == SavedKind::Streams {
            match self.fetch_remote(user).await {
                Ok(ids) if self.is_current(generation) => {
                    self.state.send_replace(SavedSet::from_ids(ids));
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("Failed to refresh followed streams for {}: {}", user, e),
            }
        }
        Ok(action == ToggleAction::Add)
    }

    /// Drop `ids` from the set, e.g. after the streams were deleted.
    ///
    /// Signed-in users get one remote removal per id; individual failures
    /// are logged and ignored.
    pub async fn remove_many(&self, ids: &[EntityId]) {
        if ids.is_empty() {
            return;
        }
        let Session {
            identity,
            generation,
        } = self.session();

        if let Some(user) = identity.username() {
            for &id in ids {
                if let Err(e) = self.push_remote(user, id, ToggleAction::Remove).await {
                    tracing::debug!("Ignoring failed removal of {} {}: {}", self.kind, id, e);
                }
            }
        }

        if !self.is_current(generation) {
            return;
        }
        self.state.send_modify(|set| set.remove_all(ids));
        if !identity.is_authenticated() {
            self.persist_local(&identity).await;
        }
    }

    /// Membership check.
    pub fn is_saved(&self, id: EntityId) -> bool {
        self.state.borrow().contains(id)
    }

    /// Ids in the set.
    pub fn ids(&self) -> Vec<EntityId> {
        self.state.borrow().ids().to_vec()
    }

    /// Receiver that observes every change.
    pub fn subscribe(&self) -> watch::Receiver<SavedSet> {
        self.state.subscribe()
    }

    /// Whether a load is running.
    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }
}

impl fmt::Debug for SavedSetStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SavedSetStore")
            .field("kind", &self.kind)
            .field("identity", &self.session().identity)
            .field("ids", &self.ids())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{MockRemote, RemoteCall, RemoteOp};
    use crate::storage::MemoryStorage;

    fn setup(kind: SavedKind) -> (SavedSetStore, MemoryStorage, MockRemote) {
        let storage = MemoryStorage::new();
        let remote = MockRemote::new();
        let store = SavedSetStore::new(kind, Arc::new(storage.clone()), Arc::new(remote.clone()));
        (store, storage, remote)
    }

    fn ada() -> Identity {
        Identity::from_optional(Some("ada"))
    }

    fn id(n: i64) -> EntityId {
        EntityId::new(n)
    }

    fn anon_key(kind: SavedKind) -> StorageKey {
        StorageKey::anonymous(kind.namespace())
    }

    // ===========================================
    // Loading
    // ===========================================

    #[tokio::test]
    async fn anonymous_load_reads_local_array() {
        let (store, storage, remote) = setup(SavedKind::Posts);
        storage.set(&anon_key(SavedKind::Posts), "[3, 1, 3, \"x\", 2.5]").await.unwrap();

        store.load(Identity::Anonymous).await;
        assert_eq!(store.ids(), vec![id(3), id(1)]);
        assert!(remote.calls().is_empty());
    }

    #[tokio::test]
    async fn anonymous_load_malformed_is_empty() {
        let (store, storage, _) = setup(SavedKind::Streams);
        storage.set(&anon_key(SavedKind::Streams), "{\"a\":1}").await.unwrap();
        assert!(store.load(Identity::Anonymous).await.is_empty());
    }

    #[tokio::test]
    async fn authenticated_load_fetches_remote() {
        let (store, _, remote) = setup(SavedKind::Streams);
        remote.set_followed_projects(&[id(5), id(6)]);

        store.load(ada()).await;
        assert!(store.is_saved(id(5)));
        assert_eq!(
            remote.calls(),
            vec![RemoteCall::FetchFollowedProjectIds("ada".into())]
        );
    }

    #[tokio::test]
    async fn authenticated_load_failure_is_empty() {
        let (store, storage, remote) = setup(SavedKind::Posts);
        storage.set(&anon_key(SavedKind::Posts), "[1]").await.unwrap();
        remote.set_saved_posts(&[id(2)]);
        remote.fail_next(RemoteOp::FetchSavedPostIds, RemoteError::Unavailable("down".into()));

        assert!(store.load(ada()).await.is_empty());
        assert!(!store.is_loading());
    }

    // ===========================================
    // Anonymous Toggles
    // ===========================================

    #[tokio::test]
    async fn anonymous_toggle_persists_locally_without_remote_calls() {
        let (store, storage, remote) = setup(SavedKind::Posts);
        store.load(Identity::Anonymous).await;

        assert!(store.toggle(id(42)).await.unwrap());
        assert_eq!(storage.raw(&anon_key(SavedKind::Posts)), Some("[42]".to_string()));

        assert!(!store.toggle(id(42)).await.unwrap());
        assert_eq!(storage.raw(&anon_key(SavedKind::Posts)), Some("[]".to_string()));

        assert!(remote.calls().is_empty());
    }

    #[tokio::test]
    async fn anonymous_toggle_survives_storage_failure() {
        let (store, storage, _) = setup(SavedKind::Posts);
        storage.fail_next_set("disk full");

        assert!(store.toggle(id(1)).await.unwrap());
        assert!(store.is_saved(id(1)));
    }

    // ===========================================
    // Authenticated Toggles
    // ===========================================

    #[tokio::test]
    async fn authenticated_toggle_twice_restores_membership() {
        let (store, _, remote) = setup(SavedKind::Posts);
        store.load(ada()).await;

        assert!(store.toggle(id(7)).await.unwrap());
        assert!(store.is_saved(id(7)));
        assert!(!store.toggle(id(7)).await.unwrap());
        assert!(!store.is_saved(id(7)));

        assert_eq!(
            remote.api_calls()[1..],
            [
                RemoteCall::SavePost("ada".into(), id(7)),
                RemoteCall::UnsavePost("ada".into(), id(7)),
            ]
        );
    }

    #[tokio::test]
    async fn remote_failure_leaves_state_untouched() {
        let (store, _, remote) = setup(SavedKind::Posts);
        remote.set_saved_posts(&[id(1)]);
        store.load(ada()).await;
        remote.fail_next(RemoteOp::UnsavePost, RemoteError::Unauthorized);

        let err = store.toggle(id(1)).await.unwrap_err();
        assert!(matches!(err, SavedError::Remote(RemoteError::Unauthorized)));
        assert!(store.is_saved(id(1)));
    }

    #[tokio::test]
    async fn already_applied_counts_as_success() {
        let (store, _, remote) = setup(SavedKind::Streams);
        store.load(ada()).await;
        remote.fail_next(
            RemoteOp::FollowProject,
            RemoteError::AlreadyApplied("already following".into()),
        );

        assert!(store.toggle(id(3)).await.unwrap());
    }

    #[tokio::test]
    async fn streams_toggle_reconciles_with_server() {
        let (store, _, remote) = setup(SavedKind::Streams);
        store.load(ada()).await;
        remote.set_followed_projects(&[id(9)]);

        assert!(store.toggle(id(3)).await.unwrap());
        assert_eq!(store.ids(), vec![id(9), id(3)]);
        assert_eq!(
            remote.api_calls().last(),
            Some(&RemoteCall::FetchFollowedProjectIds("ada".into()))
        );
    }

    #[tokio::test]
    async fn streams_reconcile_failure_keeps_toggled_state() {
        let (store, _, remote) = setup(SavedKind::Streams);
        store.load(ada()).await;
        remote.fail_next(
            RemoteOp::FetchFollowedProjectIds,
            RemoteError::Unavailable("down".into()),
        );

        assert!(store.toggle(id(3)).await.unwrap());
        assert_eq!(store.ids(), vec![id(3)]);
    }

    #[tokio::test]
    async fn concurrent_toggle_for_same_id_is_rejected() {
        let (store, _, remote) = setup(SavedKind::Posts);
        let store = Arc::new(store);
        store.load(ada()).await;
        let gate = remote.hold_writes();

        let first = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.toggle(id(5)).await })
        };
        while remote.api_calls().len() < 2 {
            tokio::task::yield_now().await;
        }

        let second = store.toggle(id(5)).await;
        assert!(matches!(second, Err(SavedError::ToggleInFlight(i)) if i == id(5)));

        gate.notify_one();
        assert!(first.await.unwrap().unwrap());
        assert_eq!(remote.api_calls().len(), 2);
        assert!(store.is_saved(id(5)));
    }

    // ===========================================
    // Bulk Removal
    // ===========================================

    #[tokio::test]
    async fn remove_many_ignores_individual_failures() {
        let (store, _, remote) = setup(SavedKind::Streams);
        remote.set_followed_projects(&[id(1), id(2), id(3)]);
        store.load(ada()).await;
        remote.fail_next(RemoteOp::UnfollowProject, RemoteError::Unavailable("down".into()));

        store.remove_many(&[id(1), id(2)]).await;
        assert_eq!(store.ids(), vec![id(3)]);
        assert_eq!(remote.followed_projects(), vec![id(1), id(3)]);
    }

    #[tokio::test]
    async fn remove_many_anonymous_persists() {
        let (store, storage, remote) = setup(SavedKind::Streams);
        storage.set(&anon_key(SavedKind::Streams), "[1,2,3]").await.unwrap();
        store.load(Identity::Anonymous).await;

        store.remove_many(&[id(2)]).await;
        assert_eq!(storage.raw(&anon_key(SavedKind::Streams)), Some("[1,3]".to_string()));
        assert!(remote.calls().is_empty());
    }

    #[tokio::test]
    async fn remove_many_empty_is_noop() {
        let (store, storage, remote) = setup(SavedKind::Posts);
        store.remove_many(&[]).await;
        assert_eq!(storage.write_count(), 0);
        assert!(remote.calls().is_empty());
    }

    // ===========================================
    // Identity Transitions
    // ===========================================

    #[tokio::test]
    async fn stale_load_does_not_replace_new_identity_set() {
        let (store, storage, remote) = setup(SavedKind::Posts);
        let store = Arc::new(store);
        storage.set(&anon_key(SavedKind::Posts), "[9]").await.unwrap();
        remote.set_saved_posts(&[id(1)]);
        let gate = remote.hold_reads();

        let signing_in = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.load(ada()).await })
        };
        while remote.api_calls().is_empty() {
            tokio::task::yield_now().await;
        }

        store.load(Identity::Anonymous).await;
        gate.notify_one();
        assert_eq!(signing_in.await.unwrap().ids(), [id(1)]);

        assert_eq!(store.ids(), vec![id(9)]);
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn toggle_finishing_after_sign_out_leaves_anonymous_set() {
        let (store, storage, remote) = setup(SavedKind::Posts);
        let store = Arc::new(store);
        storage.set(&anon_key(SavedKind::Posts), "[1]").await.unwrap();
        store.load(ada()).await;
        let gate = remote.hold_writes();

        let pending = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.toggle(id(5)).await })
        };
        while remote.api_calls().len() < 2 {
            tokio::task::yield_now().await;
        }

        store.load(Identity::Anonymous).await;
        gate.notify_one();
        assert!(pending.await.unwrap().unwrap());

        assert_eq!(store.ids(), vec![id(1)]);
        assert_eq!(storage.raw(&anon_key(SavedKind::Posts)), Some("[1]".to_string()));
        assert_eq!(remote.saved_posts(), vec![id(5)]);
    }

    #[tokio::test]
    async fn stale_streams_reconciliation_is_dropped() {
        let (store, storage, remote) = setup(SavedKind::Streams);
        let store = Arc::new(store);
        storage.set(&anon_key(SavedKind::Streams), "[2]").await.unwrap();
        remote.set_followed_projects(&[id(8)]);
        store.load(ada()).await;
        let gate = remote.hold_reads();

        let pending = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.toggle(id(3)).await })
        };
        // load fetch, follow, reconciliation fetch
        while remote.api_calls().len() < 3 {
            tokio::task::yield_now().await;
        }

        store.load(Identity::Anonymous).await;
        gate.notify_one();
        assert!(pending.await.unwrap().unwrap());

        assert_eq!(store.ids(), vec![id(2)]);
        assert_eq!(remote.followed_projects(), vec![id(8), id(3)]);
    }

    #[tokio::test]
    async fn remove_many_finishing_after_sign_out_leaves_anonymous_set() {
        let (store, storage, remote) = setup(SavedKind::Streams);
        let store = Arc::new(store);
        storage.set(&anon_key(SavedKind::Streams), "[1,2]").await.unwrap();
        remote.set_followed_projects(&[id(1), id(2)]);
        store.load(ada()).await;
        let gate = remote.hold_writes();

        let pending = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.remove_many(&[id(1)]).await })
        };
        while remote.api_calls().len() < 2 {
            tokio::task::yield_now().await;
        }

        store.load(Identity::Anonymous).await;
        gate.notify_one();
        pending.await.unwrap();

        assert_eq!(store.ids(), vec![id(1), id(2)]);
        assert_eq!(storage.raw(&anon_key(SavedKind::Streams)), Some("[1,2]".to_string()));
        assert_eq!(remote.followed_projects(), vec![id(2)]);
    }

    #[test]
    fn saved_error_display() {
        assert_eq!(
            SavedError::ToggleInFlight(EntityId::new(4)).to_string(),
            "toggle already in flight for 4"
        );
    }
}
