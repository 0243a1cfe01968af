//! Mock remote for testing.
//!
//! Keeps a small in-memory backend, records every call and allows injecting
//! failures or holding writes open.

use super::{RemoteApi, RemoteError};
use async_trait::async_trait;
use devbits_sync_core::{FreshReadWindow, SavedSet};
use devbits_sync_types::{EntityId, Username};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;

/// Operation kinds, used to target injected failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOp {
    /// `fetch_saved_post_ids`
    FetchSavedPostIds,
    /// `save_post`
    SavePost,
    /// `unsave_post`
    UnsavePost,
    /// `fetch_followed_project_ids`
    FetchFollowedProjectIds,
    /// `follow_project`
    FollowProject,
    /// `unfollow_project`
    UnfollowProject,
    /// `fetch_user_settings`
    FetchUserSettings,
    /// `push_user_settings`
    PushUserSettings,
}

impl RemoteOp {
    /// Whether the operation changes backend state.
    pub fn is_write(self) -> bool {
        !matches!(
            self,
            Self::FetchSavedPostIds | Self::FetchFollowedProjectIds | Self::FetchUserSettings
        )
    }
}

/// A recorded call.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    FetchSavedPostIds(String),
    SavePost(String, EntityId),
    UnsavePost(String, EntityId),
    FetchFollowedProjectIds(String),
    FollowProject(String, EntityId),
    UnfollowProject(String, EntityId),
    FetchUserSettings(String),
    PushUserSettings(String, Value),
    BeginFreshReadWindow(Duration),
}

impl RemoteCall {
    /// Operation kind of this call, `None` for the fresh-read signal.
    pub fn op(&self) -> Option<RemoteOp> {
        Some(match self {
            Self::FetchSavedPostIds(_) => RemoteOp::FetchSavedPostIds,
            Self::SavePost(..) => RemoteOp::SavePost,
            Self::UnsavePost(..) => RemoteOp::UnsavePost,
            Self::FetchFollowedProjectIds(_) => RemoteOp::FetchFollowedProjectIds,
            Self::FollowProject(..) => RemoteOp::FollowProject,
            Self::UnfollowProject(..) => RemoteOp::UnfollowProject,
            Self::FetchUserSettings(_) => RemoteOp::FetchUserSettings,
            Self::PushUserSettings(..) => RemoteOp::PushUserSettings,
            Self::BeginFreshReadWindow(_) => return None,
        })
    }
}

/// Mock remote for testing.
///
/// Clones share the same backend state.
#[derive(Debug, Default)]
pub struct MockRemote {
    inner: Arc<Mutex<MockRemoteInner>>,
}

#[derive(Debug, Default)]
struct MockRemoteInner {
    saved_posts: SavedSet,
    followed: SavedSet,
    settings: Option<Value>,
    push_replies: VecDeque<Option<Value>>,
    calls: Vec<RemoteCall>,
    failures: HashMap<RemoteOp, VecDeque<RemoteError>>,
    gate: Option<Arc<Notify>>,
    read_gate: Option<Arc<Notify>>,
    window: FreshReadWindow,
}

impl MockRemote {
    /// Create a mock with an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockRemoteInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed the saved-post ids.
    pub fn set_saved_posts(&self, ids: &[EntityId]) {
        self.lock().saved_posts = SavedSet::from_ids(ids.iter().copied());
    }

    /// Seed the followed-stream ids.
    pub fn set_followed_projects(&self, ids: &[EntityId]) {
        self.lock().followed = SavedSet::from_ids(ids.iter().copied());
    }

    /// Seed the server-side settings object.
    pub fn set_settings(&self, settings: Option<Value>) {
        self.lock().settings = settings;
    }

    /// Saved-post ids as the backend holds them.
    pub fn saved_posts(&self) -> Vec<EntityId> {
        self.lock().saved_posts.ids().to_vec()
    }

    /// Followed-stream ids as the backend holds them.
    pub fn followed_projects(&self) -> Vec<EntityId> {
        self.lock().followed.ids().to_vec()
    }

    /// Settings object as the backend holds it.
    pub fn settings(&self) -> Option<Value> {
        self.lock().settings.clone()
    }

    /// Queue the value returned by the next `push_user_settings()`.
    pub fn queue_push_reply(&self, reply: Option<Value>) {
        self.lock().push_replies.push_back(reply);
    }

    /// Cause the next call of kind `op` to fail with `error`.
    pub fn fail_next(&self, op: RemoteOp, error: RemoteError) {
        self.lock().failures.entry(op).or_default().push_back(error);
    }

    /// Hold every write open until the returned handle is notified.
    ///
    /// Each `notify_one()` releases one pending (or the next) write.
    pub fn hold_writes(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.lock().gate = Some(Arc::clone(&gate));
        gate
    }

    /// Stop holding writes. Writes already waiting stay held.
    pub fn release_writes(&self) {
        self.lock().gate = None;
    }

    /// Hold every read open until the returned handle is notified.
    pub fn hold_reads(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.lock().read_gate = Some(Arc::clone(&gate));
        gate
    }

    /// Every recorded call, oldest first.
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.lock().calls.clone()
    }

    /// Recorded calls excluding fresh-read signals.
    pub fn api_calls(&self) -> Vec<RemoteCall> {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.op().is_some())
            .cloned()
            .collect()
    }

    /// Whether a fresh-read window is open now.
    pub fn fresh_read_active(&self) -> bool {
        self.lock()
            .window
            .is_active(tokio::time::Instant::now().into_std())
    }

    /// Clear all state (backend, calls, failures).
    pub fn reset(&self) {
        *self.lock() = MockRemoteInner::default();
    }

    /// Record `call`, then wait on the matching gate.
    ///
    /// Returns the injected failure for the call, if any.
    async fn begin(&self, call: RemoteCall) -> Option<RemoteError> {
        let (failure, gate) = {
            let mut inner = self.lock();
            let op = call.op();
            let failure = op
                .and_then(|op| inner.failures.get_mut(&op))
                .and_then(VecDeque::pop_front);
            let gate = match op {
                Some(op) if op.is_write() => inner.gate.clone(),
                Some(_) => inner.read_gate.clone(),
                None => None,
            };
            inner.calls.push(call);
            (failure, gate)
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        failure
    }

    async fn write<F>(&self, call: RemoteCall, apply: F) -> Result<(), RemoteError>
    where
        F: FnOnce(&mut MockRemoteInner) + Send,
    {
        if let Some(error) = self.begin(call).await {
            return Err(error);
        }
        apply(&mut self.lock());
        Ok(())
    }

    async fn read<T, F>(&self, call: RemoteCall, get: F) -> Result<T, RemoteError>
    where
        F: FnOnce(&MockRemoteInner) -> T + Send,
    {
        match self.begin(call).await {
            Some(error) => Err(error),
            None => Ok(get(&self.lock())),
        }
    }
}

impl Clone for MockRemote {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl RemoteApi for MockRemote {
    async fn fetch_saved_post_ids(&self, user: &Username) -> Result<Vec<EntityId>, RemoteError> {
        self.read(RemoteCall::FetchSavedPostIds(user.to_string()), |inner| {
            inner.saved_posts.ids().to_vec()
        })
        .await
    }

    async fn save_post(&self, user: &Username, post_id: EntityId) -> Result<(), RemoteError> {
        self.write(RemoteCall::SavePost(user.to_string(), post_id), |inner| {
            inner.saved_posts.insert(post_id);
        })
        .await
    }

    async fn unsave_post(&self, user: &Username, post_id: EntityId) -> Result<(), RemoteError> {
        self.write(RemoteCall::UnsavePost(user.to_string(), post_id), |inner| {
            inner.saved_posts.remove(post_id);
        })
        .await
    }

    async fn fetch_followed_project_ids(
        &self,
        user: &Username,
    ) -> Result<Vec<EntityId>, RemoteError> {
        self.read(RemoteCall::FetchFollowedProjectIds(user.to_string()), |inner| {
            inner.followed.ids().to_vec()
        })
        .await
    }

    async fn follow_project(
        &self,
        user: &Username,
        project_id: EntityId,
    ) -> Result<(), RemoteError> {
        self.write(RemoteCall::FollowProject(user.to_string(), project_id), |inner| {
            inner.followed.insert(project_id);
        })
        .await
    }

    async fn unfollow_project(
        &self,
        user: &Username,
        project_id: EntityId,
    ) -> Result<(), RemoteError> {
        self.write(RemoteCall::UnfollowProject(user.to_string(), project_id), |inner| {
            inner.followed.remove(project_id);
        })
        .await
    }

    async fn fetch_user_settings(&self, user: &Username) -> Result<Option<Value>, RemoteError> {
        self.read(RemoteCall::FetchUserSettings(user.to_string()), |inner| {
            inner.settings.clone()
        })
        .await
    }

    async fn push_user_settings(
        &self,
        user: &Username,
        settings: &Value,
    ) -> Result<Option<Value>, RemoteError> {
        let mut reply = None;
        let stored = settings.clone();
        self.write(
            RemoteCall::PushUserSettings(user.to_string(), settings.clone()),
            |inner| {
                inner.settings = Some(stored);
                reply = inner.push_replies.pop_front().flatten();
            },
        )
        .await?;
        Ok(reply)
    }

    fn begin_fresh_read_window(&self, duration: Duration) {
        let mut inner = self.lock();
        inner.calls.push(RemoteCall::BeginFreshReadWindow(duration));
        inner
            .window
            .begin(tokio::time::Instant::now().into_std(), duration);
    }
}
