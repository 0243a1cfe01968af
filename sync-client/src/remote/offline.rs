//! Remote that is never reachable.

use super::{RemoteApi, RemoteError};
use async_trait::async_trait;
use devbits_sync_types::{EntityId, Username};
use serde_json::Value;
use std::time::Duration;

/// [`RemoteApi`] for runs without a backend.
///
/// Every call fails with [`RemoteError::Unavailable`], so authenticated
/// identities fall back to the fail-soft paths of each store.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineRemote;

impl OfflineRemote {
    fn unavailable() -> RemoteError {
        RemoteError::Unavailable("offline".to_string())
    }
}

#[async_trait]
impl RemoteApi for OfflineRemote {
    async fn fetch_saved_post_ids(&self, _user: &Username) -> Result<Vec<EntityId>, RemoteError> {
        Err(Self::unavailable())
    }

    async fn save_post(&self, _user: &Username, _post_id: EntityId) -> Result<(), RemoteError> {
        Err(Self::unavailable())
    }

    async fn unsave_post(&self, _user: &Username, _post_id: EntityId) -> Result<(), RemoteError> {
        Err(Self::unavailable())
    }

    async fn fetch_followed_project_ids(
        &self,
        _user: &Username,
    ) -> Result<Vec<EntityId>, RemoteError> {
        Err(Self::unavailable())
    }

    async fn follow_project(
        &self,
        _user: &Username,
        _project_id: EntityId,
    ) -> Result<(), RemoteError> {
        Err(Self::unavailable())
    }

    async fn unfollow_project(
        &self,
        _user: &Username,
        _project_id: EntityId,
    ) -> Result<(), RemoteError> {
        Err(Self::unavailable())
    }

    async fn fetch_user_settings(&self, _user: &Username) -> Result<Option<Value>, RemoteError> {
        Err(Self::unavailable())
    }

    async fn push_user_settings(
        &self,
        _user: &Username,
        _settings: &Value,
    ) -> Result<Option<Value>, RemoteError> {
        Err(Self::unavailable())
    }

    fn begin_fresh_read_window(&self, _duration: Duration) {}
}
