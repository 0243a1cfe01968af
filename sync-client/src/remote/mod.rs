//! Remote API abstraction.
//!
//! The stores talk to the DevBits backend only through [`RemoteApi`], so the
//! HTTP layer (or a test double) is plugged in by the application.
//!
//! # Design
//!
//! - Saved posts: `fetch_saved_post_ids`, `save_post`, `unsave_post`
//! - Followed streams: `fetch_followed_project_ids`, `follow_project`,
//!   `unfollow_project`
//! - Preferences: `fetch_user_settings`, `push_user_settings`
//! - `begin_fresh_read_window` asks the request layer to bypass short-lived
//!   caches for a moment after a refresh
//!
//! # Example
//!
//! ```ignore
//! let remote = MockRemote::new();
//! remote.set_saved_posts(&[EntityId::new(1)]);
//! let ids = remote.fetch_saved_post_ids(&user).await?;
//! ```

mod mock;
mod offline;

pub use mock::{MockRemote, RemoteCall, RemoteOp};
pub use offline::OfflineRemote;

use async_trait::async_trait;
use devbits_sync_types::{EntityId, Username};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Remote API errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The backend could not be reached.
    #[error("remote unavailable: {0}")]
    Unavailable(String),

    /// The session is missing or expired.
    #[error("not authorized")]
    Unauthorized,

    /// The entity is already in the requested state.
    #[error("already applied: {0}")]
    AlreadyApplied(String),

    /// The backend refused the request.
    #[error("request rejected ({status}): {message}")]
    Rejected {
        /// HTTP-style status code.
        status: u16,
        /// Message returned by the backend.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("malformed response: {0}")]
    Decode(String),
}

/// Backend operations used by the sync layer.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Ids of posts `user` has saved.
    async fn fetch_saved_post_ids(&self, user: &Username) -> Result<Vec<EntityId>, RemoteError>;

    /// Save a post for `user`.
    async fn save_post(&self, user: &Username, post_id: EntityId) -> Result<(), RemoteError>;

    /// Remove a saved post for `user`.
    async fn unsave_post(&self, user: &Username, post_id: EntityId) -> Result<(), RemoteError>;

    /// Ids of streams (projects) `user` follows.
    async fn fetch_followed_project_ids(
        &self,
        user: &Username,
    ) -> Result<Vec<EntityId>, RemoteError>;

    /// Follow a stream for `user`.
    async fn follow_project(&self, user: &Username, project_id: EntityId)
        -> Result<(), RemoteError>;

    /// Unfollow a stream for `user`.
    async fn unfollow_project(
        &self,
        user: &Username,
        project_id: EntityId,
    ) -> Result<(), RemoteError>;

    /// Server-side settings object for `user`, if one exists.
    async fn fetch_user_settings(&self, user: &Username) -> Result<Option<Value>, RemoteError>;

    /// Store `settings` for `user`.
    ///
    /// May return the settings object as the server now holds it.
    async fn push_user_settings(
        &self,
        user: &Username,
        settings: &Value,
    ) -> Result<Option<Value>, RemoteError>;

    /// Make reads within the next `duration` bypass short-lived caches.
    fn begin_fresh_read_window(&self, duration: Duration);
}
