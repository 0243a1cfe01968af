//! Fine-grained entity mutation events.
//!
//! Events describe a change to one entity instance and are broadcast to
//! every mounted view. They are never stored.

use serde::{Deserialize, Serialize};

use crate::{EntityId, ProjectPatch};

/// A change to one post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PostEvent {
    /// Content (and possibly media) was replaced.
    #[serde(rename_all = "camelCase")]
    Updated {
        /// Affected post.
        post_id: EntityId,
        /// New markdown body.
        content: String,
        /// New media list, if it changed.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        media: Option<Vec<String>>,
    },
    /// The post was removed.
    #[serde(rename_all = "camelCase")]
    Deleted {
        /// Affected post.
        post_id: EntityId,
    },
    /// Counters changed. Absent fields keep their previous value.
    #[serde(rename_all = "camelCase")]
    Stats {
        /// Affected post.
        post_id: EntityId,
        /// New like count.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        likes: Option<i64>,
        /// New comment count.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        comments: Option<i64>,
        /// Whether the current user now likes the post.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is_liked: Option<bool>,
    },
}

impl PostEvent {
    /// The post this event is about.
    pub fn post_id(&self) -> EntityId {
        match self {
            Self::Updated { post_id, .. }
            | Self::Deleted { post_id }
            | Self::Stats { post_id, .. } => *post_id,
        }
    }
}

/// A change to one project (stream).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ProjectEvent {
    /// Fields were edited; the patch is shallow-merged.
    #[serde(rename_all = "camelCase")]
    Updated {
        /// Affected project.
        project_id: EntityId,
        /// Changed fields.
        patch: ProjectPatch,
    },
    /// The project was removed.
    #[serde(rename_all = "camelCase")]
    Deleted {
        /// Affected project.
        project_id: EntityId,
    },
    /// Counters changed. Absent fields keep their previous value.
    #[serde(rename_all = "camelCase")]
    Stats {
        /// Affected project.
        project_id: EntityId,
        /// New like count.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        likes: Option<i64>,
        /// New follower count.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        saves: Option<i64>,
        /// Whether the current user now likes the project.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is_liked: Option<bool>,
    },
}

impl ProjectEvent {
    /// The project this event is about.
    pub fn project_id(&self) -> EntityId {
        match self {
            Self::Updated { project_id, .. }
            | Self::Deleted { project_id }
            | Self::Stats { project_id, .. } => *project_id,
        }
    }
}
