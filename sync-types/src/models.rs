//! View models that mutation events are applied to.
//!
//! These mirror what feed and stream screens render, not the server schema.

use serde::{Deserialize, Serialize};

use crate::EntityId;

/// A post ("byte") as shown in a feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Post id.
    pub id: EntityId,
    /// Author's user id.
    pub author_id: EntityId,
    /// Stream the post belongs to.
    pub project_id: EntityId,
    /// Markdown body.
    pub content: String,
    /// Media URLs.
    #[serde(default)]
    pub media: Vec<String>,
    /// Like count.
    pub likes: i64,
    /// Comment count.
    pub comments: i64,
    /// Whether the current user liked the post.
    #[serde(default)]
    pub is_liked: bool,
    /// Creation timestamp as sent by the server.
    pub created_on: String,
}

/// A project ("stream") as shown in a stream list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Project id.
    pub id: EntityId,
    /// Owner's user id.
    pub owner_id: EntityId,
    /// Display name.
    pub name: String,
    /// One-line summary.
    pub summary: String,
    /// Long-form markdown description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about_md: Option<String>,
    /// Development stage label.
    pub stage: String,
    /// Like count.
    pub likes: i64,
    /// Follower ("save") count.
    pub saves: i64,
    /// Contributor count.
    pub contributors: i64,
    /// Tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Media URLs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<Vec<String>>,
    /// Last update timestamp as sent by the server.
    pub updated_on: String,
}

/// Shallow patch over a [`Project`]; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    /// New owner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<EntityId>,
    /// New name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// New description. `Some(None)` clears it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about_md: Option<Option<String>>,
    /// New stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    /// New like count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes: Option<i64>,
    /// New follower count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saves: Option<i64>,
    /// New contributor count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributors: Option<i64>,
    /// New tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// New media. `Some(None)` clears it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<Option<Vec<String>>>,
    /// New update timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_on: Option<String>,
}

impl Project {
    /// Return a copy with `patch` shallow-merged over it.
    pub fn patched(&self, patch: &ProjectPatch) -> Self {
        let mut next = self.clone();
        if let Some(v) = patch.owner_id {
            next.owner_id = v;
        }
        if let Some(v) = &patch.name {
            next.name = v.clone();
        }
        if let Some(v) = &patch.summary {
            next.summary = v.clone();
        }
        if let Some(v) = &patch.about_md {
            next.about_md = v.clone();
        }
        if let Some(v) = &patch.stage {
            next.stage = v.clone();
        }
        if let Some(v) = patch.likes {
            next.likes = v;
        }
        if let Some(v) = patch.saves {
            next.saves = v;
        }
        if let Some(v) = patch.contributors {
            next.contributors = v;
        }
        if let Some(v) = &patch.tags {
            next.tags = v.clone();
        }
        if let Some(v) = &patch.media {
            next.media = v.clone();
        }
        if let Some(v) = &patch.updated_on {
            next.updated_on = v.clone();
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> Project {
        Project {
            id: EntityId::new(1),
            owner_id: EntityId::new(9),
            name: "devbits".into(),
            summary: "a feed for builders".into(),
            about_md: Some("# About".into()),
            stage: "alpha".into(),
            likes: 4,
            saves: 2,
            contributors: 1,
            tags: vec!["rust".into()],
            media: None,
            updated_on: "2026-01-01T00:00:00Z".into(),
        }
    }

    #[test]
    fn patch_touches_only_present_fields() {
        let base = project();
        let next = base.patched(&ProjectPatch {
            name: Some("DevBits".into()),
            likes: Some(5),
            ..Default::default()
        });
        assert_eq!(next.name, "DevBits");
        assert_eq!(next.likes, 5);
        assert_eq!(next.summary, base.summary);
        assert_eq!(next.about_md, base.about_md);
        assert_eq!(next.id, base.id);
    }

    #[test]
    fn patch_can_clear_optional_fields() {
        let next = project().patched(&ProjectPatch {
            about_md: Some(None),
            ..Default::default()
        });
        assert_eq!(next.about_md, None);
    }

    #[test]
    fn empty_patch_is_identity() {
        let base = project();
        assert_eq!(base.patched(&ProjectPatch::default()), base);
    }

    #[test]
    fn post_deserializes_with_missing_optional_fields() {
        let post: Post = serde_json::from_str(
            r#"{"id":7,"authorId":1,"projectId":2,"content":"hi","likes":0,"comments":3,"createdOn":"x"}"#,
        )
        .unwrap();
        assert!(post.media.is_empty());
        assert!(!post.is_liked);
        assert_eq!(post.comments, 3);
    }
}
