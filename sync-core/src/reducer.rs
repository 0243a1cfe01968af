//! Pure reducers applying mutation events to rendered lists.
//!
//! Given a list and one event, return the list with the event applied.
//! The input is never modified. For a list holding at most one entity with
//! the event's id the result does not depend on where that entity sits.

use devbits_sync_types::{Post, PostEvent, Project, ProjectEvent};

/// Apply a [`ProjectEvent`] to a list of projects.
///
/// - `Deleted` drops the matching project.
/// - `Updated` shallow-merges the patch.
/// - `Stats` overwrites `likes` / `saves` only where the event carries them.
pub fn apply_project_event(projects: &[Project], event: &ProjectEvent) -> Vec<Project> {
    match event {
        ProjectEvent::Deleted { project_id } => projects
            .iter()
            .filter(|p| p.id != *project_id)
            .cloned()
            .collect(),
        ProjectEvent::Updated { project_id, patch } => projects
            .iter()
            .map(|p| {
                if p.id == *project_id {
                    p.patched(patch)
                } else {
                    p.clone()
                }
            })
            .collect(),
        ProjectEvent::Stats {
            project_id,
            likes,
            saves,
            is_liked: _,
        } => projects
            .iter()
            .map(|p| {
                let mut next = p.clone();
                if p.id == *project_id {
                    next.likes = likes.unwrap_or(p.likes);
                    next.saves = saves.unwrap_or(p.saves);
                }
                next
            })
            .collect(),
    }
}

/// Apply a [`PostEvent`] to a list of posts.
pub fn apply_post_event(posts: &[Post], event: &PostEvent) -> Vec<Post> {
    match event {
        PostEvent::Deleted { post_id } => posts
            .iter()
            .filter(|p| p.id != *post_id)
            .cloned()
            .collect(),
        PostEvent::Updated {
            post_id,
            content,
            media,
        } => posts
            .iter()
            .map(|p| {
                let mut next = p.clone();
                if p.id == *post_id {
                    next.content = content.clone();
                    if let Some(media) = media {
                        next.media = media.clone();
                    }
                }
                next
            })
            .collect(),
        PostEvent::Stats {
            post_id,
            likes,
            comments,
            is_liked,
        } => posts
            .iter()
            .map(|p| {
                let mut next = p.clone();
                if p.id == *post_id {
                    next.likes = likes.unwrap_or(p.likes);
                    next.comments = comments.unwrap_or(p.comments);
                    next.is_liked = is_liked.unwrap_or(p.is_liked);
                }
                next
            })
            .collect(),
    }
}
