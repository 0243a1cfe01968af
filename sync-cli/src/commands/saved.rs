//! List and toggle saved posts and followed streams.

use anyhow::{Context, Result};
use devbits_sync_client::{SavedKind, SyncContext};
use devbits_sync_types::EntityId;

/// Run `saved list`.
pub fn list(ctx: &SyncContext, kind: SavedKind) -> Vec<EntityId> {
    let ids = ctx.saved(kind).ids();
    if ids.is_empty() {
        println!("No saved {}", kind);
    }
    for id in &ids {
        println!("{}", id);
    }
    ids
}

/// Run `saved toggle`.
pub async fn toggle(ctx: &SyncContext, kind: SavedKind, id: i64) -> Result<bool> {
    let id = EntityId::new(id);
    let saved = ctx
        .saved(kind)
        .toggle(id)
        .await
        .with_context(|| format!("Failed to toggle {} {}", kind, id))?;

    if saved {
        println!("{} {}: saved", kind, id);
    } else {
        println!("{} {}: removed", kind, id);
    }
    Ok(saved)
}
