//! Show and change preferences.

use anyhow::{Context, Result};
use devbits_sync_client::SyncContext;
use devbits_sync_types::{Preferences, PreferencesPatch};
use serde_json::{Map, Value};

/// Run `prefs show`.
pub fn show(ctx: &SyncContext) -> Result<Preferences> {
    let prefs = ctx.preferences().current();
    print(&prefs)?;
    Ok(prefs)
}

/// Run `prefs set <key> <value>`.
pub async fn set(ctx: &SyncContext, key: &str, raw: &str) -> Result<Preferences> {
    let patch = parse_patch(key, raw)?;
    let prefs = ctx.preferences().update(patch).await;
    print(&prefs)?;
    Ok(prefs)
}

/// Build a one-field patch. Values that are not JSON are taken as strings.
fn parse_patch(key: &str, raw: &str) -> Result<PreferencesPatch> {
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    let mut object = Map::new();
    object.insert(key.to_string(), value);

    let patch = PreferencesPatch::from_json(&Value::Object(object));
    if patch.is_empty() {
        anyhow::bail!("Unknown preference '{}' or invalid value '{}'", key, raw);
    }
    Ok(patch)
}

fn print(prefs: &Preferences) -> Result<()> {
    let text =
        serde_json::to_string_pretty(prefs).context("Failed to serialize preferences")?;
    println!("{}", text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::context;
    use devbits_sync_types::{Identity, LinkOpenMode};
    use tempfile::tempdir;

    #[test]
    fn parse_patch_accepts_json_and_bare_words() {
        let patch = parse_patch("zenMode", "true").unwrap();
        assert_eq!(patch.zen_mode, Some(true));

        let patch = parse_patch("linkOpenMode", "promptScheme").unwrap();
        assert_eq!(patch.link_open_mode, Some(LinkOpenMode::PromptScheme));
    }

    #[test]
    fn parse_patch_rejects_unknown_or_mistyped() {
        assert!(parse_patch("noSuchThing", "1").is_err());
        assert!(parse_patch("zenMode", "\"yes\"").is_err());
    }

    #[tokio::test]
    async fn set_then_show_in_new_session() {
        let dir = tempdir().unwrap();

        let ctx = context(dir.path());
        ctx.set_identity(Identity::Anonymous).await;
        let updated = set(&ctx, "refreshIntervalMs", "60000").await.unwrap();
        assert_eq!(updated.refresh_interval_ms, 60_000);

        let ctx = context(dir.path());
        ctx.set_identity(Identity::Anonymous).await;
        assert_eq!(show(&ctx).unwrap(), updated);
    }

    #[tokio::test]
    async fn offline_user_keeps_local_value() {
        let dir = tempdir().unwrap();
        let ada = Identity::from_optional(Some("ada"));

        let ctx = context(dir.path());
        ctx.set_identity(ada.clone()).await;
        set(&ctx, "compactMode", "true").await.unwrap();

        let ctx = context(dir.path());
        ctx.set_identity(ada).await;
        assert!(show(&ctx).unwrap().compact_mode);
    }
}
