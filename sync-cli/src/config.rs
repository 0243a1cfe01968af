//! Configuration resolution for devbits-sync.

use anyhow::{Context, Result};
use devbits_sync_client::ClientConfig;
use std::path::{Path, PathBuf};

/// Settings the CLI runs with.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Client configuration (from `--config`, or defaults).
    pub client: ClientConfig,
    /// Directory holding persisted state.
    pub data_dir: PathBuf,
}

/// Combine command-line flags and the optional config file.
///
/// The data directory is, in order: `--data-dir`, `[storage] dir` from
/// `--config`, the platform data directory.
pub fn resolve(data_dir: Option<&Path>, config_path: Option<&Path>) -> Result<Settings> {
    let client = match config_path {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::default(),
    };

    let data_dir = match (data_dir, config_path) {
        (Some(dir), _) => dir.to_path_buf(),
        (None, Some(_)) => client.storage.dir.clone(),
        (None, None) => default_data_dir()?,
    };

    Ok(Settings { client, data_dir })
}

/// Get the default data directory for devbits-sync.
fn default_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("app", "devbits", "devbits-sync")
        .context("Could not determine home directory")?;
    Ok(dirs.data_dir().to_path_buf())
}
