//! Configuration loading for the sync client.
//!
//! Configuration is loaded from a TOML file. Every section and field is
//! optional; missing values take the defaults below.

use devbits_sync_core::{FocusPolicy, DEFAULT_FRESH_READ_WINDOW};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration for the sync client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientConfig {
    /// Local storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Auto-refresh configuration.
    #[serde(default)]
    pub refresh: RefreshConfig,
}

/// Local storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding persisted state (default: `devbits-data`).
    #[serde(default = "default_storage_dir")]
    pub dir: PathBuf,
}

/// Auto-refresh configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshConfig {
    /// Refresh when a screen regains focus (default: true).
    #[serde(default = "default_true")]
    pub focus_refresh: bool,
    /// Focus-triggered refreshes are silent (default: true).
    #[serde(default = "default_true")]
    pub silent_focus_refresh: bool,
    /// The first focus after mount does not refresh (default: true).
    #[serde(default = "default_true")]
    pub skip_initial_focus_refresh: bool,
    /// How long reads bypass caches after a refresh (default: 2500).
    #[serde(default = "default_fresh_read_window_ms")]
    pub fresh_read_window_ms: u64,
}

// Default value functions
fn default_storage_dir() -> PathBuf {
    PathBuf::from("devbits-data")
}

fn default_true() -> bool {
    true
}

fn default_fresh_read_window_ms() -> u64 {
    DEFAULT_FRESH_READ_WINDOW.as_millis() as u64
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            focus_refresh: default_true(),
            silent_focus_refresh: default_true(),
            skip_initial_focus_refresh: default_true(),
            fresh_read_window_ms: default_fresh_read_window_ms(),
        }
    }
}

impl RefreshConfig {
    /// Focus options for schedulers.
    pub fn focus_policy(&self) -> FocusPolicy {
        FocusPolicy {
            focus_refresh: self.focus_refresh,
            silent_focus_refresh: self.silent_focus_refresh,
            skip_initial_focus_refresh: self.skip_initial_focus_refresh,
        }
    }

    /// Fresh-read window length.
    pub fn fresh_read_window(&self) -> Duration {
        Duration::from_millis(self.fresh_read_window_ms)
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_config_is_valid() {
        let config = ClientConfig::default();
        assert_eq!(config.storage.dir, PathBuf::from("devbits-data"));
        assert!(config.refresh.focus_refresh);
        assert!(config.refresh.silent_focus_refresh);
        assert!(config.refresh.skip_initial_focus_refresh);
        assert_eq!(config.refresh.fresh_read_window_ms, 2500);
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config: ClientConfig = toml::from_str("").unwrap();
        assert_eq!(config.storage.dir, PathBuf::from("devbits-data"));
        assert_eq!(config.refresh.focus_policy(), FocusPolicy::default());
    }

    #[test]
    fn config_from_toml_string() {
        let toml = r#"
[storage]
dir = "/var/lib/devbits"

[refresh]
silent_focus_refresh = false
fresh_read_window_ms = 1000
"#;

        let config: ClientConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.storage.dir, PathBuf::from("/var/lib/devbits"));
        assert!(config.refresh.focus_refresh);
        assert!(!config.refresh.silent_focus_refresh);
        assert_eq!(config.refresh.fresh_read_window(), Duration::from_millis(1000));
    }

    #[test]
    fn from_file_reads_and_reports_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("client.toml");

        let err = ClientConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));

        std::fs::write(&path, "[refresh]\nfocus_refresh = false\n").unwrap();
        let config = ClientConfig::from_file(&path).unwrap();
        assert!(!config.refresh.focus_refresh);

        std::fs::write(&path, "[refresh\n").unwrap();
        let err = ClientConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }
}
