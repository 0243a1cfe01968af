//! # sync-client
//!
//! Client-side state sync for DevBits.
//!
//! This is the library screens use to read and mutate shared state.
//!
//! ## Features
//!
//! - **Preferences**: durable, normalized, server-backed for signed-in users
//! - **Saved Sets**: saved posts and followed streams with per-id toggle guards
//! - **Event Buses**: synchronous fan-out of post and project mutations
//! - **Auto-Refresh**: focus, pull-to-refresh and timer-driven refreshes
//! - **Pluggable I/O**: [`LocalStorage`] and [`RemoteApi`] traits (file, memory, mock)
//!
//! ## Example
//!
//! ```ignore
//! use devbits_sync_client::{ClientConfig, FileStorage, SyncContext};
//!
//! let ctx = SyncContext::new(Arc::new(FileStorage::new("data")), remote, ClientConfig::default());
//! ctx.set_identity(identity).await;
//!
//! // Toggle a saved post
//! let saved = ctx.saved_posts().toggle(EntityId::new(42)).await?;
//!
//! // Refresh a screen on focus
//! let refresher = ctx.auto_refresh(|| async { reload_feed().await });
//! refresher.on_focus().await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod context;
pub mod preferences;
pub mod remote;
pub mod saved;
pub mod scheduler;
pub mod storage;

pub use config::{ClientConfig, ConfigError, RefreshConfig, StorageConfig};
pub use context::SyncContext;
pub use preferences::PreferenceStore;
pub use remote::{MockRemote, OfflineRemote, RemoteApi, RemoteCall, RemoteError, RemoteOp};
pub use saved::{SavedError, SavedKind, SavedSetStore};
pub use scheduler::{AutoRefresh, RefreshCallback, RefreshOutcome};
pub use storage::{FileStorage, LocalStorage, MemoryStorage, StorageError};
