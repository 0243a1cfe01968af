//! # sync-types
//!
//! Shared data types for the DevBits client sync layer.
//!
//! This crate provides the foundational types used across all sync crates:
//! - [`Identity`], [`Username`], [`EntityId`] - who is acting and on what
//! - [`StorageKey`], [`Namespace`] - composite keys for local persistence
//! - [`Preferences`], [`PreferencesPatch`] - display settings and their normalization
//! - [`PostEvent`], [`ProjectEvent`] - fine-grained mutation events
//! - [`Post`], [`Project`], [`ProjectPatch`] - view models events apply to
//! - [`TypesError`] - error type

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod events;
mod ids;
mod key;
mod models;
mod preferences;

pub use error::TypesError;
pub use events::{PostEvent, ProjectEvent};
pub use ids::{EntityId, Identity, Username};
pub use key::{Namespace, StorageKey};
pub use models::{Post, Project, ProjectPatch};
pub use preferences::{
    normalize_accent_color, ImageRevealEffect, LinkOpenMode, PageTransitionEffect, Preferences,
    PreferencesPatch, TextRenderEffect, VisualizationMode, DEFAULT_REFRESH_INTERVAL_MS,
    DEFAULT_VISUALIZATION_INTENSITY, MAX_MUTED_TAGS, MAX_REFRESH_INTERVAL_MS,
};
