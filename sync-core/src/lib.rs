//! # sync-core
//!
//! Pure logic for the DevBits client sync layer (no I/O, instant tests).
//!
//! This crate implements the data structures and decisions behind the
//! stores and the refresh scheduler without touching storage, network or
//! timers, enabling fast unit tests.
//!
//! ## Design Philosophy
//!
//! Modules here take input and produce output:
//! - the event bus delivers synchronously, with no background task
//! - reducers return new lists instead of mutating
//! - focus and timer decisions are plain functions of their inputs
//!
//! The actual I/O (local storage, remote calls, timers) is performed by
//! `sync-client`, which drives these pieces.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bus;
pub mod guard;
pub mod reducer;
pub mod refresh;
pub mod saved;
pub mod window;

pub use bus::{EventBus, Listener, PostEvents, ProjectEvents, Subscription};
pub use guard::{InFlightSet, InFlightToken, RequestGuard, RequestTicket};
pub use reducer::{apply_post_event, apply_project_event};
pub use refresh::{timer_period, FocusPolicy, FocusTracker, RefreshMode, MIN_TIMER_PERIOD};
pub use saved::{SavedSet, ToggleAction};
pub use window::{FreshReadWindow, DEFAULT_FRESH_READ_WINDOW, MIN_FRESH_READ_WINDOW};
