//! Fresh-read window for the request layer.
//!
//! A refresh opens a short window during which reads bypass any
//! short-lived response cache, so the user sees server state rather than
//! a copy fetched a second ago.

use std::time::{Duration, Instant};

/// Default window length.
pub const DEFAULT_FRESH_READ_WINDOW: Duration = Duration::from_millis(2_500);

/// Shortest window that can be opened.
pub const MIN_FRESH_READ_WINDOW: Duration = Duration::from_millis(300);

/// Tracks until when reads must be fresh.
#[derive(Debug, Clone, Default)]
pub struct FreshReadWindow {
    until: Option<Instant>,
}

impl FreshReadWindow {
    /// Create a closed window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (or extend) the window for `duration` from `now`.
    ///
    /// Durations below [`MIN_FRESH_READ_WINDOW`] are raised to it. An
    /// already open window is never shortened.
    pub fn begin(&mut self, now: Instant, duration: Duration) {
        let until = now + duration.max(MIN_FRESH_READ_WINDOW);
        self.until = Some(match self.until {
            Some(existing) if existing > until => existing,
            _ => until,
        });
    }

    /// Whether reads at `now` must bypass caches.
    pub fn is_active(&self, now: Instant) -> bool {
        self.until.is_some_and(|until| now <= until)
    }
}
