//! Refresh decisions for a focused screen.
//!
//! Pure pieces of the auto-refresh scheduler: whether a focus event should
//! trigger a refresh, and how often the background timer may fire. The
//! actual timer and the in-flight guard live in sync-client.

use devbits_sync_types::Preferences;
use std::time::Duration;

/// Hard floor for timer-driven refreshes, whatever the preferences say.
pub const MIN_TIMER_PERIOD: Duration = Duration::from_millis(5_000);

/// Whether a refresh shows the loading indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// No loading indicator.
    Silent,
    /// Flip the caller-visible `is_refreshing` flag for the duration.
    Loud,
}

/// Per-screen focus options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusPolicy {
    /// Refresh when the screen regains focus.
    pub focus_refresh: bool,
    /// Focus-triggered refreshes run silently.
    pub silent_focus_refresh: bool,
    /// The first focus after mount only marks the screen as focused.
    pub skip_initial_focus_refresh: bool,
}

impl Default for FocusPolicy {
    fn default() -> Self {
        Self {
            focus_refresh: true,
            silent_focus_refresh: true,
            skip_initial_focus_refresh: true,
        }
    }
}

/// Tracks whether a screen has been focused before.
#[derive(Debug, Clone)]
pub struct FocusTracker {
    policy: FocusPolicy,
    has_focused: bool,
}

impl FocusTracker {
    /// Create a tracker for a freshly mounted screen.
    pub fn new(policy: FocusPolicy) -> Self {
        Self {
            policy,
            has_focused: false,
        }
    }

    /// Record a focus event and return the refresh it should trigger, if any.
    pub fn on_focus(&mut self) -> Option<RefreshMode> {
        if !self.policy.focus_refresh {
            return None;
        }
        let first = !self.has_focused;
        self.has_focused = true;
        if first && self.policy.skip_initial_focus_refresh {
            return None;
        }
        Some(if self.policy.silent_focus_refresh {
            RefreshMode::Silent
        } else {
            RefreshMode::Loud
        })
    }

    /// Whether a focus has been recorded since mount.
    pub fn has_focused(&self) -> bool {
        self.has_focused
    }
}

/// Period of the background refresh timer, or `None` if it must not run.
///
/// Never shorter than [`MIN_TIMER_PERIOD`].
pub fn timer_period(preferences: &Preferences) -> Option<Duration> {
    preferences
        .background_refresh_interval()
        .map(|interval| interval.max(MIN_TIMER_PERIOD))
}
