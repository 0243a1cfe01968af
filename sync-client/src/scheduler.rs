//! Auto-refresh scheduler for a focused screen.
//!
//! [`AutoRefresh`] runs a screen's refresh callback on focus, on explicit
//! pull-to-refresh and on a background timer driven by the preferences.
//!
//! ```text
//! on_focus ──┐
//! on_refresh ├─► guard (one at a time) ─► begin_fresh_read_window ─► callback
//! timer ─────┘
//! ```
//!
//! The timer runs only between `on_focus` and `on_blur`, with a period of
//! [`timer_period`] (never under five seconds). A preference change while
//! focused re-arms it without triggering an extra refresh. Each timer
//! refresh runs in its own task, so tearing the timer down only stops
//! future ticks.

use crate::remote::RemoteApi;
use devbits_sync_core::{timer_period, FocusPolicy, FocusTracker, RefreshMode};
use devbits_sync_types::Preferences;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Boxed refresh callback.
pub type RefreshCallback = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Result of a refresh trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The callback ran to completion.
    Ran,
    /// Another refresh was in flight (or nothing was due); nothing ran.
    Skipped,
}

struct Inner {
    callback: RefreshCallback,
    remote: Arc<dyn RemoteApi>,
    fresh_read_window: Duration,
    preferences: watch::Receiver<Preferences>,
    running: AtomicBool,
    refreshing: watch::Sender<bool>,
    focus: Mutex<FocusTracker>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

/// Clears the in-flight flags even if the callback panics.
struct RunGuard<'a> {
    inner: &'a Inner,
    loud: bool,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if self.loud {
            self.inner.refreshing.send_replace(false);
        }
        self.inner.running.store(false, Ordering::Release);
    }
}

impl Inner {
    async fn run(&self, mode: RefreshMode) -> RefreshOutcome {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Refresh already in flight, dropping trigger");
            return RefreshOutcome::Skipped;
        }
        let loud = mode == RefreshMode::Loud;
        let _guard = RunGuard { inner: self, loud };
        if loud {
            self.refreshing.send_replace(true);
        }

        self.remote.begin_fresh_read_window(self.fresh_read_window);
        (self.callback)().await;
        RefreshOutcome::Ran
    }

    fn disarm(&self) {
        let handle = self.timer.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(handle) = handle {
            handle.abort();
            tracing::debug!("Refresh timer disarmed");
        }
    }
}

async fn timer_loop(inner: Arc<Inner>) {
    let mut prefs = inner.preferences.clone();
    let mut watching = true;
    loop {
        let current = timer_period(&prefs.borrow_and_update());
        let Some(period) = current else {
            if !watching || prefs.changed().await.is_err() {
                return;
            }
            continue;
        };

        tracing::debug!("Refresh timer armed ({}ms)", period.as_millis());
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let inner = Arc::clone(&inner);
                    tokio::spawn(async move {
                        inner.run(RefreshMode::Loud).await;
                    });
                }
                changed = prefs.changed(), if watching => {
                    if changed.is_err() {
                        watching = false;
                    } else if timer_period(&prefs.borrow()) != Some(period) {
                        break;
                    }
                }
            }
        }
    }
}

/// Per-screen refresh scheduler.
///
/// Dropping it (screen unmount) tears the timer down. A refresh already
/// running is not cancelled.
pub struct AutoRefresh {
    inner: Arc<Inner>,
}

impl AutoRefresh {
    /// Create a scheduler for `callback`.
    ///
    /// `preferences` drives the background timer; `remote` receives the
    /// fresh-read signal before every refresh.
    pub fn new<F, Fut>(
        callback: F,
        remote: Arc<dyn RemoteApi>,
        preferences: watch::Receiver<Preferences>,
        policy: FocusPolicy,
        fresh_read_window: Duration,
    ) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let callback: RefreshCallback = Arc::new(move || callback().boxed());
        Self {
            inner: Arc::new(Inner {
                callback,
                remote,
                fresh_read_window,
                preferences,
                running: AtomicBool::new(false),
                refreshing: watch::Sender::new(false),
                focus: Mutex::new(FocusTracker::new(policy)),
                timer: Mutex::new(None),
            }),
        }
    }

    /// The screen gained focus: arm the timer and refresh if due.
    pub async fn on_focus(&self) -> RefreshOutcome {
        let decision = self
            .inner
            .focus
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .on_focus();
        self.arm();
        match decision {
            Some(mode) => self.inner.run(mode).await,
            None => RefreshOutcome::Skipped,
        }
    }

    /// The screen lost focus: tear the timer down.
    pub fn on_blur(&self) {
        self.inner.disarm();
    }

    /// Explicit pull-to-refresh. Always loud.
    pub async fn on_refresh(&self) -> RefreshOutcome {
        self.refresh(RefreshMode::Loud).await
    }

    /// Run the callback unless a refresh is already in flight.
    pub async fn refresh(&self, mode: RefreshMode) -> RefreshOutcome {
        self.inner.run(mode).await
    }

    /// Whether a loud refresh is running.
    pub fn is_refreshing(&self) -> bool {
        *self.inner.refreshing.borrow()
    }

    /// Receiver for the loud-refresh flag.
    pub fn subscribe_refreshing(&self) -> watch::Receiver<bool> {
        self.inner.refreshing.subscribe()
    }

    /// Whether the background timer task is alive.
    pub fn is_armed(&self) -> bool {
        self.inner
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn arm(&self) {
        let handle = tokio::spawn(timer_loop(Arc::clone(&self.inner)));
        let previous = self
            .inner
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }
}

impl Drop for AutoRefresh {
    fn drop(&mut self) {
        self.inner.disarm();
    }
}

impl std::fmt::Debug for AutoRefresh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoRefresh")
            .field("refreshing", &self.is_refreshing())
            .field("armed", &self.is_armed())
            .finish_non_exhaustive()
    }
}
