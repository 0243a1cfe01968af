//! Liveness and in-flight guards.
//!
//! [`RequestGuard`] lets a screen discard results that arrive after it
//! unmounted or after it started a newer request. [`InFlightSet`] keeps at
//! most one pending operation per key.

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Ticket identifying one request started through a [`RequestGuard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestTicket(u64);

/// Per-screen liveness tracker.
#[derive(Debug)]
pub struct RequestGuard {
    mounted: AtomicBool,
    latest: AtomicU64,
}

impl RequestGuard {
    /// Create a guard for a mounted screen.
    pub fn new() -> Self {
        Self {
            mounted: AtomicBool::new(true),
            latest: AtomicU64::new(0),
        }
    }

    /// Start a request; any earlier ticket stops being active.
    pub fn begin_request(&self) -> RequestTicket {
        RequestTicket(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Whether results for `ticket` may still be applied.
    pub fn is_active(&self, ticket: RequestTicket) -> bool {
        self.is_mounted() && self.latest.load(Ordering::Acquire) == ticket.0
    }

    /// Whether the screen is still mounted.
    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    /// Mark the screen as unmounted. Every ticket becomes inactive.
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::Release);
    }
}

impl Default for RequestGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Set of keys with an operation in flight.
///
/// Cloning yields another handle to the same set.
#[derive(Debug)]
pub struct InFlightSet<K: Eq + Hash> {
    keys: Arc<Mutex<HashSet<K>>>,
}

impl<K: Eq + Hash + Clone> InFlightSet<K> {
    /// Create an empty set.
    pub fn new() -> Self {
        Self {
            keys: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Claim `key`. Returns `None` if it is already claimed.
    ///
    /// The claim is released when the returned token drops.
    pub fn try_acquire(&self, key: K) -> Option<InFlightToken<K>> {
        let mut keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        if !keys.insert(key.clone()) {
            return None;
        }
        Some(InFlightToken {
            keys: Arc::clone(&self.keys),
            key,
        })
    }

    /// Whether `key` is currently claimed.
    pub fn contains(&self, key: &K) -> bool {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }

    /// Number of claimed keys.
    pub fn len(&self) -> usize {
        self.keys.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing is claimed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + Hash + Clone> Default for InFlightSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash> Clone for InFlightSet<K> {
    fn clone(&self) -> Self {
        Self {
            keys: Arc::clone(&self.keys),
        }
    }
}

/// Claim on one key of an [`InFlightSet`].
#[derive(Debug)]
pub struct InFlightToken<K: Eq + Hash> {
    keys: Arc<Mutex<HashSet<K>>>,
    key: K,
}

impl<K: Eq + Hash> InFlightToken<K> {
    /// The claimed key.
    pub fn key(&self) -> &K {
        &self.key
    }
}

impl<K: Eq + Hash> Drop for InFlightToken<K> {
    fn drop(&mut self) {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===========================================
    // RequestGuard
    // ===========================================

    #[test]
    fn latest_ticket_is_active() {
        let guard = RequestGuard::new();
        let t1 = guard.begin_request();
        assert!(guard.is_active(t1));

        let t2 = guard.begin_request();
        assert!(!guard.is_active(t1));
        assert!(guard.is_active(t2));
        assert!(t2 > t1);
    }

    #[test]
    fn unmount_deactivates_everything() {
        let guard = RequestGuard::new();
        let t = guard.begin_request();
        guard.unmount();
        assert!(!guard.is_mounted());
        assert!(!guard.is_active(t));
    }

    // ===========================================
    // InFlightSet
    // ===========================================

    #[test]
    fn second_acquire_fails_until_release() {
        let set = InFlightSet::new();
        let token = set.try_acquire(7).unwrap();
        assert!(set.try_acquire(7).is_none());
        assert!(set.contains(&7));
        assert_eq!(*token.key(), 7);

        drop(token);
        assert!(!set.contains(&7));
        assert!(set.try_acquire(7).is_some());
    }

    #[test]
    fn keys_are_independent() {
        let set = InFlightSet::new();
        let _a = set.try_acquire(1).unwrap();
        let _b = set.try_acquire(2).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn clones_share_claims() {
        let set = InFlightSet::new();
        let other = set.clone();
        let _token = set.try_acquire("x").unwrap();
        assert!(other.try_acquire("x").is_none());
    }

    #[test]
    fn token_dropped_after_set_is_fine() {
        let set = InFlightSet::new();
        let token = set.try_acquire(1).unwrap();
        drop(set);
        drop(token);
    }
}
