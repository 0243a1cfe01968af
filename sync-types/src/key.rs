//! Composite keys for locally persisted state.
//!
//! Local state lives in two key spaces: one scoped per identity and one
//! anonymous fallback. Keys are kept as `(namespace, identity)` pairs so a
//! username can never collide with another namespace or with the anonymous
//! slot, whatever characters it contains.

use std::fmt;

use crate::Identity;

/// A named, independently keyed cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Display preferences.
    Preferences,
    /// Saved post ids (anonymous only; authenticated sets are server-backed).
    SavedPosts,
    /// Followed stream (project) ids (anonymous only).
    SavedStreams,
}

impl Namespace {
    /// All namespaces, in a stable order.
    pub const ALL: [Namespace; 3] = [Self::Preferences, Self::SavedPosts, Self::SavedStreams];

    /// Stable string form, used for file layout and diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preferences => "devbits.preferences",
            Self::SavedPosts => "devbits.saved.posts",
            Self::SavedStreams => "devbits.saved.streams",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key of one persisted value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey {
    namespace: Namespace,
    identity: Identity,
}

impl StorageKey {
    /// Key for `namespace` scoped to `identity`.
    pub fn new(namespace: Namespace, identity: Identity) -> Self {
        Self {
            namespace,
            identity,
        }
    }

    /// Un-scoped key for anonymous state.
    pub fn anonymous(namespace: Namespace) -> Self {
        Self::new(namespace, Identity::Anonymous)
    }

    /// The namespace part.
    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    /// The identity part.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Flat string form (`"<namespace>"` or `"<namespace>.<username>"`).
    ///
    /// Only for logs; two different keys may render the same string.
    pub fn legacy_string(&self) -> String {
        match self.identity.username() {
            Some(name) => format!("{}.{}", self.namespace.as_str(), name),
            None => self.namespace.as_str().to_string(),
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.namespace, self.identity)
    }
}
