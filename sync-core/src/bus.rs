//! In-process mutation event bus.
//!
//! A bus fans each emitted event out to every current listener,
//! synchronously and in registration order. It keeps no history: a view
//! that is not subscribed when an event is emitted never sees it and must
//! rely on its own reload to catch up.
//!
//! Listeners are identified by their `Arc` allocation, so registering the
//! same listener twice still delivers each event to it once. The returned
//! [`Subscription`] unsubscribes when dropped; duplicate registrations
//! share one entry that goes away with its last handle.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use devbits_sync_types::{EntityId, PostEvent, ProjectEvent, ProjectPatch};

/// A shared event listener.
pub type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Entry<E> {
    id: u64,
    listener: Listener<E>,
    handles: usize,
}

struct BusInner<E> {
    entries: Vec<Entry<E>>,
    next_id: u64,
}

impl<E> BusInner<E> {
    fn release(&mut self, id: u64) {
        if let Some(pos) = self.entries.iter().position(|e| e.id == id) {
            let entry = &mut self.entries[pos];
            entry.handles = entry.handles.saturating_sub(1);
            if entry.handles == 0 {
                self.entries.remove(pos);
            }
        }
    }
}

/// Publish/subscribe channel for one family of events.
///
/// Cloning a bus yields another handle to the same listener set.
pub struct EventBus<E> {
    inner: Arc<Mutex<BusInner<E>>>,
}

impl<E> EventBus<E> {
    /// Create a bus with no listeners.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(BusInner {
                entries: Vec::new(),
                next_id: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BusInner<E>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a listener.
    ///
    /// Registering a listener that is already subscribed (same `Arc`)
    /// returns another handle to the existing entry.
    pub fn subscribe(&self, listener: Listener<E>) -> Subscription<E> {
        let mut inner = self.lock();
        let existing = inner
            .entries
            .iter()
            .position(|e| same_listener(&e.listener, &listener));
        let id = match existing {
            Some(pos) => {
                let entry = &mut inner.entries[pos];
                entry.handles += 1;
                entry.id
            }
            None => {
                let id = inner.next_id;
                inner.next_id += 1;
                inner.entries.push(Entry {
                    id,
                    listener,
                    handles: 1,
                });
                id
            }
        };
        Subscription {
            bus: Arc::downgrade(&self.inner),
            id: Some(id),
        }
    }

    /// Register a closure as a listener.
    pub fn subscribe_fn<F>(&self, f: F) -> Subscription<E>
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.subscribe(Arc::new(f))
    }

    /// Deliver `event` to every current listener, in registration order.
    ///
    /// The listener list is snapshotted first: listeners added or removed
    /// while this call runs take effect from the next emit. Listeners may
    /// subscribe, unsubscribe or emit from inside their callback.
    pub fn emit(&self, event: &E) {
        let snapshot: Vec<Listener<E>> = self
            .lock()
            .entries
            .iter()
            .map(|e| Arc::clone(&e.listener))
            .collect();
        for listener in snapshot {
            listener(event);
        }
    }

    /// Number of distinct listeners currently subscribed.
    pub fn listener_count(&self) -> usize {
        self.lock().entries.len()
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> std::fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

// Compare allocations only; vtable pointers may differ across codegen units.
fn same_listener<E>(a: &Listener<E>, b: &Listener<E>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

/// Handle returned by [`EventBus::subscribe`].
///
/// Dropping the handle unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription<E> {
    bus: Weak<Mutex<BusInner<E>>>,
    id: Option<u64>,
}

impl<E> Subscription<E> {
    /// Unsubscribe now. Equivalent to dropping the handle.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        let Some(id) = self.id.take() else {
            return;
        };
        if let Some(inner) = self.bus.upgrade() {
            inner
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .release(id);
        }
    }
}

impl<E> Drop for Subscription<E> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<E> std::fmt::Debug for Subscription<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// Bus carrying [`PostEvent`]s.
pub type PostEvents = EventBus<PostEvent>;

/// Bus carrying [`ProjectEvent`]s.
pub type ProjectEvents = EventBus<ProjectEvent>;

impl EventBus<PostEvent> {
    /// Announce that a post's content (and possibly media) changed.
    pub fn emit_post_updated(&self, post_id: EntityId, content: &str, media: Option<Vec<String>>) {
        self.emit(&PostEvent::Updated {
            post_id,
            content: content.to_string(),
            media,
        });
    }

    /// Announce that a post was deleted.
    pub fn emit_post_deleted(&self, post_id: EntityId) {
        self.emit(&PostEvent::Deleted { post_id });
    }

    /// Announce new post counters; `None` fields are left as they are.
    pub fn emit_post_stats(
        &self,
        post_id: EntityId,
        likes: Option<i64>,
        comments: Option<i64>,
        is_liked: Option<bool>,
    ) {
        self.emit(&PostEvent::Stats {
            post_id,
            likes,
            comments,
            is_liked,
        });
    }
}

impl EventBus<ProjectEvent> {
    /// Announce edited project fields.
    pub fn emit_project_updated(&self, project_id: EntityId, patch: ProjectPatch) {
        self.emit(&ProjectEvent::Updated { project_id, patch });
    }

    /// Announce that a project was deleted.
    pub fn emit_project_deleted(&self, project_id: EntityId) {
        self.emit(&ProjectEvent::Deleted { project_id });
    }

    /// Announce new project counters; `None` fields are left as they are.
    pub fn emit_project_stats(
        &self,
        project_id: EntityId,
        likes: Option<i64>,
        saves: Option<i64>,
        is_liked: Option<bool>,
    ) {
        self.emit(&ProjectEvent::Stats {
            project_id,
            likes,
            saves,
            is_liked,
        });
    }
}
