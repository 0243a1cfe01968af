//! Saved-id membership set.
//!
//! Holds the ids a user saved (posts) or follows (streams). Ids are unique;
//! insertion order is kept only so lists render stably.

use devbits_sync_types::EntityId;
use serde_json::Value;

/// What a toggle has to do for a given id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    /// The id is not in the set yet.
    Add,
    /// The id is already in the set.
    Remove,
}

/// A duplicate-free set of entity ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavedSet {
    ids: Vec<EntityId>,
}

impl SavedSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from ids, keeping the first occurrence of duplicates.
    pub fn from_ids<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = EntityId>,
    {
        let mut set = Self::new();
        for id in ids {
            set.insert(id);
        }
        set
    }

    /// Parse a persisted JSON array.
    ///
    /// Non-arrays yield an empty set; non-integer entries are skipped.
    pub fn from_json(value: &Value) -> Self {
        match value.as_array() {
            Some(items) => Self::from_ids(items.iter().filter_map(Value::as_i64).map(EntityId::new)),
            None => Self::new(),
        }
    }

    /// Serialize as a JSON array of integers.
    pub fn to_json(&self) -> Value {
        Value::Array(self.ids.iter().map(|id| Value::from(id.value())).collect())
    }

    /// Check membership.
    pub fn contains(&self, id: EntityId) -> bool {
        self.ids.contains(&id)
    }

    /// Decide what toggling `id` means right now.
    pub fn plan_toggle(&self, id: EntityId) -> ToggleAction {
        if self.contains(id) {
            ToggleAction::Remove
        } else {
            ToggleAction::Add
        }
    }

    /// Add `id`. Returns `false` if it was already present.
    pub fn insert(&mut self, id: EntityId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    /// Remove `id`. Returns `false` if it was not present.
    pub fn remove(&mut self, id: EntityId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|existing| *existing != id);
        self.ids.len() != before
    }

    /// Apply a planned toggle. Returns whether `id` is now a member.
    pub fn apply(&mut self, id: EntityId, action: ToggleAction) -> bool {
        match action {
            ToggleAction::Add => {
                self.insert(id);
                true
            }
            ToggleAction::Remove => {
                self.remove(id);
                false
            }
        }
    }

    /// Flip membership of `id`. Returns whether `id` is now a member.
    pub fn toggle(&mut self, id: EntityId) -> bool {
        let action = self.plan_toggle(id);
        self.apply(id, action)
    }

    /// Remove every id in `ids`.
    pub fn remove_all(&mut self, ids: &[EntityId]) {
        self.ids.retain(|existing| !ids.contains(existing));
    }

    /// Members in insertion order.
    pub fn ids(&self) -> &[EntityId] {
        &self.ids
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
