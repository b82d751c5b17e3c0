use uuid::Uuid;

use super::state::EntityState;
use crate::database::entities::tags;

/// Tracker bookkeeping for one tag: the live representation, the snapshot
/// taken when it was last read or saved, and its state.
#[derive(Debug, Clone)]
pub(crate) struct TrackedEntry {
    pub(crate) current: tags::Model,
    original: Option<tags::Model>,
    state: EntityState,
    forced: bool,
}

impl TrackedEntry {
    pub(crate) fn added(tag: tags::Model) -> Self {
        Self {
            current: tag,
            original: None,
            state: EntityState::Added,
            forced: false,
        }
    }

    pub(crate) fn unchanged(tag: tags::Model) -> Self {
        Self {
            original: Some(tag.clone()),
            current: tag,
            state: EntityState::Unchanged,
            forced: false,
        }
    }

    pub(crate) fn original(&self) -> Option<&tags::Model> {
        self.original.as_ref()
    }

    pub(crate) fn is_forced(&self) -> bool {
        self.forced
    }

    /// State as it would be after change detection, without recording it.
    pub(crate) fn observed_state(&self) -> EntityState {
        match (&self.original, self.state) {
            (Some(original), EntityState::Unchanged | EntityState::Modified) => {
                if self.forced || *original != self.current {
                    EntityState::Modified
                } else {
                    EntityState::Unchanged
                }
            }
            (_, state) => state,
        }
    }

    pub(crate) fn detect_changes(&mut self) {
        self.state = self.observed_state();
    }

    pub(crate) fn mark_deleted(&mut self) {
        self.state = EntityState::Deleted;
        self.forced = false;
    }

    pub(crate) fn mark_modified(&mut self) {
        self.state = EntityState::Modified;
        self.forced = true;
    }

    /// Current values become the stored snapshot.
    pub(crate) fn accept_changes(&mut self) {
        self.original = Some(self.current.clone());
        self.state = EntityState::Unchanged;
        self.forced = false;
    }
}

/// Property-level access to a tracked tag. Every setter runs change
/// detection for this entry immediately.
pub struct Entry<'a> {
    id: Uuid,
    tracked: &'a mut TrackedEntry,
}

impl<'a> Entry<'a> {
    pub(crate) fn new(id: Uuid, tracked: &'a mut TrackedEntry) -> Self {
        Self { id, tracked }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> EntityState {
        self.tracked.observed_state()
    }

    pub fn is_modified(&self) -> bool {
        self.state() == EntityState::Modified
    }

    pub fn tag(&self) -> &tags::Model {
        &self.tracked.current
    }

    pub fn current_synonym_for_id(&self) -> Option<Uuid> {
        self.tracked.current.synonym_for_id
    }

    /// Value last read from or written to the store. `None` for added tags.
    pub fn original_synonym_for_id(&self) -> Option<Uuid> {
        self.tracked.original().and_then(|tag| tag.synonym_for_id)
    }

    pub fn set_synonym_for_id(&mut self, value: Option<Uuid>) {
        self.tracked.current.synonym_for_id = value;
        self.tracked.detect_changes();
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.tracked.current.name = name.into();
        self.tracked.detect_changes();
    }

    pub fn is_synonym_for_id_modified(&self) -> bool {
        match self.tracked.original() {
            Some(original) => original.synonym_for_id != self.tracked.current.synonym_for_id,
            None => false,
        }
    }
}
