/// Tracking state of an in-memory tag representation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EntityState {
    /// New; inserted on the next save.
    Added,
    /// Matches the stored row.
    Unchanged,
    /// Differs from the stored row; updated on the next save.
    Modified,
    /// Marked for removal; deleted on the next save.
    Deleted,
    /// Not tracked. Changes to a detached representation are never saved.
    Detached,
}

impl EntityState {
    /// True when the next save has work to do for this entity.
    pub fn has_pending_changes(self) -> bool {
        matches!(
            self,
            EntityState::Added | EntityState::Modified | EntityState::Deleted
        )
    }

    /// Transitions a caller may request. Leaving `Detached` goes through
    /// `TagContext::add` or `TagContext::attach`, which supply the tag;
    /// the rest go through `TagContext::set_state`. Transitions performed
    /// by a save (e.g. `Added -> Unchanged`) are applied by the context itself.
    pub fn can_transition_to(self, next: EntityState) -> bool {
        use EntityState::*;

        match (self, next) {
            (from, to) if from == to => true,
            (Detached, Added) | (Detached, Unchanged) => true,
            (Added, Unchanged) | (Added, Deleted) => true,
            (Unchanged, Modified) | (Unchanged, Deleted) | (Unchanged, Detached) => true,
            (Modified, Unchanged) | (Modified, Deleted) => true,
            (Deleted, Unchanged) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::EntityState::*;

    #[test]
    fn test_pending_changes() {
        assert!(Added.has_pending_changes());
        assert!(Modified.has_pending_changes());
        assert!(Deleted.has_pending_changes());
        assert!(!Unchanged.has_pending_changes());
        assert!(!Detached.has_pending_changes());
    }

    #[test]
    fn test_detach_requires_clean_entity() {
        assert!(Unchanged.can_transition_to(Detached));
        assert!(!Added.can_transition_to(Detached));
        assert!(!Modified.can_transition_to(Detached));
        assert!(!Deleted.can_transition_to(Detached));
    }

    #[test]
    fn test_detached_can_only_rejoin() {
        assert!(Detached.can_transition_to(Added));
        assert!(Detached.can_transition_to(Unchanged));
        assert!(!Detached.can_transition_to(Modified));
        assert!(!Detached.can_transition_to(Deleted));
    }
}
