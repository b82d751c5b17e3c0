//! Store and change-tracker error types

use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

use crate::tracking::EntityState;

/// Store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Connecting to the store or creating the schema failed
    #[error("Store initialization failed: {0}")]
    Initialization(#[source] DbErr),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// No tag matched the query
    #[error("Tag '{0}' not found")]
    NotFound(String),

    /// More than one tag matched a single-row query
    #[error("Expected a single tag named '{name}', found {count}")]
    NotUnique {
        /// Name that was queried
        name: String,
        /// Number of matching rows
        count: usize,
    },

    /// The tracker holds no entry for this key
    #[error("Tag {0} is not tracked")]
    NotTracked(Uuid),

    /// A second representation of an already tracked key was added
    #[error("Tag {0} is already tracked")]
    AlreadyTracked(Uuid),

    /// Detach requested while changes are still waiting to be saved
    #[error("Tag {id} has pending changes ({state:?}); save before detaching")]
    PendingChanges {
        /// Tracked key
        id: Uuid,
        /// State at the time of the request
        state: EntityState,
    },

    /// Requested state change is not allowed from the current state
    #[error("Tag {id} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        /// Tracked key
        id: Uuid,
        /// Current state
        from: EntityState,
        /// Requested state
        to: EntityState,
    },

    /// Synonym link points at a tag that neither exists nor is being inserted
    #[error("Tag {id} is a synonym for missing tag {synonym_for_id}")]
    DanglingSynonym {
        /// Dependent tag
        id: Uuid,
        /// Missing principal
        synonym_for_id: Uuid,
    },

    /// Primary key of a tracked tag was changed
    #[error("Key of tracked tag {original} was changed to {current}")]
    KeyModified {
        /// Key the entry was tracked under
        original: Uuid,
        /// Key found on the representation
        current: Uuid,
    },

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl StoreError {
    /// Errors raised by the change tracker without touching the database
    pub fn is_tracking_error(&self) -> bool {
        matches!(
            self,
            StoreError::NotTracked(_)
                | StoreError::AlreadyTracked(_)
                | StoreError::PendingChanges { .. }
                | StoreError::InvalidTransition { .. }
                | StoreError::DanglingSynonym { .. }
                | StoreError::KeyModified { .. }
        )
    }

    /// Errors that originate in the database layer
    pub fn is_database_error(&self) -> bool {
        matches!(
            self,
            StoreError::Initialization(_) | StoreError::Database(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let id = Uuid::new_v4();

        assert!(StoreError::NotTracked(id).is_tracking_error());
        assert!(StoreError::PendingChanges {
            id,
            state: EntityState::Modified
        }
        .is_tracking_error());
        assert!(!StoreError::NotFound("Bar".to_string()).is_tracking_error());

        let err = StoreError::Database(DbErr::Custom("boom".to_string()));
        assert!(err.is_database_error());
        assert!(!err.is_tracking_error());
    }

    #[test]
    fn test_error_display() {
        let err = StoreError::NotUnique {
            name: "Bar".to_string(),
            count: 2,
        };
        assert_eq!(err.to_string(), "Expected a single tag named 'Bar', found 2");
    }
}
