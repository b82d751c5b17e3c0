//! Change tracking for tags.
//!
//! [`TagContext`] keeps one representation per key with an explicit
//! [`EntityState`]. Representations are compared against their last stored
//! snapshot at save time; [`Entry`] offers property-level edits that update
//! the state immediately. Detaching is only allowed once an entity has no
//! pending changes, so a write can never be lost by dropping its tracker
//! entry first.

pub mod context;
pub mod entry;
pub mod index;
pub mod state;

pub use context::{Tag, TagContext};
pub use entry::Entry;
pub use index::SynonymIndex;
pub use state::EntityState;
