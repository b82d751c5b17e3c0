//! Error types for tagstore
//!
//! All fallible store and tracker operations return [`StoreError`]. Callers at the
//! top level (scenarios, tests) usually wrap these in `anyhow::Result`.
//!
//! # Examples
//!
//! ```rust
//! use tagstore::errors::StoreError;
//! use uuid::Uuid;
//!
//! let id = Uuid::new_v4();
//! let err = StoreError::NotTracked(id);
//! assert!(err.is_tracking_error());
//! ```

pub mod store;

pub use store::StoreError;

/// Result type alias for store and tracker operations
pub type StoreResult<T> = Result<T, StoreError>;
