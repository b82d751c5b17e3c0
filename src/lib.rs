pub mod config;
pub mod database;
pub mod errors;
pub mod scenarios;
pub mod store;
pub mod tracking;

pub use config::StoreConfig;
pub use errors::{StoreError, StoreResult};
pub use store::TagStore;
pub use tracking::{EntityState, Tag, TagContext};
