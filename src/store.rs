use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::database::connection::establish_connection;
use crate::database::migrations::Migrator;
use crate::errors::{StoreError, StoreResult};
use crate::tracking::TagContext;

/// Owns the connection to one tag database.
///
/// For in-memory stores the database exists only while this value (or a
/// context created from it) is alive. Dropping releases the connection, so
/// callers that bail out early, including failed assertions, still clean up.
pub struct TagStore {
    db: DatabaseConnection,
    config: StoreConfig,
}

impl TagStore {
    /// Connects and creates the schema. Failures are not retried.
    pub async fn initialize(config: StoreConfig) -> StoreResult<Self> {
        let db = establish_connection(&config)
            .await
            .map_err(StoreError::Initialization)?;

        Migrator::up(&db, None)
            .await
            .map_err(StoreError::Initialization)?;

        info!(url = %config.database_url, "Tag store ready");
        Ok(Self { db, config })
    }

    pub async fn in_memory() -> StoreResult<Self> {
        Self::initialize(StoreConfig::in_memory()).await
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// A fresh unit of work sharing this store's connection.
    pub fn context(&self) -> TagContext {
        TagContext::new(self.db.clone())
    }

    pub async fn close(self) -> StoreResult<()> {
        debug!(url = %self.config.database_url, "Closing tag store");
        self.db.close().await?;
        Ok(())
    }
}
