use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tracing::debug;

use crate::config::StoreConfig;

/// How long the single in-memory connection may live or sit idle. sqlx's
/// defaults would recycle it after 30 minutes, taking the database with it.
const IN_MEMORY_LIFETIME: Duration = Duration::from_secs(60 * 60 * 24 * 365);

pub async fn establish_connection(config: &StoreConfig) -> Result<DatabaseConnection, DbErr> {
    debug!("Connecting to {}", config.database_url);
    Database::connect(connect_options(config)).await
}

pub fn connect_options(config: &StoreConfig) -> ConnectOptions {
    let mut opt = ConnectOptions::new(config.database_url.clone());

    opt.connect_timeout(config.connect_timeout)
        .acquire_timeout(config.connect_timeout)
        .sqlx_logging(config.sql_logging)
        .sqlx_logging_level(config.sql_log_level);

    // An in-memory SQLite database lives exactly as long as its connection,
    // so the pool must hold one connection and never recycle it.
    if config.is_in_memory() {
        opt.max_connections(1)
            .min_connections(1)
            .idle_timeout(IN_MEMORY_LIFETIME)
            .max_lifetime(IN_MEMORY_LIFETIME);
    } else {
        opt.max_connections(5)
            .min_connections(1)
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(3600));
    }

    opt
}

pub fn get_database_url(database_path: Option<&str>) -> String {
    match database_path {
        Some(":memory:") | None => "sqlite::memory:".to_string(),
        Some(path) => format!("sqlite://{}?mode=rwc", path),
    }
}
