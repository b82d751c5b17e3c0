use std::time::Duration;

use tracing::log::LevelFilter;

use crate::database::connection::get_database_url;
use crate::errors::{StoreError, StoreResult};

/// Connection settings for a tag store. Defaults open a private in-memory
/// SQLite database with statement logging at `DEBUG`.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// sea-orm connection URL, e.g. `sqlite::memory:` or `sqlite://tags.db?mode=rwc`.
    pub database_url: String,
    /// Forward generated SQL to the `tracing` pipeline.
    pub sql_logging: bool,
    /// Level used for forwarded SQL statements.
    pub sql_log_level: LevelFilter,
    pub connect_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: get_database_url(Some(":memory:")),
            sql_logging: true,
            sql_log_level: LevelFilter::Debug,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl StoreConfig {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn file(path: &str) -> Self {
        Self {
            database_url: get_database_url(Some(path)),
            ..Self::default()
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:") || self.database_url.contains("mode=memory")
    }

    /// Reads `TAGSTORE_DATABASE_PATH`, `TAGSTORE_SQL_LOGGING` and
    /// `TAGSTORE_SQL_LOG_LEVEL`, falling back to defaults for unset values.
    pub fn from_env() -> StoreResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> StoreResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup("TAGSTORE_DATABASE_PATH") {
            config.database_url = get_database_url(Some(path.as_str()));
        }

        if let Some(raw) = lookup("TAGSTORE_SQL_LOGGING") {
            config.sql_logging = parse_bool(&raw).ok_or_else(|| {
                StoreError::Configuration(format!("TAGSTORE_SQL_LOGGING: '{}' is not a boolean", raw))
            })?;
        }

        if let Some(raw) = lookup("TAGSTORE_SQL_LOG_LEVEL") {
            config.sql_log_level = raw.parse::<LevelFilter>().map_err(|_| {
                StoreError::Configuration(format!("TAGSTORE_SQL_LOG_LEVEL: unknown level '{}'", raw))
            })?;
        }

        Ok(config)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_in_memory() {
        let config = StoreConfig::default();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert!(config.is_in_memory());
        assert!(config.sql_logging);
        assert_eq!(config.sql_log_level, LevelFilter::Debug);
    }

    #[test]
    fn test_file_config() {
        let config = StoreConfig::file("tags.db");
        assert_eq!(config.database_url, "sqlite://tags.db?mode=rwc");
        assert!(!config.is_in_memory());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = StoreConfig::from_lookup(lookup_from(&[
            ("TAGSTORE_DATABASE_PATH", "/tmp/tags.db"),
            ("TAGSTORE_SQL_LOGGING", "off"),
            ("TAGSTORE_SQL_LOG_LEVEL", "trace"),
        ]))
        .unwrap();

        assert_eq!(config.database_url, "sqlite:///tmp/tags.db?mode=rwc");
        assert!(!config.sql_logging);
        assert_eq!(config.sql_log_level, LevelFilter::Trace);
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        let err = StoreConfig::from_lookup(lookup_from(&[("TAGSTORE_SQL_LOGGING", "maybe")]))
            .unwrap_err();
        assert!(matches!(err, StoreError::Configuration(_)));

        let err = StoreConfig::from_lookup(lookup_from(&[("TAGSTORE_SQL_LOG_LEVEL", "loud")]))
            .unwrap_err();
        assert!(matches!(err, StoreError::Configuration(_)));
    }
}
