//! Scope layer configuration
//!
//! Naming and DDL defaults shared by every descriptor a registry builds.

use serde::{Deserialize, Serialize};

use crate::backends::DatabaseBackendType;
use crate::error::{ModelError, ModelResult};

/// Default size handed to the dialect for string and byte columns
pub const DEFAULT_STRING_SIZE: usize = 255;

/// Configuration for schema reflection and SQL rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrmConfig {
    /// Use the snake_cased type name as table name without pluralising it
    pub singular_table: bool,
    /// Column size used when a field declares none
    pub default_string_size: usize,
    /// Database backend whose dialect renders identifiers and types
    pub backend: DatabaseBackendType,
}

impl Default for OrmConfig {
    fn default() -> Self {
        Self {
            singular_table: false,
            default_string_size: DEFAULT_STRING_SIZE,
            backend: DatabaseBackendType::PostgreSQL,
        }
    }
}

impl OrmConfig {
    /// Create a configuration for the given backend
    pub fn new(backend: DatabaseBackendType) -> Self {
        Self {
            backend,
            ..Self::default()
        }
    }

    /// Enable or disable singular table names
    pub fn with_singular_table(mut self, singular_table: bool) -> Self {
        self.singular_table = singular_table;
        self
    }

    /// Override the default column size
    pub fn with_default_string_size(mut self, size: usize) -> Self {
        self.default_string_size = size;
        self
    }

    /// Read configuration from `ELIF_ORM_*` environment variables
    pub fn from_env() -> ModelResult<Self> {
        let mut config = Self::default();

        if let Ok(backend) = std::env::var("ELIF_ORM_BACKEND") {
            config.backend = backend
                .parse()
                .map_err(ModelError::Configuration)?;
        }

        if let Ok(singular) = std::env::var("ELIF_ORM_SINGULAR_TABLE") {
            config.singular_table = parse_flag(&singular).ok_or_else(|| {
                ModelError::Configuration(format!(
                    "ELIF_ORM_SINGULAR_TABLE must be a boolean, got '{}'",
                    singular
                ))
            })?;
        }

        if let Ok(size) = std::env::var("ELIF_ORM_STRING_SIZE") {
            config.default_string_size = size.trim().parse().map_err(|e| {
                ModelError::Configuration(format!("ELIF_ORM_STRING_SIZE is invalid: {}", e))
            })?;
        }

        tracing::debug!(
            "Loaded ORM configuration: backend={}, singular_table={}, default_string_size={}",
            config.backend,
            config.singular_table,
            config.default_string_size
        );

        Ok(config)
    }

    /// Build a configuration whose backend is detected from a database URL
    pub fn from_database_url(database_url: &str) -> ModelResult<Self> {
        Ok(Self::new(DatabaseBackendType::from_url(database_url)?))
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OrmConfig::default();
        assert!(!config.singular_table);
        assert_eq!(config.default_string_size, 255);
        assert_eq!(config.backend, DatabaseBackendType::PostgreSQL);
    }

    #[test]
    fn test_from_database_url() {
        let config = OrmConfig::from_database_url("mysql://root@localhost/app").unwrap();
        assert_eq!(config.backend, DatabaseBackendType::MySQL);

        assert!(OrmConfig::from_database_url("redis://localhost").is_err());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: OrmConfig =
            serde_json::from_value(serde_json::json!({ "singular_table": true, "backend": "sqlite" }))
                .unwrap();
        assert!(config.singular_table);
        assert_eq!(config.backend, DatabaseBackendType::SQLite);
        assert_eq!(config.default_string_size, 255);
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" off "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
