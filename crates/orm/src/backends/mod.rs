//! Database Backend Abstractions
//!
//! This module provides the collaborator interfaces the scope layer consumes:
//! bound values, result rows, statement execution, and SQL dialects for
//! PostgreSQL, MySQL, SQLite and SQL Server.

pub mod core;
pub mod dialect;
pub mod mssql;
pub mod mysql;
pub mod postgres;
pub mod sqlite;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

// Re-export core traits and types
pub use self::core::*;
pub use dialect::{ColumnType, Dialect};
pub use mssql::MssqlDialect;
pub use mysql::MysqlDialect;
pub use postgres::{PostgresDialect, PostgresExecutor};
pub use sqlite::SqliteDialect;

/// Database backend type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackendType {
    #[serde(alias = "postgres")]
    PostgreSQL,
    MySQL,
    SQLite,
    #[serde(alias = "sqlserver")]
    MsSql,
}

impl DatabaseBackendType {
    /// Dialect implementation for this backend
    pub fn dialect(self) -> Arc<dyn Dialect> {
        match self {
            DatabaseBackendType::PostgreSQL => Arc::new(PostgresDialect),
            DatabaseBackendType::MySQL => Arc::new(MysqlDialect),
            DatabaseBackendType::SQLite => Arc::new(SqliteDialect),
            DatabaseBackendType::MsSql => Arc::new(MssqlDialect),
        }
    }

    /// Detect database backend type from URL
    pub fn from_url(url: &str) -> ModelResult<Self> {
        if url.starts_with("sqlite:") || url.starts_with("file:") {
            return Ok(DatabaseBackendType::SQLite);
        }

        let parsed = url::Url::parse(url)
            .map_err(|e| ModelError::Configuration(format!("Invalid database URL: {}", e)))?;

        match parsed.scheme() {
            "postgres" | "postgresql" => Ok(DatabaseBackendType::PostgreSQL),
            "mysql" | "mariadb" => Ok(DatabaseBackendType::MySQL),
            "mssql" | "sqlserver" => Ok(DatabaseBackendType::MsSql),
            scheme => Err(ModelError::Configuration(format!(
                "Unable to detect database backend from URL scheme '{}'",
                scheme
            ))),
        }
    }
}

impl std::fmt::Display for DatabaseBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseBackendType::PostgreSQL => write!(f, "postgresql"),
            DatabaseBackendType::MySQL => write!(f, "mysql"),
            DatabaseBackendType::SQLite => write!(f, "sqlite"),
            DatabaseBackendType::MsSql => write!(f, "mssql"),
        }
    }
}

impl std::str::FromStr for DatabaseBackendType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgresql" | "postgres" => Ok(DatabaseBackendType::PostgreSQL),
            "mysql" => Ok(DatabaseBackendType::MySQL),
            "sqlite" => Ok(DatabaseBackendType::SQLite),
            "mssql" | "sqlserver" => Ok(DatabaseBackendType::MsSql),
            _ => Err(format!("Unsupported database backend: {}", s)),
        }
    }
}
