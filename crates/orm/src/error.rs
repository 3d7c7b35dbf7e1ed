//! Error types for the scope layer
//!
//! Every failure raised while describing types, compiling clauses,
//! resolving associations or emitting DDL is a [`ModelError`].

use std::fmt;

/// Result type alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// ORM error type alias
pub type OrmError = ModelError;

/// ORM result type alias
pub type OrmResult<T> = ModelResult<T>;

/// Error types for ORM operations
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Statement execution failed; text is passed through from the executor untouched
    Database(String),
    /// An association could not be resolved to a field on either side
    SchemaResolution(String),
    /// A scanned or plucked value does not fit its destination
    TypeMismatch(String),
    /// Column missing from a result row or a table descriptor
    ColumnNotFound(String),
    /// Primary key is missing or invalid
    MissingPrimaryKey,
    /// Serialization/deserialization error
    Serialization(String),
    /// Configuration error
    Configuration(String),
    /// DDL generation error
    Migration(String),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Database(msg) => write!(f, "{}", msg),
            ModelError::SchemaResolution(msg) => write!(f, "invalid association {}", msg),
            ModelError::TypeMismatch(msg) => write!(f, "Type mismatch: {}", msg),
            ModelError::ColumnNotFound(column) => write!(f, "Column '{}' not found", column),
            ModelError::MissingPrimaryKey => write!(f, "Primary key is missing or invalid"),
            ModelError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            ModelError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            ModelError::Migration(msg) => write!(f, "Migration error: {}", msg),
        }
    }
}

impl std::error::Error for ModelError {}

// Convert from sqlx errors
impl From<sqlx::Error> for ModelError {
    fn from(err: sqlx::Error) -> Self {
        ModelError::Database(err.to_string())
    }
}

// Convert from serde_json errors
impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Serialization(err.to_string())
    }
}

/// Error types for relationship descriptors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RelationshipError {
    /// No field on either side carries the foreign key
    #[error("no foreign key found among {candidates:?}")]
    Unresolvable { candidates: Vec<String> },

    /// The relationship descriptor is internally inconsistent
    #[error("invalid relationship configuration: {0}")]
    InvalidConfiguration(String),

    /// A named relationship field does not exist on the owner
    #[error("relationship field '{0}' not found")]
    UnknownField(String),
}

impl From<RelationshipError> for ModelError {
    fn from(err: RelationshipError) -> Self {
        ModelError::SchemaResolution(err.to_string())
    }
}
