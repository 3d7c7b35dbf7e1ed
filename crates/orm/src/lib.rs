//! # elif-scope: query scopes for elif.rs
//!
//! The layer underneath the elif.rs ORM that turns structured conditions into
//! parameterised SQL, maps described types to tables, and resolves the
//! associations between them.
//!
//! - [`schema`]: type descriptions, naming conventions and the descriptor registry
//! - [`query`]: clause shapes, the copy-on-write [`Search`] and SQL rendering
//! - [`scope`]: per-operation state that executes searches
//! - [`relationships`]: relationship metadata and association loading
//! - [`migrations`]: DDL generation and auto-migration
//!
//! Statements run through an [`Executor`]; dialect differences live behind [`Dialect`].

pub mod backends;
pub mod config;
pub mod error;
pub mod migrations;
pub mod query;
pub mod relationships;
pub mod schema;
pub mod scope;


// Re-export core traits and types
pub use backends::{
    ColumnType, DatabaseBackendType, DatabaseRow, DatabaseRowExt, DatabaseValue, Dialect,
    Executor, Valuer,
};
pub use config::OrmConfig;
pub use error::*;
pub use migrations::{DdlBuilder, Migrator};
pub use query::{Argument, Query, RenderedSql, Search, SqlRenderer};
pub use relationships::{RelationshipMetadata, RelationshipType};
pub use schema::{
    DynRecord, FieldDefinition, FieldKind, FromRow, Record, Schema, SchemaRegistry,
    TableDescriptor, TypeDefinition, TypeRef,
};
pub use scope::{ScanTarget, Scope};
