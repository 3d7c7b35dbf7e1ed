//! Schema description and reflection
//!
//! Types describe themselves through [`Schema`]; the [`SchemaRegistry`]
//! turns those descriptions into shared, immutable [`TableDescriptor`]s.

pub mod definition;
pub mod descriptor;
pub mod naming;
pub mod reflector;
pub mod registry;

pub use definition::{
    parse_tag_settings, DynRecord, FieldDefinition, FieldKind, FieldOptions, FromRow, Record,
    Schema, TypeDefinition, TypeRef,
};
pub use descriptor::{ColumnDescriptor, TableDescriptor};
pub use naming::{pluralize, table_name_for, to_db_name};
pub use reflector::Reflector;
pub use registry::SchemaRegistry;
