//! Relationships Module - relationship metadata and association loading

pub mod metadata;
pub mod resolver;

pub use metadata::{ForeignKeyConfig, PolymorphicConfig, RelationshipMetadata, RelationshipType};
pub use resolver::{load, related, related_search};
