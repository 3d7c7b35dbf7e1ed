//! Relationship Metadata System - Core metadata definitions for relationships

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::schema::naming::to_db_name;

/// Defines the type of relationship between models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    /// The owner holds the foreign key of a single related row
    BelongsTo,
    /// One-to-one relationship, foreign key on the related row
    HasOne,
    /// One-to-many relationship, foreign key on the related rows
    HasMany,
    /// Many-to-many relationship through a join table
    ManyToMany,
}

impl RelationshipType {
    /// Returns true if this relationship returns a collection
    pub fn is_collection(self) -> bool {
        matches!(self, Self::HasMany | Self::ManyToMany)
    }

    /// Returns true if this relationship requires a join table
    pub fn requires_pivot(self) -> bool {
        matches!(self, Self::ManyToMany)
    }

    /// Conventional name, as used in descriptors and logs
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BelongsTo => "belongs_to",
            Self::HasOne => "has_one",
            Self::HasMany => "has_many",
            Self::ManyToMany => "many_to_many",
        }
    }
}

impl std::fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A key field, by declared name and column name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyConfig {
    /// Declared field name, e.g. `UserId`; empty when the relation has no key field
    pub field: String,
    /// Normalized column name, e.g. `user_id`
    pub column: String,
}

impl ForeignKeyConfig {
    pub fn new(field: impl Into<String>) -> Self {
        let field = field.into();
        let column = to_db_name(&field);
        Self { field, column }
    }

    /// Key of a relation stored without a key field on the related side
    pub fn none() -> Self {
        Self {
            field: String::new(),
            column: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.field.is_empty()
    }
}

/// Polymorphic relationship configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolymorphicConfig {
    /// Field on the related type storing the owner's table name, e.g. `OwnerType`
    pub type_field: String,
    /// Its column name, e.g. `owner_type`
    pub type_column: String,
}

impl PolymorphicConfig {
    pub fn new(type_field: impl Into<String>) -> Self {
        let type_field = type_field.into();
        let type_column = to_db_name(&type_field);
        Self {
            type_field,
            type_column,
        }
    }

    /// Validate the polymorphic configuration
    pub fn validate(&self) -> ModelResult<()> {
        if self.type_field.is_empty() {
            return Err(ModelError::Configuration(
                "Polymorphic type field cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Relationship metadata attached to a struct or collection field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipMetadata {
    /// The type of relationship
    pub relationship_type: RelationshipType,

    /// Name of the relationship (field name in the model)
    pub name: String,

    /// The related model's type name
    pub related_model: String,

    /// Key field linking the two sides
    pub foreign_key: ForeignKeyConfig,

    /// Key of the related side inside a join table
    pub association_foreign_key: ForeignKeyConfig,

    /// Join table for many-to-many relationships
    pub join_table: Option<String>,

    /// Polymorphic configuration
    pub polymorphic_config: Option<PolymorphicConfig>,
}

impl RelationshipMetadata {
    /// Create a new RelationshipMetadata instance
    pub fn new(
        relationship_type: RelationshipType,
        name: impl Into<String>,
        related_model: impl Into<String>,
        foreign_key: ForeignKeyConfig,
    ) -> Self {
        Self {
            relationship_type,
            name: name.into(),
            related_model: related_model.into(),
            foreign_key,
            association_foreign_key: ForeignKeyConfig::none(),
            join_table: None,
            polymorphic_config: None,
        }
    }

    pub fn with_association_foreign_key(mut self, key: ForeignKeyConfig) -> Self {
        self.association_foreign_key = key;
        self
    }

    /// Set the join table
    pub fn with_join_table(mut self, join_table: impl Into<String>) -> Self {
        self.join_table = Some(join_table.into());
        self
    }

    /// Set polymorphic configuration
    pub fn with_polymorphic(mut self, polymorphic_config: PolymorphicConfig) -> Self {
        self.polymorphic_config = Some(polymorphic_config);
        self
    }

    /// Join table name, when the relationship goes through one
    pub fn join_table(&self) -> Option<&str> {
        self.join_table.as_deref().filter(|table| !table.is_empty())
    }

    /// Validate the relationship metadata for consistency
    pub fn validate(&self) -> ModelResult<()> {
        if self.relationship_type.requires_pivot() {
            if self.join_table().is_none() {
                return Err(ModelError::Configuration(format!(
                    "Relationship '{}' of type {} requires a join table",
                    self.name, self.relationship_type
                )));
            }
            if self.foreign_key.is_empty() || self.association_foreign_key.is_empty() {
                return Err(ModelError::Configuration(format!(
                    "Join table of relationship '{}' needs both foreign keys",
                    self.name
                )));
            }
            if self.foreign_key.column == self.association_foreign_key.column {
                return Err(ModelError::Configuration(format!(
                    "Join table keys of relationship '{}' must be different",
                    self.name
                )));
            }
        }

        if matches!(
            self.relationship_type,
            RelationshipType::BelongsTo | RelationshipType::HasOne
        ) && self.foreign_key.is_empty()
        {
            return Err(ModelError::Configuration(format!(
                "Relationship '{}' of type {} requires a foreign key",
                self.name, self.relationship_type
            )));
        }

        if let Some(ref poly) = self.polymorphic_config {
            poly.validate()?;
        }

        Ok(())
    }
}
