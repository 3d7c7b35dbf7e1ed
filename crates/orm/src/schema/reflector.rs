//! Schema Reflector - derives table descriptors from type definitions
//!
//! Table names, column names, primary keys and relationship kinds follow
//! naming conventions unless a field's options say otherwise:
//!
//! - a collection of structs is `has_many`, or `many_to_many` with a join table;
//! - a struct field is `belongs_to` when the owner declares `<Field>Id`,
//!   otherwise `has_one` keyed by `<Owner>Id` on the related type;
//! - embedded and anonymous structs contribute their columns to the owner.

use super::definition::{FieldDefinition, FieldKind, TypeDefinition, TypeRef};
use super::descriptor::{ColumnDescriptor, TableDescriptor};
use super::naming::{table_name_for, to_db_name};
use crate::backends::Dialect;
use crate::config::OrmConfig;
use crate::relationships::metadata::{
    ForeignKeyConfig, PolymorphicConfig, RelationshipMetadata, RelationshipType,
};

/// Builds [`TableDescriptor`]s for a dialect and configuration
pub struct Reflector<'a> {
    dialect: &'a dyn Dialect,
    config: &'a OrmConfig,
}

impl<'a> Reflector<'a> {
    pub fn new(dialect: &'a dyn Dialect, config: &'a OrmConfig) -> Self {
        Self { dialect, config }
    }

    /// Describe a type
    pub fn describe(&self, type_ref: TypeRef) -> TableDescriptor {
        self.describe_definition(&type_ref.definition())
    }

    /// Describe an already evaluated definition
    pub fn describe_definition(&self, definition: &TypeDefinition) -> TableDescriptor {
        let table_name = definition
            .table_name
            .clone()
            .unwrap_or_else(|| table_name_for(&definition.name, self.config.singular_table));

        let mut fields: Vec<ColumnDescriptor> = Vec::with_capacity(definition.fields.len());
        let mut primary_key = None;

        for field in &definition.fields {
            if field.options.ignored {
                fields.push(self.base_column(field, true));
                continue;
            }

            if let FieldKind::Struct(nested) = &field.kind {
                if field.options.embedded || field.anonymous {
                    let embedded = self.describe(*nested);
                    for mut nested_field in embedded.fields {
                        nested_field.names.insert(0, field.name.clone());
                        if nested_field.is_primary_key && primary_key.is_none() {
                            primary_key = Some(fields.len());
                        }
                        fields.push(nested_field);
                    }
                    continue;
                }
            }

            let mut column = self.base_column(field, false);
            column.relationship = self.relationship(definition, field);
            column.is_normal = column.relationship.is_none();
            column.is_primary_key &= column.is_normal;

            if column.is_primary_key && primary_key.map_or(true, |pk| fields[pk].names.len() > 1) {
                primary_key = Some(fields.len());
            }
            fields.push(column);
        }

        if primary_key.is_none() {
            primary_key = fields
                .iter()
                .position(|field| field.is_column() && field.db_name == "id");
            if let Some(index) = primary_key {
                fields[index].is_primary_key = true;
            }
        }

        for (index, field) in fields.iter_mut().enumerate() {
            // Embedded keys only count when promoted to the owner's key
            if field.names.len() > 1 && primary_key != Some(index) {
                field.is_primary_key = false;
            }
            if field.is_column() {
                field.sql_tag = self.sql_tag(field);
            }
        }

        TableDescriptor {
            type_name: definition.name.clone(),
            table_name,
            fields,
            primary_key,
        }
    }

    fn base_column(&self, field: &FieldDefinition, ignored: bool) -> ColumnDescriptor {
        let options = &field.options;

        ColumnDescriptor {
            name: field.name.clone(),
            names: vec![field.name.clone()],
            db_name: options
                .column
                .clone()
                .unwrap_or_else(|| to_db_name(&field.name)),
            is_primary_key: !ignored && options.primary_key,
            is_normal: false,
            is_ignored: ignored,
            is_scanner: matches!(field.kind, FieldKind::Scanner(_)),
            has_default_value: options.default.is_some(),
            sql_tag: String::new(),
            kind: field.kind.clone(),
            options: options.clone(),
            relationship: None,
        }
    }

    /// Classify a non-embedded field; plain columns have no relationship
    fn relationship(
        &self,
        owner: &TypeDefinition,
        field: &FieldDefinition,
    ) -> Option<RelationshipMetadata> {
        let options = &field.options;

        let mut foreign_key = options.foreign_key.clone();
        let mut foreign_type = options.foreign_type.clone();
        if let Some(polymorphic) = options.polymorphic.as_deref().filter(|p| !p.is_empty()) {
            foreign_key = Some(format!("{}Id", polymorphic));
            foreign_type = Some(format!("{}Type", polymorphic));
        }

        let metadata = match &field.kind {
            FieldKind::Scalar(_) | FieldKind::Scanner(_) => return None,
            FieldKind::StructSlice(element) => {
                let element_definition = element.definition();
                let foreign_key = foreign_key.unwrap_or_else(|| format!("{}Id", owner.name));
                let association_key = options
                    .association_foreign_key
                    .clone()
                    .unwrap_or_else(|| format!("{}Id", element_definition.name));

                let metadata = match options.many2many.as_deref().filter(|t| !t.is_empty()) {
                    Some(join_table) => RelationshipMetadata::new(
                        RelationshipType::ManyToMany,
                        &field.name,
                        &element_definition.name,
                        ForeignKeyConfig::new(foreign_key),
                    )
                    .with_join_table(join_table),
                    None => {
                        let key = if has_field(&element_definition, &foreign_key) {
                            ForeignKeyConfig::new(foreign_key)
                        } else {
                            ForeignKeyConfig::none()
                        };
                        RelationshipMetadata::new(
                            RelationshipType::HasMany,
                            &field.name,
                            &element_definition.name,
                            key,
                        )
                    }
                };

                metadata.with_association_foreign_key(ForeignKeyConfig::new(association_key))
            }
            FieldKind::Struct(related) => {
                let (belongs_to_key, has_one_key) = match foreign_key {
                    Some(key) => (key.clone(), key),
                    None => (format!("{}Id", field.name), format!("{}Id", owner.name)),
                };

                let (relationship_type, key) = if has_field(owner, &belongs_to_key) {
                    (RelationshipType::BelongsTo, belongs_to_key)
                } else {
                    (RelationshipType::HasOne, has_one_key)
                };

                RelationshipMetadata::new(
                    relationship_type,
                    &field.name,
                    related.name(),
                    ForeignKeyConfig::new(key),
                )
            }
        };

        Some(match foreign_type.filter(|t| !t.is_empty()) {
            Some(type_field) => metadata.with_polymorphic(PolymorphicConfig::new(type_field)),
            None => metadata,
        })
    }

    /// DDL type of a normal column with its modifiers
    fn sql_tag(&self, field: &ColumnDescriptor) -> String {
        let column_type = match field.kind {
            FieldKind::Scalar(column_type) | FieldKind::Scanner(column_type) => column_type,
            _ => return String::new(),
        };
        let options = &field.options;
        let size = options.size.unwrap_or(self.config.default_string_size);

        let mut parts = vec![match options.sql_type.as_deref().filter(|t| !t.trim().is_empty()) {
            Some(sql_type) => sql_type.trim().to_string(),
            None if field.is_primary_key => self.dialect.primary_key_type(column_type, size),
            None => self.dialect.column_type(column_type, size),
        }];

        if options.not_null {
            parts.push("NOT NULL".to_string());
        }
        if options.unique {
            parts.push("UNIQUE".to_string());
        }
        if let Some(default) = &options.default {
            parts.push(format!("DEFAULT {}", default));
        }

        parts.join(" ")
    }
}

/// Whether a definition declares a field, looking through embedded structs
fn has_field(definition: &TypeDefinition, name: &str) -> bool {
    if definition.find_field(name).is_some() {
        return true;
    }

    definition.fields.iter().any(|field| match &field.kind {
        FieldKind::Struct(nested) if field.options.embedded || field.anonymous => {
            has_field(&nested.definition(), name)
        }
        _ => false,
    })
}
