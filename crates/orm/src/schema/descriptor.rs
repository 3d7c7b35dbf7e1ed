//! Table and column descriptors produced by the reflector

use serde::Serialize;

use super::definition::{FieldKind, FieldOptions};
use super::naming::same_column;
use crate::relationships::metadata::RelationshipMetadata;

/// Mapping of one declared field to the table
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    /// Declared field name
    pub name: String,
    /// Path from the described type to the field, through embedded structs
    pub names: Vec<String>,
    /// Column name
    pub db_name: String,
    pub is_primary_key: bool,
    /// Stored directly in a column
    pub is_normal: bool,
    pub is_ignored: bool,
    pub is_scanner: bool,
    pub has_default_value: bool,
    /// DDL type with modifiers; empty for anything but normal columns
    pub sql_tag: String,
    pub kind: FieldKind,
    pub options: FieldOptions,
    pub relationship: Option<RelationshipMetadata>,
}

impl ColumnDescriptor {
    /// Whether the field may appear in generated DDL and conditions
    pub fn is_column(&self) -> bool {
        self.is_normal && !self.is_ignored
    }
}

/// Summary of a column, for logs and diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary<'a> {
    pub name: &'a str,
    pub db_name: &'a str,
    pub sql_tag: &'a str,
    pub primary_key: bool,
    pub relationship: Option<&'a RelationshipMetadata>,
}

/// Mapping of a described type to its table
#[derive(Debug, Clone, PartialEq)]
pub struct TableDescriptor {
    /// Declared type name
    pub type_name: String,
    pub table_name: String,
    /// Fields in declaration order, embedded fields spliced in place
    pub fields: Vec<ColumnDescriptor>,
    /// Index of the primary key in `fields`
    pub primary_key: Option<usize>,
}

impl TableDescriptor {
    pub fn primary_key_field(&self) -> Option<&ColumnDescriptor> {
        self.primary_key.and_then(|index| self.fields.get(index))
    }

    /// Column name of the primary key, `id` when the type has none
    pub fn primary_key_name(&self) -> &str {
        self.primary_key_field()
            .map(|field| field.db_name.as_str())
            .unwrap_or("id")
    }

    /// Find a non-ignored field by declared or column name
    pub fn field(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.fields
            .iter()
            .filter(|field| !field.is_ignored)
            .find(|field| field.db_name == name || same_column(&field.name, name))
    }

    /// Find a normal column by column name
    pub fn column(&self, db_name: &str) -> Option<&ColumnDescriptor> {
        self.normal_fields().find(|field| field.db_name == db_name)
    }

    pub fn has_column(&self, db_name: &str) -> bool {
        self.column(db_name).is_some()
    }

    /// Fields stored in columns, in declaration order
    pub fn normal_fields(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.fields.iter().filter(|field| field.is_column())
    }

    /// Fields carrying a relationship
    pub fn relationship_fields(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.fields
            .iter()
            .filter(|field| !field.is_ignored && field.relationship.is_some())
    }

    pub fn summary(&self) -> Vec<ColumnSummary<'_>> {
        self.fields
            .iter()
            .filter(|field| !field.is_ignored)
            .map(|field| ColumnSummary {
                name: &field.name,
                db_name: &field.db_name,
                sql_tag: &field.sql_tag,
                primary_key: field.is_primary_key,
                relationship: field.relationship.as_ref(),
            })
            .collect()
    }
}
