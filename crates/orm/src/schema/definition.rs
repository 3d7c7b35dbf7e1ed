//! Type Definitions - explicit description of a model's declared shape
//!
//! A type describes its fields once through [`Schema::definition`]; the
//! reflector turns that description into a [`TableDescriptor`](super::TableDescriptor)
//! using naming conventions and the declarative options recorded here.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;

use crate::backends::{ColumnType, DatabaseRow, DatabaseValue};
use crate::error::ModelResult;

/// Types that can describe their own fields
pub trait Schema: Send + Sync + 'static {
    /// Declared shape of the type
    fn definition() -> TypeDefinition;
}

/// Model instances exposing their field values
pub trait Record: Schema {
    /// Value of a declared field, looked up by the field's declared name
    fn field_value(&self, field: &str) -> Option<DatabaseValue>;
}

/// Models that can be built from a result row
pub trait FromRow: Sized {
    fn from_row(row: &dyn DatabaseRow) -> ModelResult<Self>;
}

/// Object-safe view of a [`Record`]
pub trait DynRecord: Send + Sync {
    fn type_ref(&self) -> TypeRef;
    fn field_value(&self, field: &str) -> Option<DatabaseValue>;
}

impl<T: Record> DynRecord for T {
    fn type_ref(&self) -> TypeRef {
        TypeRef::of::<T>()
    }

    fn field_value(&self, field: &str) -> Option<DatabaseValue> {
        Record::field_value(self, field)
    }
}

impl fmt::Debug for dyn DynRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Record<{}>", self.type_ref().name())
    }
}

/// Handle on a described type: identity plus a lazily evaluated definition
#[derive(Clone, Copy)]
pub struct TypeRef {
    id: TypeId,
    definition: fn() -> TypeDefinition,
}

impl TypeRef {
    pub fn of<T: Schema>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            definition: T::definition,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn definition(&self) -> TypeDefinition {
        (self.definition)()
    }

    /// Declared type name
    pub fn name(&self) -> String {
        self.definition().name
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeRef {}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeRef").field(&self.id).finish()
    }
}

/// Structural kind of a declared field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Scalar or time value stored directly in a column
    Scalar(ColumnType),
    /// Custom value type that scans itself, stored as the given type
    Scanner(ColumnType),
    /// A single nested struct: embedded, belongs-to or has-one
    Struct(TypeRef),
    /// A collection of structs: has-many or many-to-many
    StructSlice(TypeRef),
}

/// Declarative options attached to a field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldOptions {
    pub ignored: bool,
    pub primary_key: bool,
    pub column: Option<String>,
    pub sql_type: Option<String>,
    pub size: Option<usize>,
    pub not_null: bool,
    pub unique: bool,
    pub default: Option<String>,
    pub many2many: Option<String>,
    pub foreign_key: Option<String>,
    pub association_foreign_key: Option<String>,
    pub foreign_type: Option<String>,
    pub polymorphic: Option<String>,
    pub embedded: bool,
}

impl FieldOptions {
    /// Build options from `sql` and `gorm` style tag strings
    pub fn from_tags(sql: &str, gorm: &str) -> Self {
        let mut options = Self::default();

        if sql.trim() == "-" {
            options.ignored = true;
            return options;
        }

        let sql_settings = parse_tag_settings(sql);
        let gorm_settings = parse_tag_settings(gorm);

        options.sql_type = sql_settings.get("TYPE").cloned();
        options.size = sql_settings.get("SIZE").and_then(|s| s.trim().parse().ok());
        options.not_null = sql_settings.contains_key("NOT NULL");
        options.unique = sql_settings.contains_key("UNIQUE");
        options.default = sql_settings.get("DEFAULT").cloned();

        options.primary_key = gorm_settings.contains_key("PRIMARY_KEY");
        options.column = gorm_settings.get("COLUMN").cloned();
        options.many2many = gorm_settings.get("MANY2MANY").cloned();
        options.foreign_key = gorm_settings.get("FOREIGNKEY").cloned();
        options.association_foreign_key = gorm_settings.get("ASSOCIATIONFOREIGNKEY").cloned();
        options.foreign_type = gorm_settings.get("FOREIGNTYPE").cloned();
        options.polymorphic = gorm_settings.get("POLYMORPHIC").cloned();
        options.embedded = gorm_settings.contains_key("EMBEDDED");

        options
    }
}

/// Parse a `key:value;flag` tag string; keys are upper-cased, bare keys map to themselves
pub fn parse_tag_settings(tag: &str) -> HashMap<String, String> {
    let mut settings = HashMap::new();

    for part in tag.split(';') {
        if part.trim().is_empty() {
            continue;
        }
        let mut pieces = part.splitn(2, ':');
        let key = pieces.next().unwrap_or_default().trim().to_uppercase();
        match pieces.next() {
            Some(value) => settings.insert(key, value.to_string()),
            None => settings.insert(key.clone(), key),
        };
    }

    settings
}

/// A single declared field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    pub name: String,
    pub kind: FieldKind,
    /// Anonymous fields are spliced into their owner like embedded ones
    pub anonymous: bool,
    pub options: FieldOptions,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            anonymous: false,
            options: FieldOptions::default(),
        }
    }

    /// Plain scalar column
    pub fn scalar(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self::new(name, FieldKind::Scalar(column_type))
    }

    /// Nested struct field
    pub fn nested<T: Schema>(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Struct(TypeRef::of::<T>()))
    }

    /// Collection of structs
    pub fn many<T: Schema>(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::StructSlice(TypeRef::of::<T>()))
    }

    /// Anonymous (embedded) struct field
    pub fn anonymous<T: Schema>(name: impl Into<String>) -> Self {
        let mut field = Self::nested::<T>(name);
        field.anonymous = true;
        field
    }

    /// Replace options with those parsed from tag strings
    pub fn tags(mut self, sql: &str, gorm: &str) -> Self {
        self.options = FieldOptions::from_tags(sql, gorm);
        self
    }

    pub fn ignored(mut self) -> Self {
        self.options.ignored = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.options.primary_key = true;
        self
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.options.column = Some(column.into());
        self
    }

    pub fn sql_type(mut self, sql_type: impl Into<String>) -> Self {
        self.options.sql_type = Some(sql_type.into());
        self
    }

    pub fn size(mut self, size: usize) -> Self {
        self.options.size = Some(size);
        self
    }

    pub fn not_null(mut self) -> Self {
        self.options.not_null = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.options.unique = true;
        self
    }

    pub fn default_value(mut self, default: impl Into<String>) -> Self {
        self.options.default = Some(default.into());
        self
    }

    pub fn many2many(mut self, join_table: impl Into<String>) -> Self {
        self.options.many2many = Some(join_table.into());
        self
    }

    pub fn foreign_key(mut self, field: impl Into<String>) -> Self {
        self.options.foreign_key = Some(field.into());
        self
    }

    pub fn association_foreign_key(mut self, field: impl Into<String>) -> Self {
        self.options.association_foreign_key = Some(field.into());
        self
    }

    pub fn foreign_type(mut self, field: impl Into<String>) -> Self {
        self.options.foreign_type = Some(field.into());
        self
    }

    pub fn polymorphic(mut self, name: impl Into<String>) -> Self {
        self.options.polymorphic = Some(name.into());
        self
    }

    pub fn embedded(mut self) -> Self {
        self.options.embedded = true;
        self
    }
}

/// Declared shape of a type
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDefinition {
    pub name: String,
    pub table_name: Option<String>,
    pub fields: Vec<FieldDefinition>,
}

impl TypeDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table_name: None,
            fields: Vec::new(),
        }
    }

    /// Explicit table name, bypassing the naming convention
    pub fn table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    /// Find a field by name, comparing normalized names
    pub fn find_field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields
            .iter()
            .find(|field| super::naming::same_column(&field.name, name))
    }
}
