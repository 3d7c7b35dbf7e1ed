//! Test support: an in-memory executor, mock rows and a small set of described models
//!
//! The executor records every statement it receives and answers catalogue
//! queries (`has_table`/`has_column`) from the tables it was seeded with.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::backends::{
    ColumnType, DatabaseRow, DatabaseRowExt, DatabaseValue, Dialect, Executor, SqliteDialect,
};
use crate::config::OrmConfig;
use crate::error::{ModelError, ModelResult, OrmResult};
use crate::schema::{FieldDefinition, FromRow, Record, Schema, SchemaRegistry, TypeDefinition};

/// Mock database row with ordered columns
#[derive(Debug, Clone, Default)]
pub struct MockRow {
    columns: Vec<(String, JsonValue)>,
}

impl MockRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column<T: Into<JsonValue>>(mut self, name: &str, value: T) -> Self {
        self.columns.push((name.to_string(), value.into()));
        self
    }
}

impl DatabaseRow for MockRow {
    fn get_by_index(&self, index: usize) -> OrmResult<DatabaseValue> {
        self.columns
            .get(index)
            .map(|(_, value)| DatabaseValue::from_json(value.clone()))
            .ok_or_else(|| ModelError::ColumnNotFound(format!("#{}", index)))
    }

    fn get_by_name(&self, name: &str) -> OrmResult<DatabaseValue> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| DatabaseValue::from_json(value.clone()))
            .ok_or_else(|| ModelError::ColumnNotFound(name.to_string()))
    }

    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|(name, _)| name.clone()).collect()
    }
}

/// One statement received by the mock executor
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<DatabaseValue>,
}

/// Executor recording statements instead of running them
#[derive(Default)]
pub struct MockExecutor {
    tables: HashMap<String, Vec<String>>,
    results: Mutex<VecDeque<Vec<MockRow>>>,
    failure: Option<(String, String)>,
    log: Mutex<Vec<Statement>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend `table` exists with the given columns
    pub fn with_table(mut self, table: &str, columns: &[&str]) -> Self {
        self.tables.insert(
            table.to_string(),
            columns.iter().map(|c| c.to_string()).collect(),
        );
        self
    }

    /// Queue the result set of the next data query
    pub fn with_rows(self, rows: Vec<MockRow>) -> Self {
        self.results.lock().unwrap().push_back(rows);
        self
    }

    /// Fail every statement containing `pattern` with a database error
    pub fn failing_on(mut self, pattern: &str, message: &str) -> Self {
        self.failure = Some((pattern.to_string(), message.to_string()));
        self
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.log.lock().unwrap().clone()
    }

    /// SQL of every recorded statement starting with `prefix`
    pub fn sql_starting_with(&self, prefix: &str) -> Vec<String> {
        self.statements()
            .into_iter()
            .filter(|statement| statement.sql.starts_with(prefix))
            .map(|statement| statement.sql)
            .collect()
    }

    /// Last statement that was not a catalogue query
    pub fn last_query(&self) -> Option<Statement> {
        self.statements()
            .into_iter()
            .rev()
            .find(|statement| !is_catalogue(&statement.sql))
    }

    fn record(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<()> {
        self.log.lock().unwrap().push(Statement {
            sql: sql.to_string(),
            params: params.to_vec(),
        });

        match &self.failure {
            Some((pattern, message)) if sql.contains(pattern.as_str()) => {
                Err(ModelError::Database(message.clone()))
            }
            _ => Ok(()),
        }
    }

    fn catalogue(&self, sql: &str, params: &[DatabaseValue]) -> Option<MockRow> {
        let text = |index: usize| params.get(index).map(|v| v.to_string()).unwrap_or_default();

        let found = if sql.contains("sqlite_master") || sql.contains("INFORMATION_SCHEMA.tables") {
            self.tables.contains_key(&text(0))
        } else if sql.contains("pragma_table_info") || sql.contains("INFORMATION_SCHEMA.columns") {
            let column = text(1);
            self.tables
                .get(&text(0))
                .map_or(false, |columns| columns.iter().any(|c| *c == column))
        } else {
            return None;
        };

        Some(MockRow::new().with_column("count", found as i64))
    }
}

fn is_catalogue(sql: &str) -> bool {
    ["sqlite_master", "pragma_table_info", "INFORMATION_SCHEMA"]
        .iter()
        .any(|marker| sql.contains(marker))
}

#[async_trait]
impl Executor for MockExecutor {
    async fn execute(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<u64> {
        self.record(sql, params)?;
        Ok(1)
    }

    async fn fetch_all(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Vec<Box<dyn DatabaseRow>>> {
        self.record(sql, params)?;

        if let Some(row) = self.catalogue(sql, params) {
            return Ok(vec![Box::new(row)]);
        }

        let rows = self.results.lock().unwrap().pop_front().unwrap_or_default();
        Ok(rows
            .into_iter()
            .map(|row| Box::new(row) as Box<dyn DatabaseRow>)
            .collect())
    }

    async fn fetch_optional(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Option<Box<dyn DatabaseRow>>> {
        Ok(self.fetch_all(sql, params).await?.into_iter().next())
    }
}

pub fn registry_for<D: Dialect + 'static>(dialect: D) -> SchemaRegistry {
    SchemaRegistry::new(Arc::new(dialect), OrmConfig::default())
}

pub fn sqlite_registry() -> SchemaRegistry {
    registry_for(SqliteDialect)
}

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub age: i32,
    pub company_id: i64,
}

impl Schema for User {
    fn definition() -> TypeDefinition {
        TypeDefinition::new("User")
            .field(FieldDefinition::scalar("Id", ColumnType::BigInteger))
            .field(FieldDefinition::scalar("Name", ColumnType::String))
            .field(FieldDefinition::scalar("Age", ColumnType::Integer))
            .field(FieldDefinition::scalar("CompanyId", ColumnType::BigInteger))
            .field(FieldDefinition::scalar("Password", ColumnType::String).ignored())
            .field(FieldDefinition::many::<Post>("Posts"))
            .field(FieldDefinition::many::<Language>("Languages").many2many("user_languages"))
            .field(FieldDefinition::nested::<Profile>("Profile"))
            .field(FieldDefinition::nested::<Company>("Company"))
    }
}

impl Record for User {
    fn field_value(&self, field: &str) -> Option<DatabaseValue> {
        match field {
            "Id" => Some(self.id.into()),
            "Name" => Some(self.name.as_str().into()),
            "Age" => Some(self.age.into()),
            "CompanyId" => Some(self.company_id.into()),
            _ => None,
        }
    }
}

impl FromRow for User {
    fn from_row(row: &dyn DatabaseRow) -> ModelResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            age: row.try_get("age")?.unwrap_or_default(),
            company_id: row.try_get("company_id")?.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub user_id: i64,
}

impl Schema for Post {
    fn definition() -> TypeDefinition {
        TypeDefinition::new("Post")
            .field(FieldDefinition::scalar("Id", ColumnType::BigInteger))
            .field(FieldDefinition::scalar("Title", ColumnType::String).size(100))
            .field(FieldDefinition::scalar("Body", ColumnType::String).sql_type("text"))
            .field(FieldDefinition::scalar("UserId", ColumnType::BigInteger))
            .field(FieldDefinition::many::<Comment>("Comments").polymorphic("Owner"))
            .field(FieldDefinition::nested::<User>("User"))
    }
}

impl Record for Post {
    fn field_value(&self, field: &str) -> Option<DatabaseValue> {
        match field {
            "Id" => Some(self.id.into()),
            "Title" => Some(self.title.as_str().into()),
            "UserId" => Some(self.user_id.into()),
            _ => None,
        }
    }
}

impl FromRow for Post {
    fn from_row(row: &dyn DatabaseRow) -> ModelResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            user_id: row.get("user_id")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Comment {
    pub id: i64,
    pub body: String,
}

impl Schema for Comment {
    fn definition() -> TypeDefinition {
        TypeDefinition::new("Comment")
            .field(FieldDefinition::scalar("Id", ColumnType::BigInteger))
            .field(FieldDefinition::scalar("Body", ColumnType::String))
            .field(FieldDefinition::scalar("OwnerId", ColumnType::BigInteger))
            .field(FieldDefinition::scalar("OwnerType", ColumnType::String))
    }
}

impl FromRow for Comment {
    fn from_row(row: &dyn DatabaseRow) -> ModelResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            body: row.get("body")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Language {
    pub id: i64,
    pub name: String,
}

impl Schema for Language {
    fn definition() -> TypeDefinition {
        TypeDefinition::new("Language")
            .field(FieldDefinition::scalar("Id", ColumnType::BigInteger))
            .field(FieldDefinition::scalar("Name", ColumnType::String))
    }
}

impl FromRow for Language {
    fn from_row(row: &dyn DatabaseRow) -> ModelResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    pub id: i64,
    pub bio: String,
}

impl Schema for Profile {
    fn definition() -> TypeDefinition {
        TypeDefinition::new("Profile")
            .field(FieldDefinition::scalar("Id", ColumnType::BigInteger))
            .field(FieldDefinition::scalar("UserId", ColumnType::BigInteger))
            .field(FieldDefinition::scalar("Bio", ColumnType::String))
    }
}

impl FromRow for Profile {
    fn from_row(row: &dyn DatabaseRow) -> ModelResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            bio: row.get("bio")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Company {
    pub id: i64,
    pub name: String,
}

impl Schema for Company {
    fn definition() -> TypeDefinition {
        TypeDefinition::new("Company")
            .field(FieldDefinition::scalar("Id", ColumnType::BigInteger))
            .field(FieldDefinition::scalar("Name", ColumnType::String))
            .field(FieldDefinition::many::<Tag>("Tags"))
    }
}

impl Record for Company {
    fn field_value(&self, field: &str) -> Option<DatabaseValue> {
        match field {
            "Id" => Some(self.id.into()),
            "Name" => Some(self.name.as_str().into()),
            _ => None,
        }
    }
}

impl FromRow for Company {
    fn from_row(row: &dyn DatabaseRow) -> ModelResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
        })
    }
}

/// Declares its company key as `CompanyID`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Member {
    pub id: i64,
    pub company_id: i64,
}

impl Schema for Member {
    fn definition() -> TypeDefinition {
        TypeDefinition::new("Member")
            .field(FieldDefinition::scalar("Id", ColumnType::BigInteger))
            .field(FieldDefinition::scalar("CompanyID", ColumnType::BigInteger))
            .field(FieldDefinition::nested::<Company>("Company"))
    }
}

impl Record for Member {
    fn field_value(&self, field: &str) -> Option<DatabaseValue> {
        match field {
            "Id" => Some(self.id.into()),
            "CompanyID" => Some(self.company_id.into()),
            _ => None,
        }
    }
}

/// Carries no `CompanyId`, so `Company.Tags` has no usable foreign key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tag {
    pub id: i64,
    pub label: String,
}

impl Schema for Tag {
    fn definition() -> TypeDefinition {
        TypeDefinition::new("Tag")
            .field(FieldDefinition::scalar("Id", ColumnType::BigInteger))
            .field(FieldDefinition::scalar("Label", ColumnType::String))
    }
}

impl FromRow for Tag {
    fn from_row(row: &dyn DatabaseRow) -> ModelResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            label: row.get("label")?,
        })
    }
}

/// Timestamps shared by embedding
pub struct Audit;

impl Schema for Audit {
    fn definition() -> TypeDefinition {
        TypeDefinition::new("Audit")
            .field(FieldDefinition::scalar("CreatedAt", ColumnType::Time))
            .field(FieldDefinition::scalar("UpdatedAt", ColumnType::Time))
            .field(FieldDefinition::scalar("DeletedAt", ColumnType::Time))
    }
}

/// Soft-deletable through its embedded `Audit`
pub struct Article;

impl Schema for Article {
    fn definition() -> TypeDefinition {
        TypeDefinition::new("Article")
            .field(FieldDefinition::scalar("Id", ColumnType::Integer))
            .field(FieldDefinition::anonymous::<Audit>("Audit"))
            .field(FieldDefinition::scalar("Title", ColumnType::String))
    }
}

/// Embedded identity carrying its own primary key
pub struct Identity;

impl Schema for Identity {
    fn definition() -> TypeDefinition {
        TypeDefinition::new("Identity")
            .field(FieldDefinition::scalar("Uid", ColumnType::Uuid).primary_key())
            .field(FieldDefinition::scalar("Version", ColumnType::Integer))
    }
}

pub struct Document;

impl Schema for Document {
    fn definition() -> TypeDefinition {
        TypeDefinition::new("Document")
            .field(FieldDefinition::nested::<Identity>("Meta").embedded())
            .field(FieldDefinition::scalar("Label", ColumnType::String))
    }
}

pub struct Revision;

impl Schema for Revision {
    fn definition() -> TypeDefinition {
        TypeDefinition::new("Revision")
            .field(FieldDefinition::nested::<Identity>("Meta").embedded())
            .field(FieldDefinition::scalar("Code", ColumnType::String).primary_key())
    }
}

/// Declared through `sql`/`gorm` style tag strings
pub struct Product;

impl Schema for Product {
    fn definition() -> TypeDefinition {
        TypeDefinition::new("Product")
            .table_name("inventory")
            .field(FieldDefinition::scalar("Code", ColumnType::String).tags("size:64", "primary_key"))
            .field(FieldDefinition::scalar("Name", ColumnType::String).tags("type:varchar(100);not null", ""))
            .field(FieldDefinition::scalar("Sku", ColumnType::String).tags("unique", "column:sku_code"))
            .field(FieldDefinition::scalar("Cache", ColumnType::Json).tags("-", ""))
    }
}

pub struct Category;

impl Schema for Category {
    fn definition() -> TypeDefinition {
        TypeDefinition::new("Category").field(FieldDefinition::scalar("Id", ColumnType::Integer))
    }
}

pub struct Address;

impl Schema for Address {
    fn definition() -> TypeDefinition {
        TypeDefinition::new("Address").field(FieldDefinition::scalar("Id", ColumnType::Integer))
    }
}

pub struct Day;

impl Schema for Day {
    fn definition() -> TypeDefinition {
        TypeDefinition::new("Day").field(FieldDefinition::scalar("Id", ColumnType::Integer))
    }
}

/// No column named `id` and no declared key
pub struct AuditLog;

impl Schema for AuditLog {
    fn definition() -> TypeDefinition {
        TypeDefinition::new("AuditLog")
            .field(FieldDefinition::scalar("Message", ColumnType::String))
            .field(FieldDefinition::many::<Tag>("Tags").many2many("audit_log_tags"))
    }
}
