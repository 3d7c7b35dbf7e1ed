//! Core Database Backend Traits
//!
//! This module defines the values, rows and executor interface the scope layer
//! hands statements to. Connection acquisition and transactions live behind
//! [`Executor`]; nothing in this crate opens a connection itself.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::{ModelError, OrmResult};

/// Statement execution collaborator
///
/// Errors returned here are propagated to callers unchanged.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Execute a statement and return the affected rows count
    async fn execute(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<u64>;

    /// Execute a query and return every result row
    async fn fetch_all(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Vec<Box<dyn DatabaseRow>>>;

    /// Execute a query and return the first result row
    async fn fetch_optional(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Option<Box<dyn DatabaseRow>>>;
}

/// Abstract database row trait
pub trait DatabaseRow: Send + Sync {
    /// Get a column value by index
    fn get_by_index(&self, index: usize) -> OrmResult<DatabaseValue>;

    /// Get a column value by name
    fn get_by_name(&self, name: &str) -> OrmResult<DatabaseValue>;

    /// Get column count
    fn column_count(&self) -> usize;

    /// Get column names
    fn column_names(&self) -> Vec<String>;

    /// Convert row to JSON value
    fn to_json(&self) -> OrmResult<JsonValue> {
        let mut map = serde_json::Map::new();
        for (index, name) in self.column_names().into_iter().enumerate() {
            map.insert(name, self.get_by_index(index)?.to_json());
        }
        Ok(JsonValue::Object(map))
    }

    /// Convert row to HashMap
    fn to_map(&self) -> OrmResult<HashMap<String, DatabaseValue>> {
        let mut map = HashMap::new();
        for (index, name) in self.column_names().into_iter().enumerate() {
            map.insert(name, self.get_by_index(index)?);
        }
        Ok(map)
    }
}

/// Extension trait for DatabaseRow to support typed column access
pub trait DatabaseRowExt {
    /// Get a typed value from a column
    fn get<T>(&self, column: &str) -> Result<T, ModelError>
    where
        T: for<'de> serde::Deserialize<'de>;

    /// Try to get an optional typed value from a column
    fn try_get<T>(&self, column: &str) -> Result<Option<T>, ModelError>
    where
        T: for<'de> serde::Deserialize<'de>;

    /// Get a typed value from a column position
    fn get_at<T>(&self, index: usize) -> Result<T, ModelError>
    where
        T: for<'de> serde::Deserialize<'de>;
}

impl<R: DatabaseRow + ?Sized> DatabaseRowExt for R {
    fn get<T>(&self, column: &str) -> Result<T, ModelError>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        let db_value = self.get_by_name(column)?;
        db_value.decode().map_err(|e| {
            ModelError::TypeMismatch(format!("column '{}': {}", column, e))
        })
    }

    fn try_get<T>(&self, column: &str) -> Result<Option<T>, ModelError>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        match self.get_by_name(column) {
            Ok(db_value) if db_value.is_null() => Ok(None),
            Ok(db_value) => db_value
                .decode()
                .map(Some)
                .map_err(|e| ModelError::TypeMismatch(format!("column '{}': {}", column, e))),
            Err(ModelError::ColumnNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn get_at<T>(&self, index: usize) -> Result<T, ModelError>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        let db_value = self.get_by_index(index)?;
        db_value.decode().map_err(|e| {
            ModelError::TypeMismatch(format!("column #{}: {}", index, e))
        })
    }
}

/// Capability of a value to produce its own storable representation
///
/// Arguments implementing this are converted right before they are bound.
pub trait Valuer: Send + Sync + std::fmt::Debug {
    fn value(&self) -> OrmResult<DatabaseValue>;
}

impl<T> Valuer for Option<T>
where
    T: Clone + Into<DatabaseValue> + Send + Sync + std::fmt::Debug,
{
    fn value(&self) -> OrmResult<DatabaseValue> {
        Ok(self.clone().map(Into::into).unwrap_or(DatabaseValue::Null))
    }
}

/// Database value enumeration for type-safe parameter binding
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseValue {
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    String(String),
    Bytes(Vec<u8>),
    Uuid(uuid::Uuid),
    DateTime(chrono::DateTime<chrono::Utc>),
    Date(chrono::NaiveDate),
    Time(chrono::NaiveTime),
    Json(JsonValue),
    /// Expands to one bind marker per element when used as a clause argument
    Array(Vec<DatabaseValue>),
}

impl DatabaseValue {
    /// Build an array value from any iterator of convertible items
    pub fn array<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<DatabaseValue>,
    {
        DatabaseValue::Array(items.into_iter().map(Into::into).collect())
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, DatabaseValue::Null)
    }

    /// Whether the value is its type's zero value
    pub fn is_blank(&self) -> bool {
        match self {
            DatabaseValue::Null => true,
            DatabaseValue::Bool(b) => !*b,
            DatabaseValue::Int32(i) => *i == 0,
            DatabaseValue::Int64(i) => *i == 0,
            DatabaseValue::Float32(f) => *f == 0.0,
            DatabaseValue::Float64(f) => *f == 0.0,
            DatabaseValue::String(s) => s.is_empty(),
            DatabaseValue::Bytes(b) => b.is_empty(),
            DatabaseValue::Uuid(u) => u.is_nil(),
            DatabaseValue::DateTime(_) | DatabaseValue::Date(_) | DatabaseValue::Time(_) => false,
            DatabaseValue::Json(j) => j.is_null(),
            DatabaseValue::Array(a) => a.is_empty(),
        }
    }

    /// Decode into a concrete Rust type through its JSON form
    pub fn decode<T>(&self) -> Result<T, serde_json::Error>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        serde_json::from_value(self.to_json())
    }

    /// Convert to JSON value
    pub fn to_json(&self) -> JsonValue {
        match self {
            DatabaseValue::Null => JsonValue::Null,
            DatabaseValue::Bool(b) => JsonValue::Bool(*b),
            DatabaseValue::Int32(i) => JsonValue::Number(serde_json::Number::from(*i)),
            DatabaseValue::Int64(i) => JsonValue::Number(serde_json::Number::from(*i)),
            DatabaseValue::Float32(f) => serde_json::Number::from_f64(*f as f64)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            DatabaseValue::Float64(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            DatabaseValue::String(s) => JsonValue::String(s.clone()),
            DatabaseValue::Bytes(b) => JsonValue::Array(b.iter().map(|&x| JsonValue::Number(serde_json::Number::from(x))).collect()),
            DatabaseValue::Uuid(u) => JsonValue::String(u.to_string()),
            DatabaseValue::DateTime(dt) => JsonValue::String(dt.to_rfc3339()),
            DatabaseValue::Date(d) => JsonValue::String(d.to_string()),
            DatabaseValue::Time(t) => JsonValue::String(t.to_string()),
            DatabaseValue::Json(j) => j.clone(),
            DatabaseValue::Array(arr) => JsonValue::Array(arr.iter().map(|v| v.to_json()).collect()),
        }
    }

    /// Create DatabaseValue from JSON value
    pub fn from_json(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => DatabaseValue::Null,
            JsonValue::Bool(b) => DatabaseValue::Bool(b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    DatabaseValue::Int64(i)
                } else if let Some(f) = n.as_f64() {
                    DatabaseValue::Float64(f)
                } else {
                    DatabaseValue::Null
                }
            }
            JsonValue::String(s) => DatabaseValue::String(s),
            JsonValue::Array(arr) => DatabaseValue::Array(arr.into_iter().map(DatabaseValue::from_json).collect()),
            JsonValue::Object(_) => DatabaseValue::Json(json),
        }
    }
}

impl std::fmt::Display for DatabaseValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseValue::Null => write!(f, "NULL"),
            DatabaseValue::String(s) => write!(f, "{}", s),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<bool> for DatabaseValue {
    fn from(value: bool) -> Self {
        DatabaseValue::Bool(value)
    }
}

impl From<i8> for DatabaseValue {
    fn from(value: i8) -> Self {
        DatabaseValue::Int32(value as i32)
    }
}

impl From<i16> for DatabaseValue {
    fn from(value: i16) -> Self {
        DatabaseValue::Int32(value as i32)
    }
}

impl From<i32> for DatabaseValue {
    fn from(value: i32) -> Self {
        DatabaseValue::Int32(value)
    }
}

impl From<i64> for DatabaseValue {
    fn from(value: i64) -> Self {
        DatabaseValue::Int64(value)
    }
}

impl From<u16> for DatabaseValue {
    fn from(value: u16) -> Self {
        DatabaseValue::Int32(value as i32)
    }
}

impl From<u32> for DatabaseValue {
    fn from(value: u32) -> Self {
        DatabaseValue::Int64(value as i64)
    }
}

impl From<f32> for DatabaseValue {
    fn from(value: f32) -> Self {
        DatabaseValue::Float32(value)
    }
}

impl From<f64> for DatabaseValue {
    fn from(value: f64) -> Self {
        DatabaseValue::Float64(value)
    }
}

impl From<String> for DatabaseValue {
    fn from(value: String) -> Self {
        DatabaseValue::String(value)
    }
}

impl From<&str> for DatabaseValue {
    fn from(value: &str) -> Self {
        DatabaseValue::String(value.to_string())
    }
}

impl From<Vec<u8>> for DatabaseValue {
    fn from(value: Vec<u8>) -> Self {
        DatabaseValue::Bytes(value)
    }
}

impl From<uuid::Uuid> for DatabaseValue {
    fn from(value: uuid::Uuid) -> Self {
        DatabaseValue::Uuid(value)
    }
}

impl From<chrono::DateTime<chrono::Utc>> for DatabaseValue {
    fn from(value: chrono::DateTime<chrono::Utc>) -> Self {
        DatabaseValue::DateTime(value)
    }
}

impl From<chrono::NaiveDate> for DatabaseValue {
    fn from(value: chrono::NaiveDate) -> Self {
        DatabaseValue::Date(value)
    }
}

impl From<chrono::NaiveTime> for DatabaseValue {
    fn from(value: chrono::NaiveTime) -> Self {
        DatabaseValue::Time(value)
    }
}

impl From<JsonValue> for DatabaseValue {
    fn from(value: JsonValue) -> Self {
        DatabaseValue::Json(value)
    }
}

impl<T> From<Option<T>> for DatabaseValue
where
    T: Into<DatabaseValue>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => DatabaseValue::Null,
        }
    }
}
