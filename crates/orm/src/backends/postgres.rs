//! PostgreSQL Backend Implementation
//!
//! This module provides the PostgreSQL dialect and an [`Executor`] over a
//! sqlx connection pool.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::{Column, Pool, Postgres, Row as SqlxRow};

use super::core::*;
use super::dialect::{bounded_size, count_exists, ColumnType, Dialect};
use crate::error::{OrmError, OrmResult};

/// PostgreSQL dialect
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

#[async_trait]
impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn bind_var(&self, index: usize) -> String {
        format!("${}", index)
    }

    fn column_type(&self, column_type: ColumnType, size: usize) -> String {
        match column_type {
            ColumnType::Bool => "boolean".to_string(),
            ColumnType::Integer => "integer".to_string(),
            ColumnType::BigInteger => "bigint".to_string(),
            ColumnType::Float => "numeric".to_string(),
            ColumnType::Decimal => "numeric".to_string(),
            ColumnType::String => match bounded_size(size, 65532) {
                Some(size) => format!("varchar({})", size),
                None => "text".to_string(),
            },
            ColumnType::Bytes => "bytea".to_string(),
            ColumnType::Time => "timestamp with time zone".to_string(),
            ColumnType::Uuid => "uuid".to_string(),
            ColumnType::Json => "jsonb".to_string(),
        }
    }

    fn primary_key_type(&self, column_type: ColumnType, size: usize) -> String {
        match column_type {
            ColumnType::Integer => "serial PRIMARY KEY".to_string(),
            ColumnType::BigInteger => "bigserial PRIMARY KEY".to_string(),
            other => format!("{} PRIMARY KEY", self.column_type(other, size)),
        }
    }

    async fn has_table(&self, executor: &dyn Executor, table: &str) -> OrmResult<bool> {
        count_exists(
            executor,
            "SELECT count(*) FROM INFORMATION_SCHEMA.tables WHERE table_name = $1 AND table_type = 'BASE TABLE'",
            &[DatabaseValue::from(table)],
        )
        .await
    }

    async fn has_column(&self, executor: &dyn Executor, table: &str, column: &str) -> OrmResult<bool> {
        count_exists(
            executor,
            "SELECT count(*) FROM INFORMATION_SCHEMA.columns WHERE table_name = $1 AND column_name = $2",
            &[DatabaseValue::from(table), DatabaseValue::from(column)],
        )
        .await
    }
}

/// Executor backed by a sqlx PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PostgresExecutor {
    pool: Arc<Pool<Postgres>>,
}

impl PostgresExecutor {
    pub fn new(pool: Arc<Pool<Postgres>>) -> Self {
        Self { pool }
    }

    /// Get the underlying pool
    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

#[async_trait]
impl Executor for PostgresExecutor {
    async fn execute(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<u64> {
        let mut query = sqlx::query(sql);

        for param in params {
            query = bind_database_value(query, param)?;
        }

        let result = query.execute(&*self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn fetch_all(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Vec<Box<dyn DatabaseRow>>> {
        let mut query = sqlx::query(sql);

        for param in params {
            query = bind_database_value(query, param)?;
        }

        let rows = query.fetch_all(&*self.pool).await?;
        Ok(rows.into_iter().map(|row| Box::new(PostgresRow::new(row)) as Box<dyn DatabaseRow>).collect())
    }

    async fn fetch_optional(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Option<Box<dyn DatabaseRow>>> {
        let mut query = sqlx::query(sql);

        for param in params {
            query = bind_database_value(query, param)?;
        }

        let row = query.fetch_optional(&*self.pool).await?;
        Ok(row.map(|r| Box::new(PostgresRow::new(r)) as Box<dyn DatabaseRow>))
    }
}

/// PostgreSQL row implementation
pub struct PostgresRow {
    row: sqlx::postgres::PgRow,
}

impl PostgresRow {
    pub fn new(row: sqlx::postgres::PgRow) -> Self {
        Self { row }
    }
}

impl DatabaseRow for PostgresRow {
    fn get_by_index(&self, index: usize) -> OrmResult<DatabaseValue> {
        if index >= self.row.len() {
            return Err(OrmError::ColumnNotFound(format!("#{}", index)));
        }
        postgres_value_to_database_value(&self.row, index)
    }

    fn get_by_name(&self, name: &str) -> OrmResult<DatabaseValue> {
        let index = self
            .row
            .columns()
            .iter()
            .position(|col| col.name() == name)
            .ok_or_else(|| OrmError::ColumnNotFound(name.to_string()))?;

        postgres_value_to_database_value(&self.row, index)
    }

    fn column_count(&self) -> usize {
        self.row.len()
    }

    fn column_names(&self) -> Vec<String> {
        self.row.columns().iter().map(|col| col.name().to_string()).collect()
    }
}

/// Bind a DatabaseValue to a sqlx query
fn bind_database_value<'a>(
    query: sqlx::query::Query<'a, Postgres, sqlx::postgres::PgArguments>,
    value: &DatabaseValue,
) -> OrmResult<sqlx::query::Query<'a, Postgres, sqlx::postgres::PgArguments>> {
    match value {
        DatabaseValue::Null => Ok(query.bind(Option::<String>::None)),
        DatabaseValue::Bool(b) => Ok(query.bind(*b)),
        DatabaseValue::Int32(i) => Ok(query.bind(*i)),
        DatabaseValue::Int64(i) => Ok(query.bind(*i)),
        DatabaseValue::Float32(f) => Ok(query.bind(*f)),
        DatabaseValue::Float64(f) => Ok(query.bind(*f)),
        DatabaseValue::String(s) => Ok(query.bind(s.clone())),
        DatabaseValue::Bytes(b) => Ok(query.bind(b.clone())),
        DatabaseValue::Uuid(u) => Ok(query.bind(*u)),
        DatabaseValue::DateTime(dt) => Ok(query.bind(*dt)),
        DatabaseValue::Date(d) => Ok(query.bind(*d)),
        DatabaseValue::Time(t) => Ok(query.bind(*t)),
        DatabaseValue::Json(j) => Ok(query.bind(j.clone())),
        // Arrays are expanded into individual markers while rendering
        DatabaseValue::Array(_) => Err(OrmError::TypeMismatch(
            "array values must be expanded before binding".to_string(),
        )),
    }
}

/// Convert a PostgreSQL column value to DatabaseValue
fn postgres_value_to_database_value(row: &sqlx::postgres::PgRow, index: usize) -> OrmResult<DatabaseValue> {
    use sqlx::{TypeInfo, ValueRef};

    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(DatabaseValue::Null);
    }

    let type_name = row.columns()[index].type_info().name().to_string();

    let value = match type_name.as_str() {
        "BOOL" => DatabaseValue::Bool(row.try_get(index)?),
        "INT2" => DatabaseValue::Int32(row.try_get::<i16, _>(index)? as i32),
        "INT4" => DatabaseValue::Int32(row.try_get(index)?),
        "INT8" => DatabaseValue::Int64(row.try_get(index)?),
        "FLOAT4" => DatabaseValue::Float32(row.try_get(index)?),
        "FLOAT8" => DatabaseValue::Float64(row.try_get(index)?),
        "BYTEA" => DatabaseValue::Bytes(row.try_get(index)?),
        "UUID" => DatabaseValue::Uuid(row.try_get(index)?),
        "TIMESTAMPTZ" => DatabaseValue::DateTime(row.try_get(index)?),
        "TIMESTAMP" => {
            let naive: chrono::NaiveDateTime = row.try_get(index)?;
            DatabaseValue::DateTime(naive.and_utc())
        }
        "DATE" => DatabaseValue::Date(row.try_get(index)?),
        "TIME" => DatabaseValue::Time(row.try_get(index)?),
        "JSON" | "JSONB" => DatabaseValue::Json(row.try_get::<JsonValue, _>(index)?),
        _ => DatabaseValue::String(row.try_get(index).map_err(|e| {
            OrmError::TypeMismatch(format!(
                "Failed to read column of type '{}' as text: {}",
                type_name, e
            ))
        })?),
    };

    Ok(value)
}
