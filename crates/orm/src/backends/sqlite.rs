//! SQLite dialect

use async_trait::async_trait;

use super::core::{DatabaseValue, Executor};
use super::dialect::{bounded_size, count_exists, ColumnType, Dialect};
use crate::error::OrmResult;

/// SQLite dialect
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

#[async_trait]
impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite3"
    }

    fn column_type(&self, column_type: ColumnType, size: usize) -> String {
        match column_type {
            ColumnType::Bool => "bool".to_string(),
            ColumnType::Integer => "integer".to_string(),
            ColumnType::BigInteger => "bigint".to_string(),
            ColumnType::Float => "real".to_string(),
            ColumnType::Decimal => "decimal".to_string(),
            ColumnType::String => match bounded_size(size, 65532) {
                Some(size) => format!("varchar({})", size),
                None => "text".to_string(),
            },
            ColumnType::Bytes => "blob".to_string(),
            ColumnType::Time => "datetime".to_string(),
            ColumnType::Uuid => "varchar(36)".to_string(),
            ColumnType::Json => "text".to_string(),
        }
    }

    fn primary_key_type(&self, column_type: ColumnType, size: usize) -> String {
        match column_type {
            ColumnType::Integer | ColumnType::BigInteger => {
                "integer primary key autoincrement".to_string()
            }
            other => format!("{} PRIMARY KEY", self.column_type(other, size)),
        }
    }

    async fn has_table(&self, executor: &dyn Executor, table: &str) -> OrmResult<bool> {
        count_exists(
            executor,
            "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
            &[DatabaseValue::from(table)],
        )
        .await
    }

    async fn has_column(&self, executor: &dyn Executor, table: &str, column: &str) -> OrmResult<bool> {
        count_exists(
            executor,
            "SELECT count(*) FROM pragma_table_info(?) WHERE name = ?",
            &[DatabaseValue::from(table), DatabaseValue::from(column)],
        )
        .await
    }
}
