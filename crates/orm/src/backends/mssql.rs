//! SQL Server dialect
//!
//! The only bundled dialect limiting rows with `TOP(n)` and
//! `OFFSET n ROW FETCH NEXT m ROWS ONLY`.

use async_trait::async_trait;

use super::core::{DatabaseValue, Executor};
use super::dialect::{bounded_size, count_exists, ColumnType, Dialect};
use crate::error::OrmResult;

/// Microsoft SQL Server dialect
#[derive(Debug, Clone, Copy, Default)]
pub struct MssqlDialect;

#[async_trait]
impl Dialect for MssqlDialect {
    fn name(&self) -> &'static str {
        "mssql"
    }

    fn quote(&self, key: &str) -> String {
        format!("[{}]", key.replace(']', "]]"))
    }

    fn column_type(&self, column_type: ColumnType, size: usize) -> String {
        match column_type {
            ColumnType::Bool => "bit".to_string(),
            ColumnType::Integer => "int".to_string(),
            ColumnType::BigInteger => "bigint".to_string(),
            ColumnType::Float => "float".to_string(),
            ColumnType::Decimal => "decimal(38,10)".to_string(),
            ColumnType::String => match bounded_size(size, 8000) {
                Some(size) => format!("nvarchar({})", size),
                None => "text".to_string(),
            },
            ColumnType::Bytes => match bounded_size(size, 8000) {
                Some(size) => format!("varbinary({})", size),
                None => "varbinary(max)".to_string(),
            },
            ColumnType::Time => "datetime2".to_string(),
            ColumnType::Uuid => "uniqueidentifier".to_string(),
            ColumnType::Json => "nvarchar(max)".to_string(),
        }
    }

    fn primary_key_type(&self, column_type: ColumnType, size: usize) -> String {
        match column_type {
            ColumnType::Integer => "int IDENTITY(1,1) PRIMARY KEY".to_string(),
            ColumnType::BigInteger => "bigint IDENTITY(1,1) PRIMARY KEY".to_string(),
            other => format!("{} PRIMARY KEY", self.column_type(other, size)),
        }
    }

    fn has_top(&self) -> bool {
        true
    }

    async fn has_table(&self, executor: &dyn Executor, table: &str) -> OrmResult<bool> {
        count_exists(
            executor,
            "SELECT count(*) FROM INFORMATION_SCHEMA.tables WHERE table_name = ? AND table_catalog = DB_NAME()",
            &[DatabaseValue::from(table)],
        )
        .await
    }

    async fn has_column(&self, executor: &dyn Executor, table: &str, column: &str) -> OrmResult<bool> {
        count_exists(
            executor,
            "SELECT count(*) FROM INFORMATION_SCHEMA.columns WHERE table_name = ? AND column_name = ? AND table_catalog = DB_NAME()",
            &[DatabaseValue::from(table), DatabaseValue::from(column)],
        )
        .await
    }

    async fn remove_index(&self, executor: &dyn Executor, table: &str, index_name: &str) -> OrmResult<()> {
        executor
            .execute(
                &format!("DROP INDEX {} ON {}", self.quote(index_name), self.quote(table)),
                &[],
            )
            .await
            .map(|_| ())
    }
}
