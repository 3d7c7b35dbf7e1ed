//! SQL dialect capability interface
//!
//! A dialect quotes identifiers, renders bind markers, maps declared column
//! types to DDL types and answers catalogue questions (does a table or column
//! exist) by issuing its own queries through an [`Executor`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::core::{DatabaseRowExt, DatabaseValue, Executor};
use crate::error::OrmResult;

/// Storable type of a plain column, used to pick a DDL type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    Bool,
    /// 8 to 32 bit integers
    Integer,
    /// 64 bit integers
    BigInteger,
    Float,
    String,
    Bytes,
    Time,
    Uuid,
    Json,
    Decimal,
}

/// Database specific SQL rendering and catalogue inspection
#[async_trait]
pub trait Dialect: Send + Sync + std::fmt::Debug {
    /// Short dialect name
    fn name(&self) -> &'static str;

    /// Bind marker for the `index`-th bound value (1-based)
    fn bind_var(&self, _index: usize) -> String {
        "?".to_string()
    }

    /// Quote an identifier
    fn quote(&self, key: &str) -> String {
        format!("\"{}\"", key.replace('"', "\"\""))
    }

    /// DDL type for a plain column
    fn column_type(&self, column_type: ColumnType, size: usize) -> String;

    /// DDL type for a primary key column
    fn primary_key_type(&self, column_type: ColumnType, size: usize) -> String;

    /// Whether row limiting uses `TOP`/`OFFSET ... FETCH` instead of `LIMIT`/`OFFSET`
    fn has_top(&self) -> bool {
        false
    }

    /// Check whether a table exists
    async fn has_table(&self, executor: &dyn Executor, table: &str) -> OrmResult<bool>;

    /// Check whether a column exists on a table
    async fn has_column(&self, executor: &dyn Executor, table: &str, column: &str) -> OrmResult<bool>;

    /// Drop an index from a table
    async fn remove_index(&self, executor: &dyn Executor, table: &str, index_name: &str) -> OrmResult<()> {
        let _ = table;
        executor
            .execute(&format!("DROP INDEX {}", self.quote(index_name)), &[])
            .await
            .map(|_| ())
    }
}

/// Run a `SELECT count(*)` style catalogue query and report whether it found anything
pub(crate) async fn count_exists(
    executor: &dyn Executor,
    sql: &str,
    params: &[DatabaseValue],
) -> OrmResult<bool> {
    let row = executor.fetch_optional(sql, params).await?;
    match row {
        Some(row) => {
            let count: i64 = row.get_at(0)?;
            Ok(count > 0)
        }
        None => Ok(false),
    }
}

/// Size of a string column, where a zero or out of range size means unbounded
pub(crate) fn bounded_size(size: usize, max: usize) -> Option<usize> {
    if size > 0 && size < max {
        Some(size)
    } else {
        None
    }
}
