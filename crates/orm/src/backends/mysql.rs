//! MySQL dialect

use async_trait::async_trait;

use super::core::{DatabaseValue, Executor};
use super::dialect::{bounded_size, count_exists, ColumnType, Dialect};
use crate::error::OrmResult;

/// MySQL / MariaDB dialect
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlDialect;

#[async_trait]
impl Dialect for MysqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote(&self, key: &str) -> String {
        format!("`{}`", key.replace('`', "``"))
    }

    fn column_type(&self, column_type: ColumnType, size: usize) -> String {
        match column_type {
            ColumnType::Bool => "boolean".to_string(),
            ColumnType::Integer => "int".to_string(),
            ColumnType::BigInteger => "bigint".to_string(),
            ColumnType::Float => "double".to_string(),
            ColumnType::Decimal => "decimal(65,30)".to_string(),
            ColumnType::String => match bounded_size(size, 65532) {
                Some(size) => format!("varchar({})", size),
                None => "longtext".to_string(),
            },
            ColumnType::Bytes => match bounded_size(size, 65532) {
                Some(size) => format!("varbinary({})", size),
                None => "longblob".to_string(),
            },
            ColumnType::Time => "timestamp NULL".to_string(),
            ColumnType::Uuid => "char(36)".to_string(),
            ColumnType::Json => "json".to_string(),
        }
    }

    fn primary_key_type(&self, column_type: ColumnType, size: usize) -> String {
        match column_type {
            ColumnType::Integer => "int NOT NULL AUTO_INCREMENT PRIMARY KEY".to_string(),
            ColumnType::BigInteger => "bigint NOT NULL AUTO_INCREMENT PRIMARY KEY".to_string(),
            other => format!("{} PRIMARY KEY", self.column_type(other, size)),
        }
    }

    async fn has_table(&self, executor: &dyn Executor, table: &str) -> OrmResult<bool> {
        count_exists(
            executor,
            "SELECT count(*) FROM INFORMATION_SCHEMA.tables WHERE table_schema = DATABASE() AND table_name = ?",
            &[DatabaseValue::from(table)],
        )
        .await
    }

    async fn has_column(&self, executor: &dyn Executor, table: &str, column: &str) -> OrmResult<bool> {
        count_exists(
            executor,
            "SELECT count(*) FROM INFORMATION_SCHEMA.columns WHERE table_schema = DATABASE() AND table_name = ? AND column_name = ?",
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mysql_types() {
        let dialect = MysqlDialect;
        assert_eq!(dialect.column_type(ColumnType::String, 255), "varchar(255)");
        assert_eq!(dialect.column_type(ColumnType::String, 70000), "longtext");
        assert_eq!(
            dialect.primary_key_type(ColumnType::BigInteger, 255),
            "bigint NOT NULL AUTO_INCREMENT PRIMARY KEY"
        );
        assert_eq!(dialect.quote("order"), "`order`");
        assert_eq!(dialect.bind_var(3), "?");
    }
}
