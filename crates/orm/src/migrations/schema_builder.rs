//! Schema Builder - DDL statements for described tables
//!
//! Every method returns one statement; nothing here touches a database.

use crate::backends::Dialect;
use crate::schema::TableDescriptor;

/// Builds DDL statements quoted for one dialect
pub struct DdlBuilder<'a> {
    dialect: &'a dyn Dialect,
}

impl<'a> DdlBuilder<'a> {
    pub fn new(dialect: &'a dyn Dialect) -> Self {
        Self { dialect }
    }

    fn quote(&self, name: &str) -> String {
        self.dialect.quote(name)
    }

    /// CREATE TABLE with every normal column of the descriptor
    pub fn create_table(&self, table: &TableDescriptor) -> String {
        let mut builder = TableBuilder::new(self.quote(&table.table_name));
        for field in table.normal_fields() {
            builder.column(&self.quote(&field.db_name), &field.sql_tag);
        }
        builder.to_sql()
    }

    /// CREATE TABLE for a many-to-many join table
    pub fn create_join_table(
        &self,
        join_table: &str,
        foreign_key: &str,
        association_foreign_key: &str,
        key_type: &str,
    ) -> String {
        let mut builder = TableBuilder::new(self.quote(join_table));
        builder.column(&self.quote(foreign_key), key_type);
        builder.column(&self.quote(association_foreign_key), key_type);
        builder.to_sql()
    }

    /// Drop a table
    pub fn drop_table(&self, table_name: &str, if_exists: bool) -> String {
        if if_exists {
            format!("DROP TABLE IF EXISTS {}", self.quote(table_name))
        } else {
            format!("DROP TABLE {}", self.quote(table_name))
        }
    }

    /// Add a column to existing table
    pub fn add_column(&self, table_name: &str, column_name: &str, column_type: &str) -> String {
        format!(
            "ALTER TABLE {} ADD {} {}",
            self.quote(table_name),
            self.quote(column_name),
            column_type
        )
    }

    /// Change the type of a column
    pub fn modify_column(&self, table_name: &str, column_name: &str, column_type: &str) -> String {
        format!(
            "ALTER TABLE {} MODIFY {} {}",
            self.quote(table_name),
            self.quote(column_name),
            column_type
        )
    }

    /// Drop a column from existing table
    pub fn drop_column(&self, table_name: &str, column_name: &str) -> String {
        format!(
            "ALTER TABLE {} DROP COLUMN {}",
            self.quote(table_name),
            self.quote(column_name)
        )
    }

    /// Create an index
    pub fn create_index(
        &self,
        table_name: &str,
        index_name: &str,
        column_names: &[&str],
        unique: bool,
    ) -> String {
        let columns: Vec<String> = column_names.iter().map(|c| self.quote(c)).collect();
        format!(
            "{} {} ON {}({})",
            if unique { "CREATE UNIQUE INDEX" } else { "CREATE INDEX" },
            self.quote(index_name),
            self.quote(table_name),
            columns.join(", ")
        )
    }

    /// Add a foreign key constraint named `<table>_<field>_foreign`
    ///
    /// `dest` is written as given, e.g. `users(id)`.
    pub fn add_foreign_key(
        &self,
        table_name: &str,
        field: &str,
        dest: &str,
        on_delete: &str,
        on_update: &str,
    ) -> String {
        format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ON DELETE {} ON UPDATE {}",
            self.quote(table_name),
            self.quote(&format!("{}_{}_foreign", table_name, field)),
            self.quote(field),
            dest,
            on_delete,
            on_update
        )
    }
}

/// Table builder for CREATE TABLE statements
pub struct TableBuilder {
    table_name: String,
    columns: Vec<String>,
}

impl TableBuilder {
    /// Start a table; the name is used as given
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            columns: Vec::new(),
        }
    }

    /// Add a column
    pub fn column(&mut self, name: &str, column_type: &str) -> &mut Self {
        self.columns.push(format!("{} {}", name, column_type));
        self
    }

    /// Build the CREATE TABLE SQL
    pub fn to_sql(&self) -> String {
        format!("CREATE TABLE {} ({})", self.table_name, self.columns.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{MysqlDialect, PostgresDialect};

    #[test]
    fn test_table_builder() {
        let mut table = TableBuilder::new("\"posts\"");
        table.column("\"id\"", "serial PRIMARY KEY");
        table.column("\"title\"", "varchar(255)");

        assert_eq!(
            table.to_sql(),
            "CREATE TABLE \"posts\" (\"id\" serial PRIMARY KEY,\"title\" varchar(255))"
        );
    }

    #[test]
    fn test_alter_statements() {
        let ddl = DdlBuilder::new(&PostgresDialect);

        assert_eq!(
            ddl.add_column("users", "age", "integer"),
            "ALTER TABLE \"users\" ADD \"age\" integer"
        );
        assert_eq!(
            ddl.drop_column("users", "age"),
            "ALTER TABLE \"users\" DROP COLUMN \"age\""
        );
        assert_eq!(ddl.drop_table("users", true), "DROP TABLE IF EXISTS \"users\"");
        assert_eq!(ddl.drop_table("users", false), "DROP TABLE \"users\"");
    }

    #[test]
    fn test_index_and_foreign_key() {
        let ddl = DdlBuilder::new(&MysqlDialect);

        assert_eq!(
            ddl.create_index("users", "idx_users_email", &["email", "name"], true),
            "CREATE UNIQUE INDEX `idx_users_email` ON `users`(`email`, `name`)"
        );
        assert_eq!(
            ddl.add_foreign_key("posts", "user_id", "users(id)", "CASCADE", "RESTRICT"),
            "ALTER TABLE `posts` ADD CONSTRAINT `posts_user_id_foreign` FOREIGN KEY (`user_id`) REFERENCES users(id) ON DELETE CASCADE ON UPDATE RESTRICT"
        );
    }
}
