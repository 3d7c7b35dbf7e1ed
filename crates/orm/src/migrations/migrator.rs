//! Migrator - applies descriptor-driven DDL through an executor
//!
//! Each operation issues its statements one at a time. There is no
//! transaction around them: the first failing statement ends the operation
//! and its error is returned unchanged, earlier statements stay applied.

use std::sync::Arc;

use tracing::{debug, info};

use super::schema_builder::DdlBuilder;
use crate::backends::{Dialect, Executor};
use crate::error::{ModelError, OrmResult, RelationshipError};
use crate::schema::{ColumnDescriptor, FieldKind, Schema, SchemaRegistry, TableDescriptor};

/// Schema migration operations for described types
pub struct Migrator<'a> {
    registry: &'a SchemaRegistry,
    executor: &'a dyn Executor,
}

impl<'a> Migrator<'a> {
    pub fn new(registry: &'a SchemaRegistry, executor: &'a dyn Executor) -> Self {
        Self { registry, executor }
    }

    fn dialect(&self) -> &'a dyn Dialect {
        self.registry.dialect().as_ref()
    }

    fn ddl(&self) -> DdlBuilder<'a> {
        DdlBuilder::new(self.dialect())
    }

    async fn exec(&self, sql: String) -> OrmResult<()> {
        debug!("Executing DDL: {}", sql);
        self.executor.execute(&sql, &[]).await.map(|_| ())
    }

    /// Create the table of `T` and its missing join tables
    pub async fn create_table<T: Schema>(&self) -> OrmResult<()> {
        let table = self.registry.describe::<T>();
        self.exec(self.ddl().create_table(&table)).await?;
        self.create_join_tables(&table).await
    }

    pub async fn drop_table<T: Schema>(&self) -> OrmResult<()> {
        let table = self.registry.describe::<T>();
        self.exec(self.ddl().drop_table(&table.table_name, false)).await
    }

    pub async fn drop_table_if_exists<T: Schema>(&self) -> OrmResult<()> {
        let table = self.registry.describe::<T>();
        self.exec(self.ddl().drop_table(&table.table_name, true)).await
    }

    /// Add the column of a declared field
    pub async fn add_column<T: Schema>(&self, field: &str) -> OrmResult<()> {
        let table = self.registry.describe::<T>();
        let column = table
            .field(field)
            .filter(|column| column.is_column())
            .ok_or_else(|| ModelError::ColumnNotFound(field.to_string()))?;

        self.exec(
            self.ddl()
                .add_column(&table.table_name, &column.db_name, &column.sql_tag),
        )
        .await
    }

    pub async fn modify_column<T: Schema>(&self, column: &str, column_type: &str) -> OrmResult<()> {
        let table = self.registry.describe::<T>();
        self.exec(self.ddl().modify_column(&table.table_name, column, column_type))
            .await
    }

    pub async fn drop_column<T: Schema>(&self, column: &str) -> OrmResult<()> {
        let table = self.registry.describe::<T>();
        self.exec(self.ddl().drop_column(&table.table_name, column)).await
    }

    pub async fn add_index<T: Schema>(&self, unique: bool, index_name: &str, columns: &[&str]) -> OrmResult<()> {
        if columns.is_empty() {
            return Err(ModelError::Migration(format!(
                "index '{}' needs at least one column",
                index_name
            )));
        }

        let table = self.registry.describe::<T>();
        self.exec(
            self.ddl()
                .create_index(&table.table_name, index_name, columns, unique),
        )
        .await
    }

    pub async fn remove_index<T: Schema>(&self, index_name: &str) -> OrmResult<()> {
        let table = self.registry.describe::<T>();
        debug!("Removing index {} from {}", index_name, table.table_name);
        self.dialect()
            .remove_index(self.executor, &table.table_name, index_name)
            .await
    }

    pub async fn add_foreign_key<T: Schema>(
        &self,
        field: &str,
        dest: &str,
        on_delete: &str,
        on_update: &str,
    ) -> OrmResult<()> {
        let table = self.registry.describe::<T>();
        self.exec(
            self.ddl()
                .add_foreign_key(&table.table_name, field, dest, on_delete, on_update),
        )
        .await
    }

    /// Create the join table of a many-to-many field unless it exists
    pub async fn create_join_table_if_missing<T: Schema>(&self, field: &str) -> OrmResult<()> {
        let table = self.registry.describe::<T>();
        let column = table
            .relationship_fields()
            .find(|column| column.name == field)
            .ok_or_else(|| RelationshipError::UnknownField(field.to_string()))?;

        self.create_join_table(&table, column).await
    }

    /// Create the table when absent, otherwise add missing columns and join tables
    pub async fn auto_migrate<T: Schema>(&self) -> OrmResult<()> {
        let table = self.registry.describe::<T>();

        if !self.dialect().has_table(self.executor, &table.table_name).await? {
            info!("Creating table {}", table.table_name);
            self.exec(self.ddl().create_table(&table)).await?;
            return self.create_join_tables(&table).await;
        }

        for column in table.normal_fields() {
            if !self
                .dialect()
                .has_column(self.executor, &table.table_name, &column.db_name)
                .await?
            {
                info!("Adding column {}.{}", table.table_name, column.db_name);
                self.exec(
                    self.ddl()
                        .add_column(&table.table_name, &column.db_name, &column.sql_tag),
                )
                .await?;
            }
        }

        self.create_join_tables(&table).await
    }

    async fn create_join_tables(&self, table: &Arc<TableDescriptor>) -> OrmResult<()> {
        for column in table.relationship_fields() {
            self.create_join_table(table, column).await?;
        }
        Ok(())
    }

    async fn create_join_table(&self, table: &TableDescriptor, column: &ColumnDescriptor) -> OrmResult<()> {
        let Some(relationship) = column.relationship.as_ref() else {
            return Ok(());
        };
        let Some(join_table) = relationship.join_table() else {
            return Ok(());
        };

        if self.dialect().has_table(self.executor, join_table).await? {
            return Ok(());
        }

        let key_type = match table.primary_key_field().map(|pk| &pk.kind) {
            Some(FieldKind::Scalar(column_type)) | Some(FieldKind::Scanner(column_type)) => self
                .dialect()
                .column_type(*column_type, self.registry.config().default_string_size),
            _ => return Err(ModelError::MissingPrimaryKey),
        };

        info!("Creating join table {} for {}.{}", join_table, table.type_name, column.name);
        self.exec(self.ddl().create_join_table(
            join_table,
            &relationship.foreign_key.column,
            &relationship.association_foreign_key.column,
            &key_type,
        ))
        .await
    }
}
