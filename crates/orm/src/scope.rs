//! Scope - working state of one query operation
//!
//! A scope pairs a [`Search`] with the descriptor of the queried type and,
//! optionally, the record the operation targets. It renders the statement,
//! hands it to an [`Executor`] and keeps the first error it meets: once the
//! error slot is filled every later step returns that error without running.

use std::sync::Arc;

use tracing::debug;

use crate::backends::{DatabaseRow, DatabaseRowExt, DatabaseValue, Dialect, Executor};
use crate::error::{ModelError, OrmResult};
use crate::query::{Search, SqlRenderer};
use crate::schema::{DynRecord, FromRow, Schema, SchemaRegistry, TableDescriptor, TypeRef};

/// Destination for the rows of a query
pub trait ScanTarget: Send {
    type Item: Schema + FromRow;

    /// Whether only the first row is wanted
    const SINGLE: bool;

    fn fill(&mut self, rows: Vec<Box<dyn DatabaseRow>>) -> OrmResult<()>;
}

impl<T: Schema + FromRow> ScanTarget for Vec<T> {
    type Item = T;
    const SINGLE: bool = false;

    fn fill(&mut self, rows: Vec<Box<dyn DatabaseRow>>) -> OrmResult<()> {
        let items = rows
            .iter()
            .map(|row| T::from_row(row.as_ref()))
            .collect::<OrmResult<Vec<_>>>()?;
        self.extend(items);
        Ok(())
    }
}

impl<T: Schema + FromRow> ScanTarget for Option<T> {
    type Item = T;
    const SINGLE: bool = true;

    fn fill(&mut self, rows: Vec<Box<dyn DatabaseRow>>) -> OrmResult<()> {
        *self = match rows.first() {
            Some(row) => Some(T::from_row(row.as_ref())?),
            None => None,
        };
        Ok(())
    }
}

/// Per-operation working state
pub struct Scope<'a> {
    registry: &'a SchemaRegistry,
    descriptor: Arc<TableDescriptor>,
    value: Option<&'a dyn DynRecord>,
    search: Search,
    sql: String,
    sql_vars: Vec<DatabaseValue>,
    error: Option<ModelError>,
}

impl<'a> Scope<'a> {
    /// Scope over the table of `T`
    pub fn new<T: Schema>(registry: &'a SchemaRegistry) -> Self {
        Self::for_type(registry, TypeRef::of::<T>())
    }

    /// Scope over the table of a referenced type
    pub fn for_type(registry: &'a SchemaRegistry, type_ref: TypeRef) -> Self {
        Self {
            registry,
            descriptor: registry.describe_ref(type_ref),
            value: None,
            search: Search::new(),
            sql: String::new(),
            sql_vars: Vec::new(),
            error: None,
        }
    }

    /// Scope targeting one record; a non-zero primary key restricts queries to it
    pub fn for_record(registry: &'a SchemaRegistry, record: &'a dyn DynRecord) -> Self {
        let mut scope = Self::for_type(registry, record.type_ref());
        scope.value = Some(record);
        scope
    }

    pub fn with_search(mut self, search: Search) -> Self {
        self.search = search;
        self
    }

    pub fn search(&self) -> &Search {
        &self.search
    }

    pub fn set_search(&mut self, search: Search) {
        self.search = search;
    }

    pub fn registry(&self) -> &'a SchemaRegistry {
        self.registry
    }

    pub fn dialect(&self) -> &'a dyn Dialect {
        self.registry.dialect().as_ref()
    }

    pub fn descriptor(&self) -> &Arc<TableDescriptor> {
        &self.descriptor
    }

    pub fn value(&self) -> Option<&'a dyn DynRecord> {
        self.value
    }

    pub fn quote(&self, name: &str) -> String {
        self.dialect().quote(name)
    }

    pub fn table_name(&self) -> String {
        SqlRenderer::new(self.registry, &self.descriptor).table_name(&self.search)
    }

    pub fn quoted_table_name(&self) -> String {
        SqlRenderer::new(self.registry, &self.descriptor).quoted_table_name(&self.search)
    }

    /// Column name of the primary key
    pub fn primary_key(&self) -> &str {
        self.descriptor.primary_key_name()
    }

    /// Primary key of the target record
    pub fn primary_key_value(&self) -> Option<DatabaseValue> {
        let field = self.descriptor.primary_key_field()?;
        self.value?.field_value(&field.name)
    }

    /// Whether the target record has no primary key value yet
    pub fn primary_key_zero(&self) -> bool {
        self.primary_key_value().map_or(true, |value| value.is_blank())
    }

    /// Value of a field of the target record
    ///
    /// `field` may be any spelling that normalises to the same column
    /// (`CompanyId`, `CompanyID`, `company_id`); the record is asked for the
    /// declared field name.
    pub fn field_value(&self, field: &str) -> Option<DatabaseValue> {
        let declared = self
            .descriptor
            .field(field)
            .map_or(field, |column| column.name.as_str());
        self.value?.field_value(declared)
    }

    /// Whether the described type stores a column by that column or field name
    pub fn has_column(&self, name: &str) -> bool {
        self.descriptor
            .normal_fields()
            .any(|field| field.db_name == name || field.name == name)
    }

    /// Record an error; only the first one is kept
    pub fn err(&mut self, error: ModelError) -> &mut Self {
        if self.error.is_none() {
            self.error = Some(error);
        }
        self
    }

    pub fn error(&self) -> Option<&ModelError> {
        self.error.as_ref()
    }

    pub fn into_result(self) -> OrmResult<()> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn check(&self) -> OrmResult<()> {
        match &self.error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    /// Keep the first error of `result`
    fn track<T>(&mut self, result: OrmResult<T>) -> OrmResult<T> {
        if let Err(ref error) = result {
            self.err(error.clone());
        }
        result
    }

    /// Render the search into `sql` and `sql_vars`
    pub fn prepare_query_sql(&mut self) {
        if self.error.is_some() {
            return;
        }

        let primary_key = if self.primary_key_zero() {
            None
        } else {
            self.primary_key_value()
        };
        let rendered = SqlRenderer::new(self.registry, &self.descriptor)
            .with_primary_key(primary_key)
            .render(&self.search);

        self.sql = rendered.sql;
        self.sql_vars = rendered.vars;
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn sql_vars(&self) -> &[DatabaseValue] {
        &self.sql_vars
    }

    /// Run the query and return every row
    pub async fn rows(&mut self, executor: &dyn Executor) -> OrmResult<Vec<Box<dyn DatabaseRow>>> {
        self.check()?;
        self.prepare_query_sql();
        debug!("Executing query: {} ({} bound values)", self.sql, self.sql_vars.len());

        let result = executor.fetch_all(&self.sql, &self.sql_vars).await;
        self.track(result)
    }

    /// Run the query and return the first row
    pub async fn row(&mut self, executor: &dyn Executor) -> OrmResult<Option<Box<dyn DatabaseRow>>> {
        self.check()?;
        self.prepare_query_sql();
        debug!("Executing query: {} ({} bound values)", self.sql, self.sql_vars.len());

        let result = executor.fetch_optional(&self.sql, &self.sql_vars).await;
        self.track(result)
    }

    /// Run the query and scan the result into `target`
    pub async fn find<C: ScanTarget>(&mut self, executor: &dyn Executor, target: &mut C) -> OrmResult<()> {
        let rows: Vec<Box<dyn DatabaseRow>> = if C::SINGLE {
            self.row(executor).await?.into_iter().collect()
        } else {
            self.rows(executor).await?
        };

        let result = target.fill(rows);
        self.track(result)
    }

    /// First row of the query, if any
    pub async fn first_row(&mut self, executor: &dyn Executor) -> OrmResult<Option<Box<dyn DatabaseRow>>> {
        self.row(executor).await
    }

    /// Select one column and append its values to `dest`
    ///
    /// Nothing is appended unless every value decodes.
    pub async fn pluck<T>(&mut self, executor: &dyn Executor, column: &str, dest: &mut Vec<T>) -> OrmResult<()>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        self.search = self.search.reselect(column);
        let rows = self.rows(executor).await?;

        let values = rows
            .iter()
            .map(|row| row.get_at::<T>(0))
            .collect::<OrmResult<Vec<_>>>();
        let values = self.track(values)?;

        dest.extend(values);
        Ok(())
    }

    /// Number of matching rows
    ///
    /// Orderings are dropped for the count query; the scope's search is left
    /// as it was.
    pub async fn count(&mut self, executor: &dyn Executor) -> OrmResult<i64> {
        let search = self.search.clone();
        self.search = search.reselect("count(*)").unordered();
        let row = self.row(executor).await;
        self.search = search;

        let count = match row? {
            Some(row) => row.get_at::<i64>(0),
            None => Ok(0),
        };
        self.track(count)
    }
}
