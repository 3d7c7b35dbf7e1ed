//! Search conditions and modifiers
//!
//! A [`Search`] is an immutable value: every builder method leaves the
//! receiver untouched and returns an extended copy, so a base search can be
//! shared and reused without one caller observing another's conditions.

use super::clause::{Argument, Clause, Query, SelectClause, Selection};

/// Accumulated conditions and modifiers of one query
#[derive(Debug, Clone, Default)]
pub struct Search {
    pub(crate) where_conditions: Vec<Clause>,
    pub(crate) or_conditions: Vec<Clause>,
    pub(crate) not_conditions: Vec<Clause>,
    pub(crate) having_condition: Option<Clause>,
    pub(crate) selects: Vec<SelectClause>,
    pub(crate) orders: Vec<String>,
    pub(crate) group: String,
    pub(crate) limit: String,
    pub(crate) offset: String,
    pub(crate) joins: String,
    pub(crate) table_name: Option<String>,
    pub(crate) unscoped: bool,
    pub(crate) raw: bool,
}

impl Search {
    pub fn new() -> Self {
        Self::default()
    }

    fn with(&self, change: impl FnOnce(&mut Search)) -> Self {
        let mut search = self.clone();
        change(&mut search);
        search
    }

    /// AND condition
    pub fn where_(&self, query: impl Into<Query>, args: Vec<Argument>) -> Self {
        let clause = Clause::new(query, args);
        self.with(|s| s.where_conditions.push(clause))
    }

    /// OR condition
    pub fn or_where(&self, query: impl Into<Query>, args: Vec<Argument>) -> Self {
        let clause = Clause::new(query, args);
        self.with(|s| s.or_conditions.push(clause))
    }

    /// Negated AND condition
    pub fn where_not(&self, query: impl Into<Query>, args: Vec<Argument>) -> Self {
        let clause = Clause::new(query, args);
        self.with(|s| s.not_conditions.push(clause))
    }

    /// Add a projection; array arguments expand to markers, others are quoted inline
    pub fn select(&self, selection: impl Into<Selection>, args: Vec<Argument>) -> Self {
        let clause = SelectClause {
            selection: selection.into(),
            args,
        };
        self.with(|s| s.selects.push(clause))
    }

    /// Replace every projection
    pub(crate) fn reselect(&self, selection: impl Into<Selection>) -> Self {
        let clause = SelectClause {
            selection: selection.into(),
            args: Vec::new(),
        };
        self.with(|s| s.selects = vec![clause])
    }

    pub fn order(&self, order: impl Into<String>) -> Self {
        let order = order.into();
        self.with(|s| s.orders.push(order))
    }

    /// Replace every ordering
    pub fn reorder(&self, order: impl Into<String>) -> Self {
        let order = order.into();
        self.with(|s| s.orders = vec![order])
    }

    pub(crate) fn unordered(&self) -> Self {
        self.with(|s| s.orders.clear())
    }

    pub fn group(&self, group: impl Into<String>) -> Self {
        let group = group.into();
        self.with(|s| s.group = group)
    }

    pub fn having(&self, query: impl Into<Query>, args: Vec<Argument>) -> Self {
        let clause = Clause::new(query, args);
        self.with(|s| s.having_condition = Some(clause))
    }

    pub fn limit(&self, limit: impl ToString) -> Self {
        let limit = limit.to_string();
        self.with(|s| s.limit = limit)
    }

    pub fn offset(&self, offset: impl ToString) -> Self {
        let offset = offset.to_string();
        self.with(|s| s.offset = offset)
    }

    /// Raw JOIN text placed after the table name
    pub fn joins(&self, joins: impl Into<String>) -> Self {
        let joins = joins.into();
        self.with(|s| s.joins = joins)
    }

    /// Skip the soft-delete filter
    pub fn unscoped(&self) -> Self {
        self.with(|s| s.unscoped = true)
    }

    /// Use `sql` as the whole statement
    pub fn raw(&self, sql: impl Into<String>, args: Vec<Argument>) -> Self {
        let clause = Clause::new(Query::Text(sql.into()), args);
        self.with(|s| {
            s.where_conditions.push(clause);
            s.raw = true;
        })
    }

    /// Query this table instead of the model's
    pub fn table(&self, table_name: impl Into<String>) -> Self {
        let table_name = table_name.into();
        self.with(|s| s.table_name = Some(table_name))
    }

    pub fn is_unscoped(&self) -> bool {
        self.unscoped
    }

    pub fn is_raw(&self) -> bool {
        self.raw
    }

    pub fn table_name(&self) -> Option<&str> {
        self.table_name.as_deref()
    }

    /// Number of where, or and not clauses
    pub fn condition_count(&self) -> usize {
        self.where_conditions.len() + self.or_conditions.len() + self.not_conditions.len()
    }
}
