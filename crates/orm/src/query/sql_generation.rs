//! SQL generation for a search against one table

use crate::backends::{DatabaseValue, Dialect};
use crate::schema::{SchemaRegistry, TableDescriptor};

use super::search::Search;

/// Statement text with its bound values, in marker order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderedSql {
    pub sql: String,
    pub vars: Vec<DatabaseValue>,
}

/// Renders a [`Search`] into SQL for one table
pub struct SqlRenderer<'a> {
    registry: &'a SchemaRegistry,
    descriptor: &'a TableDescriptor,
    primary_key_value: Option<DatabaseValue>,
    vars: Vec<DatabaseValue>,
}

impl<'a> SqlRenderer<'a> {
    pub fn new(registry: &'a SchemaRegistry, descriptor: &'a TableDescriptor) -> Self {
        Self {
            registry,
            descriptor,
            primary_key_value: None,
            vars: Vec::new(),
        }
    }

    /// Restrict to the row with this primary key; blank values are ignored
    pub fn with_primary_key(mut self, value: Option<DatabaseValue>) -> Self {
        self.primary_key_value = value.filter(|v| !v.is_blank());
        self
    }

    pub(crate) fn registry(&self) -> &'a SchemaRegistry {
        self.registry
    }

    pub(crate) fn descriptor(&self) -> &'a TableDescriptor {
        self.descriptor
    }

    pub(crate) fn primary_key_value(&self) -> Option<&DatabaseValue> {
        self.primary_key_value.as_ref()
    }

    fn dialect(&self) -> &'a dyn Dialect {
        self.registry.dialect().as_ref()
    }

    pub(crate) fn quote(&self, name: &str) -> String {
        self.dialect().quote(name)
    }

    pub(crate) fn quoted_primary_key(&self) -> String {
        self.quote(self.descriptor.primary_key_name())
    }

    /// Push a bound value and return its marker
    pub fn add_to_vars(&mut self, value: DatabaseValue) -> String {
        self.vars.push(value);
        self.dialect().bind_var(self.vars.len())
    }

    /// Table queried by `search`
    pub fn table_name(&self, search: &Search) -> String {
        search
            .table_name()
            .map(str::to_string)
            .unwrap_or_else(|| self.descriptor.table_name.clone())
    }

    /// Quoted table name; names with spaces or dots are taken as written
    pub fn quoted_table_name(&self, search: &Search) -> String {
        let table = self.table_name(search);
        if table.contains(' ') || table.contains('.') {
            table
        } else {
            self.quote(&table)
        }
    }

    /// Render a SELECT statement, or the raw statement of a raw search
    pub fn render(mut self, search: &Search) -> RenderedSql {
        let sql = if search.raw {
            self.raw_sql(search)
        } else {
            self.select_statement(search)
        };

        RenderedSql {
            sql,
            vars: self.vars,
        }
    }

    fn select_statement(&mut self, search: &Search) -> String {
        let top = self.top_sql(search);
        let select = self.select_sql(search);
        let table = self.quoted_table_name(search);

        let mut sql = format!("SELECT {}{} FROM {}", top, select, table);

        let joins = search.joins.trim().to_string();
        let where_sql = self.where_sql(search);
        let group = self.group_sql(search);
        let having = self.having_sql(search);
        let order = self.order_sql(search);
        let limit = self.limit_sql(search);
        let offset = self.offset_sql(search);

        for part in [joins, where_sql, group, having, order, limit, offset] {
            if !part.is_empty() {
                sql.push(' ');
                sql.push_str(&part);
            }
        }

        sql
    }

    fn select_sql(&mut self, search: &Search) -> String {
        if search.selects.is_empty() {
            return "*".to_string();
        }

        search
            .selects
            .iter()
            .map(|clause| self.select_query(clause))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn top_sql(&self, search: &Search) -> String {
        if self.dialect().has_top() && search.offset.is_empty() && !search.limit.is_empty() {
            format!("TOP({}) ", search.limit)
        } else {
            String::new()
        }
    }

    fn group_sql(&self, search: &Search) -> String {
        if search.group.is_empty() {
            String::new()
        } else {
            format!("GROUP BY {}", search.group)
        }
    }

    fn having_sql(&mut self, search: &Search) -> String {
        match &search.having_condition {
            Some(clause) => {
                let condition = self.where_condition(clause);
                if condition.is_empty() {
                    String::new()
                } else {
                    format!("HAVING {}", condition)
                }
            }
            None => String::new(),
        }
    }

    fn order_sql(&self, search: &Search) -> String {
        if search.orders.is_empty() {
            String::new()
        } else {
            format!("ORDER BY {}", search.orders.join(","))
        }
    }

    fn limit_sql(&self, search: &Search) -> String {
        if self.dialect().has_top() || search.limit.is_empty() {
            String::new()
        } else {
            format!("LIMIT {}", search.limit)
        }
    }

    fn offset_sql(&self, search: &Search) -> String {
        if search.offset.is_empty() {
            return String::new();
        }

        if self.dialect().has_top() {
            let mut sql = format!("OFFSET {} ROW", search.offset);
            if !search.limit.is_empty() {
                sql.push_str(&format!(" FETCH NEXT {} ROWS ONLY", search.limit));
            }
            sql
        } else {
            format!("OFFSET {}", search.offset)
        }
    }
}
