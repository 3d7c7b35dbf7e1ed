//! WHERE clause compilation
//!
//! Every clause shape compiles to a parenthesised fragment whose bind markers
//! appear in the same order as the values pushed onto the renderer.

use once_cell::sync::Lazy;
use regex::Regex;

use super::clause::{Argument, Clause, Query, SelectClause, Selection};
use super::search::Search;
use super::sql_generation::SqlRenderer;
use crate::backends::DatabaseValue;

/// Text already carrying a comparison, negated as a whole by NOT clauses
static COMPARISON_OPERATOR: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i) (=|<>|>|<|LIKE|IS) ").ok());

/// Soft-deleted rows carry a `deleted_at` later than this sentinel
const SOFT_DELETE_SENTINEL: &str = "0001-01-02";

fn is_numeric(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit())
}

fn has_comparison_operator(text: &str) -> bool {
    COMPARISON_OPERATOR
        .as_ref()
        .map_or(false, |regex| regex.is_match(text))
}

/// Numeric text as a primary key value, falling back to the text when out of range
fn numeric_value(text: &str) -> DatabaseValue {
    let trimmed = text.trim();
    trimmed
        .parse::<i64>()
        .map(DatabaseValue::Int64)
        .unwrap_or_else(|_| DatabaseValue::String(trimmed.to_string()))
}

impl<'a> SqlRenderer<'a> {
    /// Compile a where, or, or having clause
    pub(crate) fn where_condition(&mut self, clause: &Clause) -> String {
        match &clause.query {
            Query::Text(text) if is_numeric(text) => {
                let marker = self.add_to_vars(numeric_value(text));
                self.primary_condition("=", &marker)
            }
            Query::Text(text) if text.is_empty() => String::new(),
            Query::Text(text) => self.substitute(&format!("({})", text), &clause.args),
            Query::Number(id) => {
                let marker = self.add_to_vars(DatabaseValue::Int64(*id));
                self.primary_condition("=", &marker)
            }
            Query::List(values) => {
                let markers = self.markers(values);
                format!("({} in ({}))", self.quoted_primary_key(), markers)
            }
            Query::Map(map) => {
                let pairs = map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                self.grouped_conditions("=", pairs)
            }
            Query::Record(record) => {
                let descriptor = self.registry().describe_ref(record.type_ref());
                let pairs = descriptor
                    .normal_fields()
                    .filter_map(|field| {
                        record
                            .field_value(&field.name)
                            .filter(|value| !value.is_blank())
                            .map(|value| (field.db_name.clone(), value))
                    })
                    .collect();
                self.grouped_conditions("=", pairs)
            }
        }
    }

    /// Compile a negated clause
    pub(crate) fn not_condition(&mut self, clause: &Clause) -> String {
        match &clause.query {
            Query::Text(text) if is_numeric(text) => {
                let marker = self.add_to_vars(numeric_value(text));
                self.primary_condition("<>", &marker)
            }
            Query::Text(text) if text.is_empty() => String::new(),
            // Literal heuristic: quoted values containing " = " or " IS " are negated whole too
            Query::Text(text) if has_comparison_operator(text) => {
                self.substitute(&format!("NOT ({})", text), &clause.args)
            }
            Query::Text(column) => self.not_column_condition(column, &clause.args),
            Query::Number(id) => {
                let marker = self.add_to_vars(DatabaseValue::Int64(*id));
                self.primary_condition("<>", &marker)
            }
            Query::List(values) if values.is_empty() => String::new(),
            Query::List(values) => {
                let markers = self.markers(values);
                format!("({} NOT IN ({}))", self.quoted_primary_key(), markers)
            }
            Query::Map(map) => {
                let pairs = map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                self.grouped_conditions("<>", pairs)
            }
            Query::Record(record) => {
                let descriptor = self.registry().describe_ref(record.type_ref());
                let pairs = descriptor
                    .normal_fields()
                    .filter_map(|field| {
                        record
                            .field_value(&field.name)
                            .filter(|value| !value.is_blank())
                            .map(|value| (field.db_name.clone(), value))
                    })
                    .collect();
                self.grouped_conditions("<>", pairs)
            }
        }
    }

    /// `column NOT IN (...)` for an array argument, `column <> ?` otherwise
    fn not_column_condition(&mut self, column: &str, args: &[Argument]) -> String {
        let Some(first) = args.first() else {
            tracing::warn!("Skipping NOT condition on '{}' without a value", column);
            return String::new();
        };
        if args.len() > 1 {
            tracing::warn!(
                "NOT condition on '{}' uses one value, ignoring {} more",
                column,
                args.len() - 1
            );
        }

        let column = self.quote(column);
        match first.resolve() {
            DatabaseValue::Array(values) if values.is_empty() => String::new(),
            DatabaseValue::Array(values) => {
                let markers = self.markers(&values);
                format!("({} NOT IN ({}))", column, markers)
            }
            value => {
                let marker = self.add_to_vars(value);
                format!("({} <> {})", column, marker)
            }
        }
    }

    /// Render one projection
    pub(crate) fn select_query(&mut self, clause: &SelectClause) -> String {
        let text = match &clause.selection {
            Selection::Text(text) => text.clone(),
            Selection::Columns(columns) => columns.join(", "),
        };

        let mut out = String::with_capacity(text.len());
        let mut rest = text.as_str();
        for arg in &clause.args {
            let Some(position) = rest.find('?') else {
                tracing::warn!("Select '{}' has more arguments than placeholders", text);
                break;
            };
            out.push_str(&rest[..position]);
            let replacement = match arg.resolve() {
                DatabaseValue::Array(values) => self.markers(&values),
                value => self.quote(&value.to_string()),
            };
            out.push_str(&replacement);
            rest = &rest[position + 1..];
        }
        out.push_str(rest);
        out
    }

    /// Full WHERE clause, empty when nothing filters
    pub(crate) fn where_sql(&mut self, search: &Search) -> String {
        let mut primary_conditions = Vec::new();
        let mut and_conditions = Vec::new();
        let mut or_conditions = Vec::new();

        if !search.unscoped && self.descriptor().has_column("deleted_at") {
            let table = self.quoted_table_name(search);
            primary_conditions.push(format!(
                "({table}.deleted_at IS NULL OR {table}.deleted_at <= '{}')",
                SOFT_DELETE_SENTINEL
            ));
        }

        if let Some(value) = self.primary_key_value().cloned() {
            let marker = self.add_to_vars(value);
            primary_conditions.push(self.primary_condition("=", &marker));
        }

        for clause in &search.where_conditions {
            let sql = self.where_condition(clause);
            if !sql.is_empty() {
                and_conditions.push(sql);
            }
        }

        for clause in &search.not_conditions {
            let sql = self.not_condition(clause);
            if !sql.is_empty() {
                and_conditions.push(sql);
            }
        }

        for clause in &search.or_conditions {
            let sql = self.where_condition(clause);
            if !sql.is_empty() {
                or_conditions.push(sql);
            }
        }

        let or_sql = or_conditions.join(" OR ");
        let mut combined_sql = and_conditions.join(" AND ");
        if combined_sql.is_empty() {
            combined_sql = or_sql;
        } else if !or_sql.is_empty() {
            combined_sql = format!("{} OR {}", combined_sql, or_sql);
        }

        if !primary_conditions.is_empty() {
            let mut sql = format!("WHERE {}", primary_conditions.join(" AND "));
            if !combined_sql.is_empty() {
                sql = format!("{} AND ({})", sql, combined_sql);
            }
            sql
        } else if !combined_sql.is_empty() {
            format!("WHERE {}", combined_sql)
        } else {
            String::new()
        }
    }

    /// Statement text of a raw search
    pub(crate) fn raw_sql(&mut self, search: &Search) -> String {
        let mut parts = Vec::new();
        for clause in &search.where_conditions {
            let sql = match &clause.query {
                Query::Text(text) if !is_numeric(text) => self.substitute(text, &clause.args),
                _ => self.where_condition(clause),
            };
            if !sql.is_empty() {
                parts.push(sql);
            }
        }
        parts.join(" AND ")
    }

    fn primary_condition(&self, operator: &str, marker: &str) -> String {
        format!("({} {} {})", self.quoted_primary_key(), operator, marker)
    }

    fn grouped_conditions(&mut self, operator: &str, pairs: Vec<(String, DatabaseValue)>) -> String {
        if pairs.is_empty() {
            return String::new();
        }

        let conditions: Vec<String> = pairs
            .into_iter()
            .map(|(column, value)| {
                let marker = self.add_to_vars(value);
                format!("{} {} {}", self.quote(&column), operator, marker)
            })
            .collect();

        format!("({})", conditions.join(" AND "))
    }

    /// Comma-joined markers, one per value; `NULL` for an empty list
    fn markers(&mut self, values: &[DatabaseValue]) -> String {
        if values.is_empty() {
            return "NULL".to_string();
        }
        values
            .iter()
            .map(|value| self.add_to_vars(value.clone()))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Replace `?` left to right with markers for `args`
    fn substitute(&mut self, text: &str, args: &[Argument]) -> String {
        let mut out = String::with_capacity(text.len() + args.len() * 2);
        let mut rest = text;
        let mut consumed = 0;

        for arg in args {
            let Some(position) = rest.find('?') else {
                break;
            };
            out.push_str(&rest[..position]);
            let replacement = match arg.resolve() {
                DatabaseValue::Array(values) => self.markers(&values),
                value => self.add_to_vars(value),
            };
            out.push_str(&replacement);
            rest = &rest[position + 1..];
            consumed += 1;
        }
        out.push_str(rest);

        if consumed < args.len() {
            tracing::warn!(
                "Clause '{}' has {} arguments but only {} placeholders, extra arguments ignored",
                text,
                args.len(),
                consumed
            );
        }

        out
    }
}
