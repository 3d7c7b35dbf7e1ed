//! Condition compiler
//!
//! A [`Search`] collects clauses; [`SqlRenderer`] turns it into SQL text and
//! the matching list of bound values for one table.

pub mod clause;
pub mod search;
pub mod sql_generation;
pub mod where_clause;

pub use clause::{Argument, Clause, Query, SelectClause, Selection};
pub use search::Search;
pub use sql_generation::{RenderedSql, SqlRenderer};
