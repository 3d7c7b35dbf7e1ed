//! Migration System
//!
//! DDL generation from table descriptors and its execution.

pub mod migrator;
pub mod schema_builder;

pub use migrator::Migrator;
pub use schema_builder::{DdlBuilder, TableBuilder};
