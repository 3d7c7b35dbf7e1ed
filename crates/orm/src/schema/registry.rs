//! Schema Registry - process-wide cache of table descriptors
//!
//! Descriptors are computed on first use and never mutated afterwards.
//! The computation runs outside the map lock; when two threads describe the
//! same type concurrently, the first insert wins and both get that value.

use std::any::TypeId;
use std::sync::Arc;

use dashmap::DashMap;

use super::definition::{Schema, TypeRef};
use super::descriptor::TableDescriptor;
use super::reflector::Reflector;
use crate::backends::Dialect;
use crate::config::OrmConfig;

/// Thread-safe registry of table descriptors keyed by type identity
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    dialect: Arc<dyn Dialect>,
    config: OrmConfig,
    descriptors: Arc<DashMap<TypeId, Arc<TableDescriptor>>>,
}

impl SchemaRegistry {
    /// Create an empty registry
    pub fn new(dialect: Arc<dyn Dialect>, config: OrmConfig) -> Self {
        Self {
            dialect,
            config,
            descriptors: Arc::new(DashMap::new()),
        }
    }

    /// Create a registry using the dialect of the configured backend
    pub fn from_config(config: OrmConfig) -> Self {
        Self::new(config.backend.dialect(), config)
    }

    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    pub fn config(&self) -> &OrmConfig {
        &self.config
    }

    /// Descriptor of `T`
    pub fn describe<T: Schema>(&self) -> Arc<TableDescriptor> {
        self.describe_ref(TypeRef::of::<T>())
    }

    /// Descriptor of the referenced type
    pub fn describe_ref(&self, type_ref: TypeRef) -> Arc<TableDescriptor> {
        if let Some(descriptor) = self.descriptors.get(&type_ref.id()) {
            tracing::trace!("Schema cache hit for table '{}'", descriptor.table_name);
            return Arc::clone(descriptor.value());
        }

        let descriptor = Reflector::new(self.dialect.as_ref(), &self.config).describe(type_ref);
        tracing::trace!(
            "Schema cache miss, described '{}' as table '{}': {}",
            descriptor.type_name,
            descriptor.table_name,
            serde_json::to_string(&descriptor.summary()).unwrap_or_default()
        );

        let entry = self
            .descriptors
            .entry(type_ref.id())
            .or_insert_with(|| Arc::new(descriptor));
        Arc::clone(entry.value())
    }

    /// Whether `T` has been described already
    pub fn contains<T: Schema>(&self) -> bool {
        self.descriptors.contains_key(&TypeId::of::<T>())
    }

    /// Number of described types
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
