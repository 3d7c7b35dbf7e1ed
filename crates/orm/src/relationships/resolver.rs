//! Association resolver - loads the rows related to an owner record
//!
//! The foreign key is looked up by name among the candidates, on the owner's
//! fields first and then on the related type's columns:
//!
//! - owner field with a many-to-many relationship: join through the join table;
//! - owner field with a belongs-to relationship, or a plain key column:
//!   related primary key equals the owner's key value;
//! - owner field with a has-one/has-many relationship: related key column
//!   equals the owner's primary key (plus the polymorphic type when configured);
//! - related column: equals the owner's primary key.

use crate::args;
use crate::backends::{DatabaseValue, Executor};
use crate::error::{ModelError, OrmResult, RelationshipError};
use crate::query::Search;
use crate::schema::{ColumnDescriptor, TableDescriptor};
use crate::scope::{Scope, ScanTarget};

use super::metadata::{RelationshipMetadata, RelationshipType};

/// Build the search selecting the rows related to `owner`
pub fn related_search(
    owner: &Scope<'_>,
    target: &TableDescriptor,
    foreign_keys: &[&str],
) -> Result<Search, ModelError> {
    let mut candidates: Vec<String> = foreign_keys.iter().map(|key| key.to_string()).collect();
    candidates.push(format!("{}Id", target.type_name));
    candidates.push(format!("{}Id", owner.descriptor().type_name));

    let owner_primary_key = owner.primary_key_value().unwrap_or(DatabaseValue::Null);
    let target_table = owner.quote(&target.table_name);
    let target_primary_key = owner.quote(target.primary_key_name());

    for candidate in &candidates {
        if let Some(field) = owner.descriptor().field(candidate) {
            let search = match &field.relationship {
                Some(relationship) => {
                    relationship.validate()?;
                    relationship_search(owner, field, relationship, target, owner_primary_key)?
                }
                None => Search::new().where_(
                    format!("{} = ?", target_primary_key),
                    args![owner.field_value(&field.name).unwrap_or(DatabaseValue::Null)],
                ),
            };
            tracing::debug!(
                "Resolved association of '{}' to '{}' through owner field '{}'",
                owner.descriptor().type_name,
                target.type_name,
                field.name
            );
            return Ok(search);
        }

        if let Some(column) = target.field(candidate).filter(|f| f.is_column()) {
            tracing::debug!(
                "Resolved association of '{}' to '{}' through column '{}.{}'",
                owner.descriptor().type_name,
                target.type_name,
                target_table,
                column.db_name
            );
            return Ok(Search::new().where_(
                format!("{} = ?", owner.quote(&column.db_name)),
                args![owner_primary_key],
            ));
        }
    }

    Err(RelationshipError::Unresolvable { candidates }.into())
}

fn relationship_search(
    owner: &Scope<'_>,
    field: &ColumnDescriptor,
    relationship: &RelationshipMetadata,
    target: &TableDescriptor,
    owner_primary_key: DatabaseValue,
) -> Result<Search, ModelError> {
    match relationship.relationship_type {
        RelationshipType::ManyToMany => {
            let join_table = owner.quote(relationship.join_table().unwrap_or_default());
            let joins = format!(
                "INNER JOIN {} ON {}.{} = {}.{}",
                join_table,
                join_table,
                owner.quote(&relationship.association_foreign_key.column),
                owner.quote(&target.table_name),
                owner.quote(target.primary_key_name())
            );
            Ok(Search::new().joins(joins).where_(
                format!(
                    "{}.{} = ?",
                    join_table,
                    owner.quote(&relationship.foreign_key.column)
                ),
                args![owner_primary_key],
            ))
        }
        RelationshipType::BelongsTo => {
            let key = owner
                .field_value(&relationship.foreign_key.field)
                .unwrap_or(DatabaseValue::Null);
            Ok(Search::new().where_(
                format!("{} = ?", owner.quote(target.primary_key_name())),
                args![key],
            ))
        }
        RelationshipType::HasOne | RelationshipType::HasMany => {
            if relationship.foreign_key.is_empty() {
                return Err(RelationshipError::InvalidConfiguration(format!(
                    "'{}' has no foreign key on '{}'",
                    field.name, target.type_name
                ))
                .into());
            }

            let mut search = Search::new().where_(
                format!("{} = ?", owner.quote(&relationship.foreign_key.column)),
                args![owner_primary_key],
            );
            if let Some(polymorphic) = &relationship.polymorphic_config {
                if target.has_column(&polymorphic.type_column) {
                    search = search.where_(
                        format!("{} = ?", owner.quote(&polymorphic.type_column)),
                        args![owner.table_name()],
                    );
                }
            }
            Ok(search)
        }
    }
}

/// Load the rows related to the owner's record into `container`
///
/// Errors are recorded on the owner scope and returned.
pub async fn related<C: ScanTarget>(
    owner: &mut Scope<'_>,
    executor: &dyn Executor,
    container: &mut C,
    foreign_keys: &[&str],
) -> OrmResult<()> {
    if let Some(error) = owner.error() {
        return Err(error.clone());
    }

    let mut target = Scope::new::<C::Item>(owner.registry());
    let search = match related_search(owner, target.descriptor(), foreign_keys) {
        Ok(search) => search,
        Err(error) => {
            owner.err(error.clone());
            return Err(error);
        }
    };

    target.set_search(search);
    if let Err(error) = target.find(executor, container).await {
        owner.err(error.clone());
        return Err(error);
    }
    Ok(())
}

/// Load the relationship declared by `field_name` into `container`
pub async fn load<C: ScanTarget>(
    owner: &mut Scope<'_>,
    executor: &dyn Executor,
    field_name: &str,
    container: &mut C,
) -> OrmResult<()> {
    let field = owner
        .descriptor()
        .relationship_fields()
        .find(|field| field.name == field_name)
        .map(|field| field.name.clone());

    match field {
        Some(name) => related(owner, executor, container, &[name.as_str()]).await,
        None => {
            let error: ModelError = RelationshipError::UnknownField(field_name.to_string()).into();
            owner.err(error.clone());
            Err(error)
        }
    }
}
