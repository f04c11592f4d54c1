//! Relationship resolution
//!
//! Relationship fields are declared with `#[relation(...)]` and stored in a
//! [`HasOne`] or [`HasMany`] cell. The accessor generated for each field
//! resolves the relationship on first access and memoizes the result in the
//! cell for the lifetime of the owning instance. A relationship with nothing
//! to load yet (empty foreign key, unsaved owner) is re-checked on each read.
//!
//! A field whose declaration is not a usable relationship (unknown
//! cardinality, no target, target that does not match the cell type)
//! resolves to an empty value instead of failing.

use std::any::TypeId;

use serde::{Serialize, Serializer};
use tokio::sync::OnceCell;
use tracing::debug;

use super::error::{OrmError, Result};
use super::filters::{Filters, OrderBy};
use super::mapper;
use super::metadata::{Cardinality, EntityMetadata, RelationMetadata, metadata_for};
use super::repository;
use super::storage::{Join, Select, Storage};
use super::traits::Entity;

/// Sort order used for has-many results when none is declared
fn default_order() -> Vec<OrderBy> {
    vec![OrderBy::asc("id")]
}

/// Lazily loaded has-one (belongs-to) relationship.
///
/// Only a fetched target is memoized. While the owner's foreign key is
/// empty the accessor hands out a default instance and keeps checking the
/// key on later reads.
#[derive(Debug, Clone, Default)]
pub struct HasOne<T> {
    value: OnceCell<T>,
    blank: OnceCell<T>,
}

impl<T: Entity> HasOne<T> {
    /// The loaded value, if the relationship has been resolved.
    pub fn get(&self) -> Option<&T> {
        self.value.get()
    }

    /// Prefill the relationship. Returns false if it was already loaded.
    pub fn set(&self, value: T) -> bool {
        self.value.set(value).is_ok()
    }

    pub fn is_loaded(&self) -> bool {
        self.value.initialized()
    }

    pub fn is_unloaded(&self) -> bool {
        !self.value.initialized()
    }

    /// Resolve on first access, then return the memoized value.
    pub async fn load<O: Entity>(
        &self,
        owner: &O,
        field: &'static str,
        storage: &dyn Storage,
    ) -> Result<&T> {
        if let Some(value) = self.value.get() {
            return Ok(value);
        }

        match has_one_target::<O, T>(owner, field) {
            Some(id) => {
                self.value
                    .get_or_try_init(|| fetch_has_one::<O, T>(field, id, storage))
                    .await
            }
            None => Ok(self.blank.get_or_init(|| async { T::default() }).await),
        }
    }
}

/// Lazily loaded has-many relationship, one-to-many or many-to-many.
///
/// An owner without an id reads as empty and nothing is memoized, so the
/// relationship resolves once the owner has been saved.
#[derive(Debug, Clone, Default)]
pub struct HasMany<T>(OnceCell<Vec<T>>);

impl<T: Entity> HasMany<T> {
    pub fn get(&self) -> Option<&[T]> {
        self.0.get().map(Vec::as_slice)
    }

    pub fn set(&self, values: Vec<T>) -> bool {
        self.0.set(values).is_ok()
    }

    pub fn is_loaded(&self) -> bool {
        self.0.initialized()
    }

    pub fn is_unloaded(&self) -> bool {
        !self.0.initialized()
    }

    pub async fn load<O: Entity>(
        &self,
        owner: &O,
        field: &'static str,
        storage: &dyn Storage,
    ) -> Result<&[T]> {
        if let Some(values) = self.0.get() {
            return Ok(values);
        }
        if owner.id().is_none() || usable_relation::<O, T>(field, Cardinality::HasMany).is_none() {
            return Ok(&[]);
        }

        self.0
            .get_or_try_init(|| resolve_has_many::<O, T>(owner, field, storage))
            .await
            .map(Vec::as_slice)
    }
}

impl<T: Serialize> Serialize for HasOne<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.value.get().serialize(serializer)
    }
}

impl<T: Serialize> Serialize for HasMany<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.get().serialize(serializer)
    }
}

/// Find the relation for `field` if it is declared with `cardinality` and
/// points at `T`.
fn usable_relation<O: Entity, T: Entity>(
    field: &str,
    cardinality: Cardinality,
) -> Option<&'static RelationMetadata> {
    let owner = metadata_for::<O>();
    let relation = owner
        .relation(field)
        .filter(|r| r.cardinality == cardinality && r.targets(TypeId::of::<T>()));

    if relation.is_none() {
        debug!(
            owner = owner.type_name,
            relation = field,
            "Field is not a resolvable relationship, using empty value"
        );
    }
    relation
}

/// The id held in the owner's foreign key column for `field`, if the field
/// is a usable has-one and the key is set.
fn has_one_target<O: Entity, T: Entity>(owner: &O, field: &str) -> Option<i64> {
    let relation = usable_relation::<O, T>(field, Cardinality::HasOne)?;
    let column = relation
        .foreign_key
        .unwrap_or(metadata_for::<T>().foreign_key.as_str());

    owner.column_value(column).and_then(|value| value.as_i64())
}

async fn fetch_has_one<O: Entity, T: Entity>(
    field: &'static str,
    id: i64,
    storage: &dyn Storage,
) -> Result<T> {
    debug!(
        owner = metadata_for::<O>().type_name,
        relation = field,
        target = metadata_for::<T>().type_name,
        id,
        "Loading has-one relationship"
    );
    repository::get::<T>(storage, id).await
}

/// Resolve a has-many relationship, detecting many-to-many when the target
/// declares a has-many back at the owner.
async fn resolve_has_many<O: Entity, T: Entity>(
    owner: &O,
    field: &'static str,
    storage: &dyn Storage,
) -> Result<Vec<T>> {
    let Some(relation) = usable_relation::<O, T>(field, Cardinality::HasMany) else {
        return Ok(Vec::new());
    };

    // Nothing to join against until the owner is saved
    let Some(owner_id) = owner.id() else {
        return Ok(Vec::new());
    };

    let source = metadata_for::<O>();
    let target = metadata_for::<T>();
    let order_by = if relation.order_by.is_empty() {
        default_order()
    } else {
        relation.order_by.clone()
    };

    if is_many_to_many(source, target) {
        let join_table = relation.join_table.ok_or_else(|| {
            OrmError::Configuration(format!(
                "Missing join table on many-to-many relationship {}.{}",
                source.type_name, field
            ))
        })?;

        debug!(
            owner = source.type_name,
            relation = field,
            target = target.type_name,
            join_table,
            owner_id,
            "Loading many-to-many relationship"
        );

        let select = Select::from(target.table_name.as_str())
            .join(Join {
                table: join_table.to_string(),
                left: format!("{}.{}", target.table_name, target.primary_key),
                right: format!("{}.{}", join_table, target.foreign_key),
            })
            .filters(Filters::new().eq(format!("{}.{}", join_table, source.foreign_key), owner_id))
            .order_by(
                order_by
                    .iter()
                    .map(|o| o.qualified(&target.table_name))
                    .collect(),
            );

        let rows = storage.select(&select).await?;
        return mapper::from_rows(&rows);
    }

    let column = relation.foreign_key.unwrap_or(source.foreign_key.as_str());
    debug!(
        owner = source.type_name,
        relation = field,
        target = target.type_name,
        column,
        owner_id,
        "Loading has-many relationship"
    );

    repository::FindQuery::<T>::new(storage)
        .filter(Filters::new().eq(column, owner_id))
        .order(order_by)
        .fetch_all()
        .await
}

/// The inverse is inferred from the target's own declarations: any has-many
/// on the target pointing back at the source makes this many-to-many.
fn is_many_to_many(source: &EntityMetadata, target: &EntityMetadata) -> bool {
    let inverse = target
        .relations
        .iter()
        .filter(|r| r.cardinality == Cardinality::HasMany && r.targets(source.type_id))
        .count();

    if inverse > 1 {
        tracing::warn!(
            owner = source.type_name,
            target = target.type_name,
            inverse,
            "Several has-many fields point back at the owner, treating as many-to-many"
        );
    }
    inverse > 0
}
