//! Metadata extraction
//!
//! Turns the raw [`EntityDeclaration`] of an entity type into validated
//! [`EntityMetadata`]: table name, primary key, foreign key and the
//! relationships that can actually be resolved. Declarations are static, so
//! each type is extracted once and cached for the life of the process.

use std::any::TypeId;
use std::collections::HashMap;
use std::str::FromStr;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::warn;

use super::filters::OrderBy;
use super::inflector::{foreign_key_for_table, table_name_for_type};
use super::traits::{Entity, EntityDeclaration, EntityRef, RelationDeclaration};

/// Declared relationship shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    HasOne,
    HasMany,
}

impl FromStr for Cardinality {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "has_one" | "belongs_to" => Ok(Cardinality::HasOne),
            "has_many" => Ok(Cardinality::HasMany),
            _ => Err(()),
        }
    }
}

/// A resolvable relationship field.
#[derive(Debug, Clone)]
pub struct RelationMetadata {
    pub field: &'static str,
    pub cardinality: Cardinality,
    pub target: EntityRef,
    pub join_table: Option<&'static str>,
    /// Declared sort order; empty when none was declared
    pub order_by: Vec<OrderBy>,
    /// Relation-level foreign key override
    pub foreign_key: Option<&'static str>,
}

impl RelationMetadata {
    pub fn targets(&self, type_id: TypeId) -> bool {
        self.target.type_id() == type_id
    }
}

/// Derived schema information for one entity type.
#[derive(Debug, Clone)]
pub struct EntityMetadata {
    pub type_name: &'static str,
    pub type_id: TypeId,
    pub table_name: String,
    pub primary_key: &'static str,
    /// Column other tables use to reference this entity
    pub foreign_key: String,
    pub columns: &'static [&'static str],
    pub relations: Vec<RelationMetadata>,
}

impl EntityMetadata {
    pub fn relation(&self, field: &str) -> Option<&RelationMetadata> {
        self.relations.iter().find(|r| r.field == field)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains(&column)
    }
}

/// Process-wide metadata cache, populated once per type.
static METADATA_CACHE: Lazy<RwLock<HashMap<TypeId, &'static EntityMetadata>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Get the metadata for an entity type.
pub fn metadata_for<E: Entity>() -> &'static EntityMetadata {
    metadata_for_ref(EntityRef::of::<E>())
}

/// Get the metadata for a type-erased entity reference.
pub fn metadata_for_ref(entity: EntityRef) -> &'static EntityMetadata {
    let type_id = entity.type_id();

    if let Some(metadata) = METADATA_CACHE.read().get(&type_id).copied() {
        return metadata;
    }

    let mut cache = METADATA_CACHE.write();
    *cache
        .entry(type_id)
        .or_insert_with(|| &*Box::leak(Box::new(extract(type_id, entity.declaration()))))
}

/// Explicit table override, else the pluralized snake-case type name.
pub fn table_name_for<E: Entity>() -> String {
    metadata_for::<E>().table_name.clone()
}

/// Explicit foreign key override, else `id_` + singular table name.
pub fn foreign_key_for<E: Entity>() -> String {
    metadata_for::<E>().foreign_key.clone()
}

fn extract(type_id: TypeId, declaration: EntityDeclaration) -> EntityMetadata {
    let table_name = match declaration.table {
        Some(table) => table.to_string(),
        None => table_name_for_type(declaration.type_name),
    };

    let foreign_key = match declaration.foreign_key {
        Some(key) => key.to_string(),
        None => foreign_key_for_table(&table_name),
    };

    let relations = declaration
        .relations
        .iter()
        .filter_map(|relation| extract_relation(declaration.type_name, relation))
        .collect();

    EntityMetadata {
        type_name: declaration.type_name,
        type_id,
        table_name,
        primary_key: declaration.primary_key,
        foreign_key,
        columns: declaration.columns,
        relations,
    }
}

/// A relation missing its target or with an unknown cardinality is not a
/// relationship at all; it is dropped from the metadata.
fn extract_relation(owner: &str, relation: &RelationDeclaration) -> Option<RelationMetadata> {
    let Ok(cardinality) = relation.cardinality.parse::<Cardinality>() else {
        warn!(
            entity = owner,
            field = relation.field,
            cardinality = relation.cardinality,
            "Unsupported cardinality, field is not a relationship"
        );
        return None;
    };

    let Some(target) = relation.target else {
        warn!(
            entity = owner,
            field = relation.field,
            "Relation has no target type, field is not a relationship"
        );
        return None;
    };

    let order_by = match relation.order.map(OrderBy::parse_list) {
        Some(Ok(order)) => order,
        Some(Err(err)) => {
            warn!(
                entity = owner,
                field = relation.field,
                error = %err,
                "Ignoring invalid relation sort order"
            );
            Vec::new()
        }
        None => Vec::new(),
    };

    Some(RelationMetadata {
        field: relation.field,
        cardinality,
        target,
        join_table: relation.join_table,
        order_by,
        foreign_key: relation.foreign_key,
    })
}
