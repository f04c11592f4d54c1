//! Core traits for the ORM layer
//!
//! These traits are implemented by the `#[derive(Entity)]` macro from
//! `recordkit-macros`. Application code works with them through
//! [`ActiveRecord`](super::ActiveRecord), which every entity gets for free.

use std::any::TypeId;

use super::error::Result;
use super::value::{Row, SqlValue};

/// Internal lifecycle state of an entity instance.
///
/// Held in the field marked `#[state]`; never mapped to a column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordState {
    persisted: bool,
}

impl RecordState {
    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    pub(crate) fn mark_persisted(&mut self) {
        self.persisted = true;
    }

    pub(crate) fn clear_persisted(&mut self) {
        self.persisted = false;
    }
}

/// Static declaration of an entity type, generated by `#[derive(Entity)]`.
///
/// This is the raw input of the metadata extractor; nothing here is
/// validated yet.
#[derive(Debug, Clone)]
pub struct EntityDeclaration {
    /// Rust type name (e.g. "UserModel")
    pub type_name: &'static str,
    /// Explicit table name override
    pub table: Option<&'static str>,
    /// Explicit foreign key override (e.g. "id_person")
    pub foreign_key: Option<&'static str>,
    /// The primary key column name
    pub primary_key: &'static str,
    /// Mapped scalar columns
    pub columns: &'static [&'static str],
    pub relations: Vec<RelationDeclaration>,
}

/// One `#[relation(...)]` field as written by the entity author.
#[derive(Debug, Clone)]
pub struct RelationDeclaration {
    pub field: &'static str,
    /// Declared cardinality ("has_one", "has_many")
    pub cardinality: &'static str,
    pub target: Option<EntityRef>,
    pub join_table: Option<&'static str>,
    /// Sort order for has-many results (e.g. "name asc")
    pub order: Option<&'static str>,
    pub foreign_key: Option<&'static str>,
}

/// Type-erased handle to another entity type.
#[derive(Clone, Copy)]
pub struct EntityRef {
    type_id: fn() -> TypeId,
    declaration: fn() -> EntityDeclaration,
}

impl EntityRef {
    pub fn of<E: Entity>() -> Self {
        Self {
            type_id: TypeId::of::<E>,
            declaration: E::declaration,
        }
    }

    pub fn type_id(&self) -> TypeId {
        (self.type_id)()
    }

    pub fn declaration(&self) -> EntityDeclaration {
        (self.declaration)()
    }
}

impl std::fmt::Debug for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("EntityRef")
            .field(&self.declaration().type_name)
            .finish()
    }
}

/// Extension points invoked around [`save`](super::ActiveRecord::save).
///
/// Implemented empty by the derive; add `#[entity(hooks)]` to write your own.
/// Returning an error from `before_save` aborts the save.
pub trait SaveHooks {
    fn before_save(&mut self) -> Result<()> {
        Ok(())
    }

    fn after_save(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Metadata and column mapping for a persistent entity.
///
/// Implemented by `#[derive(Entity)]` macro.
pub trait Entity: SaveHooks + Default + Send + Sync + Sized + 'static {
    fn declaration() -> EntityDeclaration;

    fn id(&self) -> Option<i64>;

    fn set_id(&mut self, id: Option<i64>);

    fn record_state(&self) -> &RecordState;

    fn record_state_mut(&mut self) -> &mut RecordState;

    /// Copy every mapped column present in `row` into the matching field.
    fn assign_columns(&mut self, row: &Row) -> Result<()>;

    /// Project every mapped column into a row.
    fn column_values(&self) -> Row;

    /// Current value of one mapped column.
    fn column_value(&self, column: &str) -> Option<SqlValue>;
}
