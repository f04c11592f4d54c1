//! Record mapping between raw rows and entity instances
//!
//! Only the columns the derive mapped are touched: relationship fields and
//! internal (`_`-prefixed or private) fields never participate.

use super::error::Result;
use super::traits::Entity;
use super::value::Row;

/// Build a loaded entity from a storage row.
pub fn from_row<E: Entity>(row: &Row) -> Result<E> {
    let mut entity = E::default();
    entity.assign_columns(row)?;
    entity.record_state_mut().mark_persisted();
    Ok(entity)
}

/// Map a whole result set.
pub fn from_rows<E: Entity>(rows: &[Row]) -> Result<Vec<E>> {
    rows.iter().map(from_row).collect()
}

/// Merge user-supplied properties without marking the entity as saved.
pub fn from_partial<'a, E: Entity>(properties: &Row, instance: &'a mut E) -> Result<&'a mut E> {
    instance.assign_columns(properties)?;
    Ok(instance)
}

/// Project the entity's scalar columns for a write.
pub fn to_row<E: Entity>(entity: &E) -> Row {
    entity.column_values()
}
