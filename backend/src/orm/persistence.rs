//! Persistence engine: insert, update and delete
//!
//! `save` decides between insert and update from the entity's identity and
//! persisted flag, running the [`SaveHooks`](super::SaveHooks) around the
//! write. Engine failures are returned unchanged as
//! [`OrmError::Storage`](super::OrmError::Storage).

use tracing::debug;

use super::error::Result;
use super::filters::Filters;
use super::mapper;
use super::metadata::metadata_for;
use super::storage::Storage;
use super::traits::Entity;
use super::value::Row;

/// Insert or update the entity.
pub async fn save<E: Entity>(entity: &mut E, storage: &dyn Storage) -> Result<()> {
    entity.before_save()?;

    match entity.id() {
        Some(id) if entity.record_state().is_persisted() => update(entity, id, storage).await?,
        _ => insert(entity, storage).await?,
    }

    entity.after_save()
}

async fn insert<E: Entity>(entity: &mut E, storage: &dyn Storage) -> Result<()> {
    let metadata = metadata_for::<E>();
    let mut row = mapper::to_row(entity);

    // Let the engine assign the identity
    if row.get(metadata.primary_key).is_some_and(|v| v.is_null()) {
        row.remove(metadata.primary_key);
    }

    let assigned = storage.insert(&metadata.table_name, &row).await?;
    entity.record_state_mut().mark_persisted();
    if let Some(id) = assigned.filter(|id| *id > 0) {
        entity.set_id(Some(id));
    }

    debug!(
        entity = metadata.type_name,
        table = %metadata.table_name,
        id = ?entity.id(),
        "Inserted entity"
    );
    Ok(())
}

async fn update<E: Entity>(entity: &mut E, id: i64, storage: &dyn Storage) -> Result<()> {
    let metadata = metadata_for::<E>();
    let mut row = mapper::to_row(entity);
    row.remove(metadata.primary_key);

    if row.is_empty() {
        return Ok(());
    }

    let filters = Filters::new().eq(metadata.primary_key, id);
    let affected = storage.update(&metadata.table_name, &row, &filters).await?;

    debug!(
        entity = metadata.type_name,
        table = %metadata.table_name,
        id,
        affected,
        "Updated entity"
    );
    Ok(())
}

/// Delete the entity's row. Fields are kept; only the persisted flag is
/// cleared.
pub async fn delete<E: Entity>(entity: &mut E, storage: &dyn Storage) -> Result<()> {
    let metadata = metadata_for::<E>();

    if let Some(id) = entity.id() {
        let filters = Filters::new().eq(metadata.primary_key, id);
        let affected = storage.delete(&metadata.table_name, &filters).await?;
        debug!(
            entity = metadata.type_name,
            table = %metadata.table_name,
            id,
            affected,
            "Deleted entity"
        );
    }

    entity.record_state_mut().clear_persisted();
    Ok(())
}

/// Merge properties into the entity without marking it persisted.
pub fn fill<'a, E: Entity>(entity: &'a mut E, properties: &Row) -> Result<&'a mut E> {
    mapper::from_partial(properties, entity)
}
