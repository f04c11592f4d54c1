//! The public face of every entity
//!
//! [`ActiveRecord`] is implemented for every [`Entity`], so deriving
//! `Entity` is all a type needs to get `find`, `get`, `count`, `fill`,
//! `save` and `delete`.

use async_trait::async_trait;

use super::error::Result;
use super::filters::Filters;
use super::pagination::{PageEnvelope, RequestContext};
use super::persistence;
use super::repository::{self, CountQuery, FindQuery};
use super::storage::Storage;
use super::traits::Entity;
use super::value::Row;

#[async_trait]
pub trait ActiveRecord: Entity {
    /// Start a find query for this entity type.
    fn query(storage: &dyn Storage) -> FindQuery<'_, Self> {
        FindQuery::new(storage)
    }

    /// Start a count query for this entity type.
    fn count_query(storage: &dyn Storage) -> CountQuery<'_, Self> {
        CountQuery::new(storage)
    }

    /// Equality-filtered, optionally sorted list; `limit == 0` is unbounded.
    async fn find(
        storage: &dyn Storage,
        filters: Filters,
        order_by: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>>;

    /// Like [`find`](Self::find), wrapped in a page envelope.
    async fn find_paged(
        storage: &dyn Storage,
        filters: Filters,
        order_by: Option<&str>,
        limit: i64,
        offset: i64,
        request: &RequestContext,
    ) -> Result<PageEnvelope<Self>>;

    /// Fetch by primary key, failing with `NotFound`.
    async fn get(storage: &dyn Storage, id: i64) -> Result<Self>;

    /// Count matching rows, or distinct combinations of `distinct` columns.
    async fn count(storage: &dyn Storage, filters: Filters, distinct: &[&str]) -> Result<i64>;

    fn fill(&mut self, properties: &Row) -> Result<&mut Self>;

    async fn save(&mut self, storage: &dyn Storage) -> Result<&mut Self>;

    async fn delete(&mut self, storage: &dyn Storage) -> Result<&mut Self>;

    fn is_persisted(&self) -> bool;
}

fn find_query<'a, E: Entity>(
    storage: &'a dyn Storage,
    filters: Filters,
    order_by: Option<&str>,
    limit: i64,
    offset: i64,
) -> FindQuery<'a, E> {
    let query = FindQuery::new(storage)
        .filter(filters)
        .paginate(limit, offset);
    match order_by {
        Some(clause) => query.order_by(clause),
        None => query,
    }
}

#[async_trait]
impl<E: Entity> ActiveRecord for E {
    async fn find(
        storage: &dyn Storage,
        filters: Filters,
        order_by: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>> {
        find_query::<E>(storage, filters, order_by, limit, offset)
            .fetch_all()
            .await
    }

    async fn find_paged(
        storage: &dyn Storage,
        filters: Filters,
        order_by: Option<&str>,
        limit: i64,
        offset: i64,
        request: &RequestContext,
    ) -> Result<PageEnvelope<Self>> {
        find_query::<E>(storage, filters, order_by, limit, offset)
            .fetch_page(request)
            .await
    }

    async fn get(storage: &dyn Storage, id: i64) -> Result<Self> {
        repository::get(storage, id).await
    }

    async fn count(storage: &dyn Storage, filters: Filters, distinct: &[&str]) -> Result<i64> {
        CountQuery::<E>::new(storage)
            .filter(filters)
            .distinct(distinct.iter().copied())
            .execute()
            .await
    }

    fn fill(&mut self, properties: &Row) -> Result<&mut Self> {
        persistence::fill(self, properties)
    }

    async fn save(&mut self, storage: &dyn Storage) -> Result<&mut Self> {
        persistence::save(self, storage).await?;
        Ok(self)
    }

    async fn delete(&mut self, storage: &dyn Storage) -> Result<&mut Self> {
        persistence::delete(self, storage).await?;
        Ok(self)
    }

    fn is_persisted(&self) -> bool {
        self.record_state().is_persisted()
    }
}
