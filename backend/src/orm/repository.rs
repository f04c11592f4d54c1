//! Query executor
//!
//! Fluent query builders for finding and counting entities. These back the
//! `find` / `get` / `count` operations of [`ActiveRecord`](super::ActiveRecord)
//! and can be used directly for anything more specific.
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use recordkit::entities::User;
//! use recordkit::orm::{ActiveRecord, Filters};
//!
//! // Find all users in a city, sorted by name
//! let users = User::query(&db)
//!     .filter(Filters::new().eq("id_city", 2))
//!     .order_by("name asc")
//!     .fetch_all()
//!     .await?;
//!
//! // Find one user by ID
//! let user = User::get(&db, 1).await?;
//!
//! // Count users per city
//! let count = User::count_query(&db)
//!     .filter(Filters::new().eq("id_city", 1))
//!     .execute()
//!     .await?;
//! ```

use std::marker::PhantomData;

use tracing::debug;

use super::error::{OrmError, Result};
use super::filters::{Filters, OrderBy};
use super::mapper;
use super::metadata::metadata_for;
use super::pagination::{PageEnvelope, RequestContext, build_page};
use super::storage::{Select, Storage};
use super::traits::Entity;

/// Query builder for finding entities
pub struct FindQuery<'a, E: Entity> {
    storage: &'a dyn Storage,
    filters: Filters,
    order: Vec<OrderBy>,
    order_clause: Option<String>,
    limit: i64,
    offset: i64,
    _marker: PhantomData<fn() -> E>,
}

impl<'a, E: Entity> FindQuery<'a, E> {
    /// Create a new find query
    pub fn new(storage: &'a dyn Storage) -> Self {
        Self {
            storage,
            filters: Filters::new(),
            order: Vec::new(),
            order_clause: None,
            limit: 0,
            offset: 0,
            _marker: PhantomData,
        }
    }

    /// Set the equality filters
    pub fn filter(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }

    /// Sort by a clause such as `"name asc, id desc"`
    pub fn order_by(mut self, clause: impl Into<String>) -> Self {
        self.order_clause = Some(clause.into());
        self
    }

    /// Sort by already-parsed terms
    pub fn order(mut self, order: Vec<OrderBy>) -> Self {
        self.order = order;
        self
    }

    /// Set limit (0 = unbounded)
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Set offset
    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    /// Set pagination (limit and offset)
    pub fn paginate(mut self, limit: i64, offset: i64) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    fn build_select(&self) -> Result<Select> {
        let metadata = metadata_for::<E>();
        let mut order = self.order.clone();
        if let Some(ref clause) = self.order_clause {
            order.extend(OrderBy::parse_list(clause)?);
        }

        Ok(Select::from(metadata.table_name.as_str())
            .filters(self.filters.clone())
            .order_by(order)
            .limit(self.limit)
            .offset(self.offset))
    }

    /// Execute and fetch all results
    pub async fn fetch_all(self) -> Result<Vec<E>> {
        let select = self.build_select()?;
        debug!(
            entity = metadata_for::<E>().type_name,
            table = %select.table,
            limit = select.limit,
            offset = select.offset,
            "Executing find query"
        );

        let rows = self.storage.select(&select).await?;
        mapper::from_rows(&rows)
    }

    /// Execute and fetch one optional result
    pub async fn fetch_optional(self) -> Result<Option<E>> {
        let results = self.limit(1).fetch_all().await?;
        Ok(results.into_iter().next())
    }

    /// Execute and wrap the results in a page envelope with navigation
    /// links, counting the total with the same filters.
    pub async fn fetch_page(self, request: &RequestContext) -> Result<PageEnvelope<E>> {
        let storage = self.storage;
        let filters = self.filters.clone();
        let (limit, offset) = (self.limit, self.offset);

        let items = self.fetch_all().await?;
        let total = CountQuery::<E>::new(storage)
            .filter(filters)
            .execute()
            .await?;

        Ok(build_page(items, total, limit, offset, request))
    }
}

/// Query builder for counting entities
pub struct CountQuery<'a, E: Entity> {
    storage: &'a dyn Storage,
    filters: Filters,
    distinct: Vec<String>,
    _marker: PhantomData<fn() -> E>,
}

impl<'a, E: Entity> CountQuery<'a, E> {
    /// Create a new count query
    pub fn new(storage: &'a dyn Storage) -> Self {
        Self {
            storage,
            filters: Filters::new(),
            distinct: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Set the filter
    pub fn filter(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }

    /// Count distinct combinations of these columns instead of rows
    pub fn distinct<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.distinct = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Execute the count query
    pub async fn execute(self) -> Result<i64> {
        let table = &metadata_for::<E>().table_name;
        debug!(table = %table, distinct = ?self.distinct, "Executing count query");
        self.storage
            .count(table, &self.filters, &self.distinct)
            .await
    }
}

/// Fetch a single entity by primary key.
pub async fn get<E: Entity>(storage: &dyn Storage, id: i64) -> Result<E> {
    let metadata = metadata_for::<E>();
    let filters = Filters::new().eq(metadata.primary_key, id);

    debug!(entity = metadata.type_name, id, "Fetching entity by id");
    match storage.select_one(&metadata.table_name, &filters).await? {
        Some(row) => mapper::from_row(&row),
        None => Err(OrmError::NotFound {
            entity: metadata.type_name,
            id,
        }),
    }
}
