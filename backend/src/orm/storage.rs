//! Storage engine boundary
//!
//! The ORM never talks to a driver directly. Everything it needs from the
//! relational engine is expressed by [`Storage`]; `crate::db::Database`
//! implements it for SQLite.

use async_trait::async_trait;

use super::error::Result;
use super::filters::{Filters, OrderBy};
use super::value::Row;

/// `INNER JOIN <table> ON <left> = <right>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    pub table: String,
    pub left: String,
    pub right: String,
}

/// A SELECT over one table, optionally joined to a second.
///
/// With a join only the columns of `table` are returned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Select {
    pub table: String,
    pub join: Option<Join>,
    pub filters: Filters,
    pub order_by: Vec<OrderBy>,
    /// 0 = unbounded
    pub limit: i64,
    pub offset: i64,
}

impl Select {
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    pub fn join(mut self, join: Join) -> Self {
        self.join = Some(join);
        self
    }

    pub fn filters(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }

    pub fn order_by(mut self, order_by: Vec<OrderBy>) -> Self {
        self.order_by = order_by;
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// Capabilities consumed from the relational engine.
///
/// Failures are reported as [`OrmError::Storage`](super::OrmError::Storage)
/// carrying the engine's message and code.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn select(&self, select: &Select) -> Result<Vec<Row>>;

    async fn select_one(&self, table: &str, filters: &Filters) -> Result<Option<Row>>;

    /// Count matching rows, or distinct combinations of `distinct` columns.
    async fn count(&self, table: &str, filters: &Filters, distinct: &[String]) -> Result<i64>;

    /// Insert a row, returning the identity assigned by the engine.
    async fn insert(&self, table: &str, row: &Row) -> Result<Option<i64>>;

    /// Returns the number of affected rows.
    async fn update(&self, table: &str, row: &Row, filters: &Filters) -> Result<u64>;

    /// Returns the number of affected rows.
    async fn delete(&self, table: &str, filters: &Filters) -> Result<u64>;
}
