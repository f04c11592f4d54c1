//! [`Storage`] over SQLite
//!
//! Statements come from [`crate::orm::builder`]; rows are decoded generically
//! by the storage class of each value, so any table can be read without a
//! per-entity `FromRow`.

use async_trait::async_trait;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Column, Row as _, Sqlite, TypeInfo, ValueRef};
use tracing::debug;

use super::Database;
use crate::orm::builder::{self, Statement};
use crate::orm::{Filters, Result, Row, Select, SqlValue, Storage};

fn bind_all(statement: &Statement) -> Query<'_, Sqlite, SqliteArguments<'_>> {
    statement
        .values
        .iter()
        .fold(sqlx::query(&statement.sql), |query, value| {
            value.bind_to_query(query)
        })
}

fn decode_row(row: &SqliteRow) -> Result<Row> {
    let mut values = Row::new();

    for column in row.columns() {
        let index = column.ordinal();
        let raw = row.try_get_raw(index)?;

        let value = if raw.is_null() {
            SqlValue::Null
        } else {
            match raw.type_info().name() {
                "INTEGER" => SqlValue::Int(row.try_get(index)?),
                "REAL" => SqlValue::Float(row.try_get(index)?),
                "BLOB" => {
                    let bytes: Vec<u8> = row.try_get(index)?;
                    SqlValue::String(String::from_utf8_lossy(&bytes).into_owned())
                }
                _ => SqlValue::String(row.try_get(index)?),
            }
        };

        values.insert(column.name().to_string(), value);
    }

    Ok(values)
}

impl Database {
    async fn fetch_rows(&self, statement: &Statement) -> Result<Vec<Row>> {
        debug!(sql = %statement.sql, params = statement.values.len(), "Executing query");
        let rows = bind_all(statement).fetch_all(&self.pool).await?;
        rows.iter().map(decode_row).collect()
    }

    async fn execute(&self, statement: &Statement) -> Result<sqlx::sqlite::SqliteQueryResult> {
        debug!(sql = %statement.sql, params = statement.values.len(), "Executing statement");
        Ok(bind_all(statement).execute(&self.pool).await?)
    }
}

#[async_trait]
impl Storage for Database {
    async fn select(&self, select: &Select) -> Result<Vec<Row>> {
        let statement = builder::select_sql(select)?;
        self.fetch_rows(&statement).await
    }

    async fn select_one(&self, table: &str, filters: &Filters) -> Result<Option<Row>> {
        let select = Select::from(table).filters(filters.clone()).limit(1);
        let statement = builder::select_sql(&select)?;
        Ok(self.fetch_rows(&statement).await?.into_iter().next())
    }

    async fn count(&self, table: &str, filters: &Filters, distinct: &[String]) -> Result<i64> {
        let statement = builder::count_sql(table, filters, distinct)?;
        debug!(sql = %statement.sql, "Executing count");

        let query = statement
            .values
            .iter()
            .fold(sqlx::query_scalar::<_, i64>(&statement.sql), |query, value| {
                value.bind_to_scalar(query)
            });
        Ok(query.fetch_one(&self.pool).await?)
    }

    async fn insert(&self, table: &str, row: &Row) -> Result<Option<i64>> {
        let statement = builder::insert_sql(table, row)?;
        let result = self.execute(&statement).await?;
        Ok(Some(result.last_insert_rowid()))
    }

    async fn update(&self, table: &str, row: &Row, filters: &Filters) -> Result<u64> {
        let statement = builder::update_sql(table, row, filters)?;
        Ok(self.execute(&statement).await?.rows_affected())
    }

    async fn delete(&self, table: &str, filters: &Filters) -> Result<u64> {
        let statement = builder::delete_sql(table, filters)?;
        Ok(self.execute(&statement).await?.rows_affected())
    }
}
