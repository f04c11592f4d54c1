//! SQL statement builder
//!
//! Renders parameterized SQLite statements (`?1`, `?2`, ...) for the
//! [`Storage`](super::Storage) operations. Values are always bound, never
//! interpolated; identifiers are validated and double-quoted.

use super::error::{OrmError, Result};
use super::filters::{Filters, OrderBy, is_identifier};
use super::storage::Select;
use super::value::{Row, SqlValue};

/// A rendered statement and the values to bind, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

#[derive(Default)]
struct SqlBuilder {
    sql: String,
    values: Vec<SqlValue>,
}

impl SqlBuilder {
    fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            values: Vec::new(),
        }
    }

    fn push(&mut self, fragment: &str) -> &mut Self {
        self.sql.push_str(fragment);
        self
    }

    /// Bind a value and return its placeholder.
    fn bind(&mut self, value: &SqlValue) -> String {
        self.values.push(value.clone());
        format!("?{}", self.values.len())
    }

    fn push_where(&mut self, filters: &Filters) -> Result<()> {
        if filters.is_empty() {
            return Ok(());
        }

        let mut conditions = Vec::with_capacity(filters.len());
        for (column, value) in filters.iter() {
            let column = quote_identifier(column)?;
            if value.is_null() {
                conditions.push(format!("{} IS NULL", column));
            } else {
                let placeholder = self.bind(value);
                conditions.push(format!("{} = {}", column, placeholder));
            }
        }

        self.push(" WHERE ").push(&conditions.join(" AND "));
        Ok(())
    }

    fn push_order(&mut self, order_by: &[OrderBy]) -> Result<()> {
        if order_by.is_empty() {
            return Ok(());
        }

        let terms = order_by
            .iter()
            .map(|o| Ok(format!("{} {}", quote_identifier(&o.column)?, o.direction.to_sql())))
            .collect::<Result<Vec<_>>>()?;

        self.push(" ORDER BY ").push(&terms.join(", "));
        Ok(())
    }

    fn push_limit(&mut self, limit: i64, offset: i64) {
        let offset = offset.max(0);
        if limit > 0 {
            self.sql.push_str(&format!(" LIMIT {}", limit));
        } else if offset > 0 {
            // SQLite only accepts OFFSET after a LIMIT
            self.sql.push_str(" LIMIT -1");
        }
        if offset > 0 {
            self.sql.push_str(&format!(" OFFSET {}", offset));
        }
    }

    fn finish(self) -> Statement {
        Statement {
            sql: self.sql,
            values: self.values,
        }
    }
}

/// Validate and double-quote a (possibly table-qualified) identifier.
pub fn quote_identifier(name: &str) -> Result<String> {
    if !is_identifier(name) {
        return Err(OrmError::InvalidIdentifier(name.to_string()));
    }

    Ok(name
        .split('.')
        .map(|part| format!("\"{}\"", part))
        .collect::<Vec<_>>()
        .join("."))
}

pub fn select_sql(select: &Select) -> Result<Statement> {
    let table = quote_identifier(&select.table)?;

    let mut builder = match &select.join {
        Some(join) => {
            let mut builder = SqlBuilder::new(format!("SELECT {}.* FROM {}", table, table));
            builder.push(&format!(
                " INNER JOIN {} ON {} = {}",
                quote_identifier(&join.table)?,
                quote_identifier(&join.left)?,
                quote_identifier(&join.right)?
            ));
            builder
        }
        None => SqlBuilder::new(format!("SELECT * FROM {}", table)),
    };

    builder.push_where(&select.filters)?;
    builder.push_order(&select.order_by)?;
    builder.push_limit(select.limit, select.offset);
    Ok(builder.finish())
}

pub fn count_sql(table: &str, filters: &Filters, distinct: &[String]) -> Result<Statement> {
    let table = quote_identifier(table)?;

    let mut builder = if distinct.is_empty() {
        SqlBuilder::new(format!("SELECT COUNT(*) FROM {}", table))
    } else {
        let columns = distinct
            .iter()
            .map(|c| quote_identifier(c))
            .collect::<Result<Vec<_>>>()?;
        SqlBuilder::new(format!(
            "SELECT COUNT(*) FROM (SELECT DISTINCT {} FROM {}",
            columns.join(", "),
            table
        ))
    };

    builder.push_where(filters)?;
    if !distinct.is_empty() {
        builder.push(")");
    }
    Ok(builder.finish())
}

pub fn insert_sql(table: &str, row: &Row) -> Result<Statement> {
    let table = quote_identifier(table)?;

    if row.is_empty() {
        return Ok(SqlBuilder::new(format!("INSERT INTO {} DEFAULT VALUES", table)).finish());
    }

    let mut builder = SqlBuilder::default();
    let mut columns = Vec::with_capacity(row.len());
    let mut placeholders = Vec::with_capacity(row.len());
    for (column, value) in row {
        columns.push(quote_identifier(column)?);
        placeholders.push(builder.bind(value));
    }

    builder.push(&format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns.join(", "),
        placeholders.join(", ")
    ));
    Ok(builder.finish())
}

pub fn update_sql(table: &str, row: &Row, filters: &Filters) -> Result<Statement> {
    let table = quote_identifier(table)?;

    let mut builder = SqlBuilder::default();
    let mut assignments = Vec::with_capacity(row.len());
    for (column, value) in row {
        let column = quote_identifier(column)?;
        let placeholder = builder.bind(value);
        assignments.push(format!("{} = {}", column, placeholder));
    }

    builder.push(&format!("UPDATE {} SET {}", table, assignments.join(", ")));
    builder.push_where(filters)?;
    Ok(builder.finish())
}

pub fn delete_sql(table: &str, filters: &Filters) -> Result<Statement> {
    let mut builder = SqlBuilder::new(format!("DELETE FROM {}", quote_identifier(table)?));
    builder.push_where(filters)?;
    Ok(builder.finish())
}
