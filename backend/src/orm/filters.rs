//! Equality filters and sort orders

use super::error::{OrmError, Result};
use super::value::SqlValue;

/// Order direction for sorting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending (A-Z, 0-9, oldest-newest)
    #[default]
    Asc,
    /// Descending (Z-A, 9-0, newest-oldest)
    Desc,
}

impl SortDirection {
    /// Convert to SQL order string
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// One `ORDER BY` term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Desc,
        }
    }

    /// Parse a declaration such as `"name asc, id desc"`.
    ///
    /// Direction defaults to ascending. Columns must be plain or
    /// table-qualified identifiers.
    pub fn parse_list(input: &str) -> Result<Vec<OrderBy>> {
        let mut terms = Vec::new();

        for term in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let mut parts = term.split_whitespace();
            let column = parts.next().unwrap_or_default();
            let direction = match parts.next().map(str::to_ascii_lowercase).as_deref() {
                None | Some("asc") => SortDirection::Asc,
                Some("desc") => SortDirection::Desc,
                Some(_) => return Err(OrmError::InvalidIdentifier(term.to_string())),
            };
            if parts.next().is_some() || !is_identifier(column) {
                return Err(OrmError::InvalidIdentifier(term.to_string()));
            }
            terms.push(OrderBy {
                column: column.to_string(),
                direction,
            });
        }

        Ok(terms)
    }

    /// Qualify the column with a table name, replacing any existing qualifier.
    pub fn qualified(&self, table: &str) -> OrderBy {
        let column = self.column.rsplit('.').next().unwrap_or(&self.column);
        OrderBy {
            column: format!("{}.{}", table, column),
            direction: self.direction,
        }
    }
}

/// Equality conditions, all ANDed together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters {
    conditions: Vec<(String, SqlValue)>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `column = value` condition.
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.conditions.push((column.into(), value.into()));
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<SqlValue>) {
        self.conditions.push((column.into(), value.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.conditions.iter().map(|(c, v)| (c.as_str(), v))
    }
}

impl<C: Into<String>, V: Into<SqlValue>> FromIterator<(C, V)> for Filters {
    fn from_iter<I: IntoIterator<Item = (C, V)>>(iter: I) -> Self {
        Self {
            conditions: iter
                .into_iter()
                .map(|(c, v)| (c.into(), v.into()))
                .collect(),
        }
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`, optionally `table.column`.
pub fn is_identifier(name: &str) -> bool {
    let mut parts = name.split('.');
    let valid = |part: &str| {
        let mut chars = part.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    };

    match (parts.next(), parts.next(), parts.next()) {
        (Some(column), None, None) => valid(column),
        (Some(table), Some(column), None) => valid(table) && valid(column),
        _ => false,
    }
}
