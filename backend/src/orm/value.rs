//! Column values and rows
//!
//! Every value crossing the storage boundary is a [`SqlValue`]. Entity
//! fields convert to and from it through [`ColumnValue`], which the
//! `#[derive(Entity)]` macro calls for each mapped field.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;

/// A raw row: column name -> value.
pub type Row = BTreeMap<String, SqlValue>;

/// Represents a SQL value that can be bound to a query.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Interpret the value as an identity, accepting numeric text.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(i) => Some(*i),
            SqlValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Bind this value to a sqlx query builder
    pub fn bind_to_query<'q>(
        &'q self,
        query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    ) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
        match self {
            SqlValue::String(s) => query.bind(s.as_str()),
            SqlValue::Int(i) => query.bind(*i),
            SqlValue::Float(f) => query.bind(*f),
            SqlValue::Bool(b) => query.bind(if *b { 1i32 } else { 0i32 }),
            SqlValue::Null => query.bind(None::<String>),
        }
    }

    /// Bind this value to a scalar query builder
    pub fn bind_to_scalar<'q, O>(
        &'q self,
        query: sqlx::query::QueryScalar<'q, sqlx::Sqlite, O, sqlx::sqlite::SqliteArguments<'q>>,
    ) -> sqlx::query::QueryScalar<'q, sqlx::Sqlite, O, sqlx::sqlite::SqliteArguments<'q>> {
        match self {
            SqlValue::String(s) => query.bind(s.as_str()),
            SqlValue::Int(i) => query.bind(*i),
            SqlValue::Float(f) => query.bind(*f),
            SqlValue::Bool(b) => query.bind(if *b { 1i32 } else { 0i32 }),
            SqlValue::Null => query.bind(None::<String>),
        }
    }
}

impl Serialize for SqlValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SqlValue::Null => serializer.serialize_none(),
            SqlValue::Int(i) => serializer.serialize_i64(*i),
            SqlValue::Float(f) => serializer.serialize_f64(*f),
            SqlValue::Bool(b) => serializer.serialize_bool(*b),
            SqlValue::String(s) => serializer.serialize_str(s),
        }
    }
}

impl From<&JsonValue> for SqlValue {
    fn from(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => SqlValue::Null,
            JsonValue::Bool(b) => SqlValue::Bool(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => SqlValue::Int(i),
                None => SqlValue::Float(n.as_f64().unwrap_or_default()),
            },
            JsonValue::String(s) => SqlValue::String(s.clone()),
            // Nested structures are stored as their JSON text
            other => SqlValue::String(other.to_string()),
        }
    }
}

/// Build a row from a JSON object (e.g. an HTTP request body).
pub fn row_from_json(object: &serde_json::Map<String, JsonValue>) -> Row {
    object
        .iter()
        .map(|(key, value)| (key.clone(), SqlValue::from(value)))
        .collect()
}

macro_rules! impl_from_for_sql_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for SqlValue {
                fn from(value: $ty) -> Self {
                    SqlValue::$variant(value.into())
                }
            }
        )*
    };
}

impl_from_for_sql_value!(
    i64 => Int,
    i32 => Int,
    f64 => Float,
    bool => Bool,
    String => String,
    &str => String,
);

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// Conversion between an entity field type and a [`SqlValue`].
pub trait ColumnValue: Sized {
    /// Human-readable kind, used in decode errors
    const KIND: &'static str;

    fn to_sql_value(&self) -> SqlValue;

    /// Returns `None` when the value is of an incompatible kind.
    fn from_sql_value(value: &SqlValue) -> Option<Self>;
}

impl ColumnValue for i64 {
    const KIND: &'static str = "integer";

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Int(*self)
    }

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Int(i) => Some(*i),
            SqlValue::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }
}

impl ColumnValue for i32 {
    const KIND: &'static str = "integer";

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Int(i64::from(*self))
    }

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        i64::from_sql_value(value).and_then(|i| i32::try_from(i).ok())
    }
}

impl ColumnValue for f64 {
    const KIND: &'static str = "real";

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Float(*self)
    }

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Float(f) => Some(*f),
            SqlValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl ColumnValue for bool {
    const KIND: &'static str = "boolean";

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Bool(*self)
    }

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Bool(b) => Some(*b),
            SqlValue::Int(0) => Some(false),
            SqlValue::Int(1) => Some(true),
            _ => None,
        }
    }
}

impl ColumnValue for String {
    const KIND: &'static str = "text";

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::String(self.clone())
    }

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl<T: ColumnValue> ColumnValue for Option<T> {
    const KIND: &'static str = T::KIND;

    fn to_sql_value(&self) -> SqlValue {
        match self {
            Some(value) => value.to_sql_value(),
            None => SqlValue::Null,
        }
    }

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Null => Some(None),
            other => T::from_sql_value(other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_optional_columns_accept_null() {
        assert_eq!(Option::<i64>::from_sql_value(&SqlValue::Null), Some(None));
        assert_eq!(
            Option::<String>::from_sql_value(&SqlValue::String("a".into())),
            Some(Some("a".to_string()))
        );
        assert_eq!(String::from_sql_value(&SqlValue::Null), None);
    }

    #[test]
    fn test_bool_decodes_from_sqlite_integers() {
        assert_eq!(bool::from_sql_value(&SqlValue::Int(1)), Some(true));
        assert_eq!(bool::from_sql_value(&SqlValue::Int(0)), Some(false));
        assert_eq!(bool::from_sql_value(&SqlValue::Int(7)), None);
    }

    #[test]
    fn test_i32_rejects_out_of_range() {
        assert_eq!(i32::from_sql_value(&SqlValue::Int(i64::MAX)), None);
        assert_eq!(i32::from_sql_value(&SqlValue::Int(42)), Some(42));
    }

    #[test]
    fn test_row_from_json() {
        let body = json!({ "name": "Splinter", "id_city": 3, "score": 1.5, "email": null });
        let row = row_from_json(body.as_object().unwrap());

        assert_eq!(row.get("name"), Some(&SqlValue::String("Splinter".into())));
        assert_eq!(row.get("id_city"), Some(&SqlValue::Int(3)));
        assert_eq!(row.get("score"), Some(&SqlValue::Float(1.5)));
        assert_eq!(row.get("email"), Some(&SqlValue::Null));
    }

    #[test]
    fn test_as_i64_accepts_numeric_text() {
        assert_eq!(SqlValue::String(" 12 ".into()).as_i64(), Some(12));
        assert_eq!(SqlValue::Float(1.0).as_i64(), None);
        assert_eq!(SqlValue::Null.as_i64(), None);
    }
}
