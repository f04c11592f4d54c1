//! Error types for the ORM layer

use thiserror::Error;

/// Result alias used throughout the ORM layer.
pub type Result<T, E = OrmError> = std::result::Result<T, E>;

/// Failure reported by the storage engine, carried through unchanged.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct StorageError {
    /// Engine-provided message
    pub message: String,
    /// Engine-provided error code, when the driver reports one
    pub code: Option<String>,
}

impl StorageError {
    pub fn new(message: impl Into<String>, code: Option<String>) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) => Self {
                message: db_err.message().to_string(),
                code: db_err.code().map(|c| c.into_owned()),
            },
            other => Self {
                message: other.to_string(),
                code: None,
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum OrmError {
    /// `get` found no row with the requested id
    #[error("Entity \"{entity}\" #{id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),

    /// Declaration mistake detected while resolving a relationship
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("cannot decode column \"{column}\" of {entity}: expected {expected}")]
    Decode {
        entity: &'static str,
        column: &'static str,
        expected: &'static str,
    },

    #[error("invalid SQL identifier \"{0}\"")]
    InvalidIdentifier(String),
}

impl From<sqlx::Error> for OrmError {
    fn from(err: sqlx::Error) -> Self {
        OrmError::Storage(err.into())
    }
}

impl OrmError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, OrmError::NotFound { .. })
    }
}
