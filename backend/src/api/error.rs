//! Mapping of ORM failures onto HTTP responses

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::orm::OrmError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Orm(#[from] OrmError),

    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Orm(err) => match err {
                OrmError::NotFound { .. } => StatusCode::NOT_FOUND,
                OrmError::Decode { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                OrmError::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,
                OrmError::Storage(_) | OrmError::Configuration(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        let body = match &self {
            ApiError::Orm(OrmError::Storage(storage)) => json!({
                "error": storage.message,
                "code": storage.code,
            }),
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
