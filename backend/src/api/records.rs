//! Read-only listings for the lookup entities

use axum::{Router, routing::get};

use super::AppState;
use super::users::list;
use crate::entities::{City, Role};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cities", get(list::<City>))
        .route("/roles", get(list::<Role>))
}
