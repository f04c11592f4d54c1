//! HTTP front end
//!
//! REST endpoints over the sample entities. List endpoints answer with page
//! envelopes; see [`crate::orm::PageEnvelope`].

mod error;
pub mod health;
mod records;
pub mod users;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Database;

pub use error::{ApiError, ApiResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Database,
}

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .merge(health::router())
        .merge(users::router())
        .merge(records::router())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
