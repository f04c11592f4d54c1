//! Liveness and readiness checks

use std::collections::BTreeMap;

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;
use tracing::warn;

use super::AppState;
use crate::db::seed;
use crate::orm::{Filters, Storage};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Row count per sample table, or the storage error that stopped the count.
#[derive(Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
    pub tables: BTreeMap<&'static str, i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Ready once every bootstrapped table can be counted through storage.
async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let mut tables = BTreeMap::new();

    for table in seed::tables() {
        match state.db.count(table, &Filters::new(), &[]).await {
            Ok(rows) => {
                tables.insert(table, rows);
            }
            Err(err) => {
                warn!(table, error = %err, "Readiness check failed");
                let body = ReadyResponse {
                    ready: false,
                    tables,
                    error: Some(err.to_string()),
                };
                return (StatusCode::SERVICE_UNAVAILABLE, Json(body));
            }
        }
    }

    let body = ReadyResponse {
        ready: true,
        tables,
        error: None,
    };
    (StatusCode::OK, Json(body))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
}
