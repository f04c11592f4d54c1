//! User endpoints
//!
//! - `GET /users?limit=&offset=&<column>=<value>` - page envelope
//! - `GET /users/{id}` - user with `city` and `roles` resolved
//! - `POST /users`, `PATCH /users/{id}`, `DELETE /users/{id}`

use axum::{
    Json, Router,
    extract::{OriginalUri, Path, State},
    http::StatusCode,
    routing::get,
};
use serde::Serialize;
use serde_json::{Map, Value};

use super::{ApiError, ApiResult, AppState};
use crate::entities::User;
use crate::orm::{
    ActiveRecord, Entity, Filters, PageEnvelope, RequestContext, SqlValue, metadata_for,
    row_from_json,
};

fn page_param(request: &RequestContext, name: &str, default: i64) -> ApiResult<i64> {
    match request.param(name) {
        None | Some("") => Ok(default),
        Some(raw) => raw
            .parse::<i64>()
            .ok()
            .filter(|value| *value >= 0)
            .ok_or_else(|| ApiError::BadRequest(format!("Invalid {name} \"{raw}\""))),
    }
}

/// Every query parameter except `limit` and `offset` is an equality filter
/// on a mapped column.
fn request_filters<E: Entity>(request: &RequestContext) -> ApiResult<Filters> {
    let metadata = metadata_for::<E>();
    let mut filters = Filters::new();

    for (key, value) in &request.query {
        if key == "limit" || key == "offset" {
            continue;
        }
        if !metadata.has_column(key) {
            return Err(ApiError::BadRequest(format!(
                "Unknown filter \"{key}\" for {}",
                metadata.table_name
            )));
        }
        filters.push(key.as_str(), SqlValue::String(value.clone()));
    }

    Ok(filters)
}

/// Paged listing of any entity, filtered by the query string.
pub async fn list<E: Entity + Serialize>(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
) -> ApiResult<Json<PageEnvelope<E>>> {
    let request = RequestContext::from_parts(uri.path(), uri.query());
    let limit = page_param(&request, "limit", state.config.default_page_limit)?;
    let offset = page_param(&request, "offset", 0)?;
    let filters = request_filters::<E>(&request)?;

    let page = E::find_paged(&state.db, filters, Some("id asc"), limit, offset, &request).await?;
    Ok(Json(page))
}

async fn get_user(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<User>> {
    let user = User::get(&state.db, id).await?;
    user.city(&state.db).await?;
    user.roles(&state.db).await?;
    Ok(Json(user))
}

async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<Map<String, Value>>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let mut user = User::default();
    user.fill(&row_from_json(&body))?;
    user.save(&state.db).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<Map<String, Value>>,
) -> ApiResult<Json<User>> {
    let mut user = User::get(&state.db, id).await?;

    let mut properties = row_from_json(&body);
    properties.remove(metadata_for::<User>().primary_key);
    user.fill(&properties)?;
    user.save(&state.db).await?;

    Ok(Json(user))
}

async fn delete_user(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    let mut user = User::get(&state.db, id).await?;
    user.delete(&state.db).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list::<User>).post(create_user))
        .route(
            "/users/{id}",
            get(get_user).patch(update_user).delete(delete_user),
        )
}
