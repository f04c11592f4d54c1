//! HTTP handler tests over a seeded in-memory database

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tower::ServiceExt;

use recordkit::api::{self, AppState};
use recordkit::config::Config;
use recordkit::db::{Database, bootstrap};

async fn app() -> Router {
    let db = Database::connect_in_memory().await.unwrap();
    bootstrap(&db).await.unwrap();
    let config = Config::from_lookup(|_| None).unwrap();

    api::router(AppState {
        config: Arc::new(config),
        db,
    })
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_healthz() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_readyz_counts_seeded_tables() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/readyz", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);
    assert_eq!(
        body["tables"],
        json!({ "cities": 3, "roles": 2, "users": 4, "users_roles": 6 })
    );
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_readyz_reports_missing_table() {
    let db = Database::connect_in_memory().await.unwrap();
    let app = api::router(AppState {
        config: Arc::new(Config::from_lookup(|_| None).unwrap()),
        db,
    });

    let (status, body) = send(&app, Method::GET, "/readyz", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["ready"], false);
    assert!(body["error"].as_str().unwrap().contains("cities"));
}

#[tokio::test]
async fn test_list_users_is_paged() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/users?limit=2", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 4);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["links"]["self"]["href"], "/users?limit=2&offset=0");
    assert_eq!(body["links"]["next"]["href"], "/users?limit=2&offset=2");
    assert!(body["links"].get("previous").is_none());
}

#[tokio::test]
async fn test_list_users_filters_by_column() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/users?id_city=2", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    let names: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Michelangelo", "Leonardo"]);
    assert_eq!(body["links"]["self"]["href"], "/users?id_city=2&limit=10&offset=0");
}

#[tokio::test]
async fn test_unknown_filter_is_a_bad_request() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/users?weapon=katana", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("weapon"));

    let (status, _) = send(&app, Method::GET, "/users?limit=ten", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_user_resolves_relationships() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/users/2", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Michelangelo");
    assert_eq!(body["city"]["name"], "Miami");
    assert_eq!(body["roles"], json!([{ "id": 1, "name": "Master" }, { "id": 2, "name": "User" }]));
}

#[tokio::test]
async fn test_missing_user_is_not_found() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/users/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Entity \"User\" #99 not found");
}

#[tokio::test]
async fn test_create_update_delete() {
    let app = app().await;

    let (status, created) = send(
        &app,
        Method::POST,
        "/users",
        Some(json!({ "name": "April", "email": "april@channel6.com", "id_city": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], 5);

    let (status, updated) = send(
        &app,
        Method::PATCH,
        "/users/5",
        Some(json!({ "id": 77, "name": "April O'Neil" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], 5);
    assert_eq!(updated["name"], "April O'Neil");
    assert_eq!(updated["email"], "april@channel6.com");

    let (status, _) = send(&app, Method::DELETE, "/users/5", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, "/users/5", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_storage_failure_reports_engine_code() {
    let app = app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/users",
        Some(json!({ "name": "Krang", "id_city": 999 })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("FOREIGN KEY"));
    assert!(body["code"].is_string());
}

#[tokio::test]
async fn test_wrongly_typed_body_is_unprocessable() {
    let app = app().await;
    let (status, body) = send(&app, Method::POST, "/users", Some(json!({ "name": 12 }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("name"));
}

#[tokio::test]
async fn test_lookup_listings() {
    let app = app().await;

    let (_, roles) = send(&app, Method::GET, "/roles", None).await;
    assert_eq!(roles["total"], 2);

    let (_, cities) = send(&app, Method::GET, "/cities?limit=0", None).await;
    assert_eq!(cities["total"], 3);
    assert_eq!(cities["items"].as_array().unwrap().len(), 3);
    assert_eq!(cities["links"], json!({ "self": { "href": "/cities?limit=0&offset=0" } }));
}
