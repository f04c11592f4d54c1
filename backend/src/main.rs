//! recordkit demo server
//!
//! Bootstraps the sample schema and serves the REST endpoints from
//! [`recordkit::api`].

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use recordkit::api::{self, AppState};
use recordkit::config::Config;
use recordkit::db::{self, Database};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recordkit=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    tracing::info!("Starting recordkit");

    let config = Arc::new(Config::from_env()?);
    tracing::info!(database = %config.database_url, "Configuration loaded");

    let db = Database::connect(&config.database_url, config.max_connections).await?;
    tracing::info!("Database connected");

    db::bootstrap(&db).await.context("Failed to bootstrap database")?;

    let app = api::router(AppState {
        config: config.clone(),
        db,
    });

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
