use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use superhero_server::api::{self, AppState};
use superhero_server::config::AppConfig;
use superhero_server::db;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "superhero_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();

    // Initialize database
    let db_path = config.db_path();
    let db = db::init_database(&db_path)
        .await
        .with_context(|| format!("Failed to initialize database at {:?}", db_path))?;
    tracing::info!("Database initialized at {:?}", db_path);

    let storage = config.storage.build().await;
    let state = Arc::new(AppState::new(Arc::new(db), storage, &config));

    let app = api::router(state, config.max_upload_bytes);

    tracing::info!("Superhero server starting on http://{}", config.bind_addr);
    tracing::info!("Images served from {}", config.image_base_url);
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET    /superheroes?page&limit");
    tracing::info!("  POST   /superheroes");
    tracing::info!("  GET    /superheroes/:id");
    tracing::info!("  PATCH  /superheroes/:id");
    tracing::info!("  DELETE /superheroes/:id");
    tracing::info!("  POST   /upload");

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
