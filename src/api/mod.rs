pub mod handlers;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::heroes::{HeroCatalog, SeaOrmGateway};
use crate::storage::StorageBackend;
use crate::upload::ImageUploader;

pub use handlers::{
    create_superhero, delete_superhero, get_image, get_superhero, health, list_superheroes,
    update_superhero, upload_image,
};

/// Application state shared across handlers
pub struct AppState {
    pub catalog: HeroCatalog,
    pub uploads: ImageUploader,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        storage: Arc<dyn StorageBackend>,
        config: &AppConfig,
    ) -> Self {
        let gateway = Arc::new(SeaOrmGateway::new(db));
        Self {
            catalog: HeroCatalog::new(gateway, config.max_page_limit),
            uploads: ImageUploader::new(storage, config.image_base_url.clone()),
        }
    }
}

/// Build the HTTP router.
pub fn router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/superheroes", get(list_superheroes).post(create_superhero))
        .route(
            "/superheroes/:id",
            get(get_superhero).patch(update_superhero).delete(delete_superhero),
        )
        .route("/upload", post(upload_image))
        .route("/images/:key", get(get_image))
        .route("/health", get(health))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
}
