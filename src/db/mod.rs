//! Database module for SQLite persistence using SeaORM

pub mod entities;

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};
use std::path::Path;

/// Initialize database connection and create tables
pub async fn init_database(db_path: &Path) -> Result<DatabaseConnection, DbErr> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| DbErr::Custom(format!("cannot create {:?}: {}", parent, e)))?;
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
    tracing::info!("Connecting to database: {}", db_url);

    let db = Database::connect(&db_url).await?;

    create_tables(&db).await?;

    Ok(db)
}

/// Create all tables if they don't exist
async fn create_tables(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Deleting a hero must never leave its images behind
    db.execute(Statement::from_string(
        db.get_database_backend(),
        "PRAGMA foreign_keys = ON".to_string(),
    ))
    .await?;

    // Superheroes table (id is a time-ordered UUID, so ORDER BY id DESC is newest first)
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS superheroes (
            id TEXT PRIMARY KEY,
            nickname TEXT NOT NULL,
            real_name TEXT NOT NULL,
            origin_description TEXT NOT NULL,
            superpowers TEXT NOT NULL DEFAULT '[]',
            catch_phrase TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#.to_string(),
    )).await?;

    // Hero images table
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS hero_images (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            superhero_id TEXT NOT NULL,
            url TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            FOREIGN KEY (superhero_id) REFERENCES superheroes(id) ON DELETE CASCADE,
            UNIQUE(superhero_id, url)
        )
        "#.to_string(),
    )).await?;

    // Create index for image lookups by owner
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"CREATE INDEX IF NOT EXISTS idx_hero_images_hero ON hero_images(superhero_id)"#.to_string(),
    )).await?;

    tracing::info!("Database tables initialized");
    Ok(())
}
