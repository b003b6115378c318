//! Superhero catalog: aggregate types, image reconciliation and the update engine.

mod delta;
mod engine;
mod gateway;
mod model;
mod sea_gateway;
pub mod validation;

pub use delta::{dedup_urls, ImageDelta};
pub use engine::HeroCatalog;
pub use gateway::{HeroGateway, HeroOp, OpOutcome};
pub use model::{
    FieldChanges, HeroId, HeroRecord, ImageId, ImageRef, NewSuperhero, PageRequest, Paginated,
    Patch, StoredImage, Superhero, SuperheroPatch, SuperheroWithImages,
};
pub use sea_gateway::SeaOrmGateway;

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use tempfile::TempDir;
    use uuid::Uuid;

    use super::model::now_millis;
    use super::{NewSuperhero, SeaOrmGateway, Superhero};

    /// Gateway over a fresh on-disk SQLite database; keep the TempDir alive.
    pub async fn test_gateway() -> (TempDir, SeaOrmGateway) {
        let dir = TempDir::new().unwrap();
        let db = crate::db::init_database(&dir.path().join("test.db")).await.unwrap();
        (dir, SeaOrmGateway::new(Arc::new(db)))
    }

    pub fn sample_hero(nickname: &str) -> Superhero {
        let now = now_millis();
        Superhero {
            id: Uuid::now_v7().to_string(),
            nickname: nickname.to_string(),
            real_name: format!("{} Real", nickname),
            origin_description: "Origin unknown.".to_string(),
            superpowers: vec!["Flight".to_string(), "Super Strength".to_string()],
            catch_phrase: "Here I come!".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn new_hero(nickname: &str, images: &[&str]) -> NewSuperhero {
        NewSuperhero {
            nickname: nickname.to_string(),
            real_name: format!("{} Real", nickname),
            origin_description: "Origin unknown.".to_string(),
            superpowers: vec!["Flight".to_string()],
            catch_phrase: "Here I come!".to_string(),
            images: Some(images.iter().map(|s| s.to_string()).collect()),
        }
    }
}
