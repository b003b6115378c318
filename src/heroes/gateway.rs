//! Persistence gateway contract for superheroes and their images.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::{FieldChanges, HeroId, HeroRecord, ImageId, Paginated, Superhero};
use crate::error::Result;

/// One write in an atomic batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeroOp {
    /// Insert the hero row and one image per url
    CreateHero { hero: Superhero, image_urls: Vec<String> },
    /// Apply the present fields and stamp `updated_at`; fails `NotFound` if the row is gone
    UpdateFields { id: HeroId, fields: FieldChanges, updated_at: DateTime<Utc> },
    /// Attach a new image to the hero
    AddImage { hero_id: HeroId, url: String },
    /// Delete the hero's images with these identities; fails `NotFound` if any is already gone
    RemoveImages { hero_id: HeroId, ids: Vec<ImageId> },
    /// Delete the hero's images, then the hero; fails `NotFound` if the row is gone
    DeleteHero { id: HeroId },
}

/// Result of one applied [`HeroOp`], in batch order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpOutcome {
    Created(HeroId),
    Updated,
    ImageAdded(ImageId),
    ImagesRemoved(u64),
    Deleted,
}

#[async_trait]
pub trait HeroGateway: Send + Sync {
    /// Load a hero with all of its images, most recent image first
    async fn find_by_id(&self, id: &str) -> Result<Option<HeroRecord>>;

    /// Total number of heroes
    async fn count(&self) -> Result<u64>;

    /// Heroes newest first, each with at most its most recent image, plus the
    /// total count read in the same transaction. `skip` and `take` must fit in an `i64`.
    async fn list(&self, skip: u64, take: u64) -> Result<Paginated<HeroRecord>>;

    /// Apply every op in one transaction: all of them commit or none does.
    async fn run_atomic(&self, ops: Vec<HeroOp>) -> Result<Vec<OpOutcome>>;
}
