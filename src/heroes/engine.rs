//! Aggregate engine: list, read, create, update and delete superheroes.
//!
//! Every write goes through one [`HeroGateway::run_atomic`] batch and every
//! write returns a fresh read of what was committed.

use std::sync::Arc;

use uuid::Uuid;

use super::delta::{dedup_urls, ImageDelta};
use super::gateway::{HeroGateway, HeroOp};
use super::model::{
    now_millis, FieldChanges, NewSuperhero, PageRequest, Paginated, Superhero, SuperheroPatch,
    SuperheroWithImages,
};
use crate::config::DEFAULT_PAGE_LIMIT;
use crate::error::{Result, ServerError};

/// Largest offset or limit SQLite accepts
const MAX_SQL_INT: u64 = i64::MAX as u64;

pub struct HeroCatalog {
    gateway: Arc<dyn HeroGateway>,
    max_page_limit: u64,
}

impl HeroCatalog {
    pub fn new(gateway: Arc<dyn HeroGateway>, max_page_limit: u64) -> Self {
        Self {
            gateway,
            max_page_limit: max_page_limit.clamp(1, MAX_SQL_INT),
        }
    }

    /// One page of heroes (newest first, at most one image each) plus the total count.
    pub async fn list(&self, request: PageRequest) -> Result<Paginated<SuperheroWithImages>> {
        let page = request.page.unwrap_or(1);
        let limit = request.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if page == 0 {
            return Err(ServerError::Validation("page must not be less than 1".to_string()));
        }
        if limit == 0 {
            return Err(ServerError::Validation("limit must not be less than 1".to_string()));
        }
        let limit = if limit > self.max_page_limit {
            tracing::debug!("Clamping page limit {} to {}", limit, self.max_page_limit);
            self.max_page_limit
        } else {
            limit
        };

        let skip = match (page - 1).checked_mul(limit) {
            Some(skip) if skip <= MAX_SQL_INT => skip,
            _ => {
                tracing::debug!("Page {} of size {} is past any possible end", page, limit);
                return Ok(Paginated {
                    items: Vec::new(),
                    total: self.gateway.count().await?,
                });
            }
        };

        let Paginated { items, total } = self.gateway.list(skip, limit).await?;
        Ok(Paginated {
            items: items.into_iter().map(|r| r.into_view()).collect(),
            total,
        })
    }

    pub async fn get(&self, id: &str) -> Result<SuperheroWithImages> {
        self.gateway
            .find_by_id(id)
            .await?
            .map(|record| record.into_view())
            .ok_or_else(|| ServerError::NotFound(id.to_string()))
    }

    /// Insert the hero and its initial images in one batch.
    pub async fn create(&self, new: NewSuperhero) -> Result<SuperheroWithImages> {
        let now = now_millis();
        let hero = Superhero {
            id: Uuid::now_v7().to_string(),
            nickname: new.nickname,
            real_name: new.real_name,
            origin_description: new.origin_description,
            superpowers: new.superpowers,
            catch_phrase: new.catch_phrase,
            created_at: now,
            updated_at: now,
        };
        let id = hero.id.clone();
        let image_urls = dedup_urls(new.images.unwrap_or_default());

        tracing::info!("Creating superhero {} with {} images", id, image_urls.len());
        self.gateway
            .run_atomic(vec![HeroOp::CreateHero { hero, image_urls }])
            .await?;

        self.get(&id).await
    }

    /// Apply a partial update and reconcile the image set against `patch.images`.
    pub async fn update(&self, id: &str, patch: SuperheroPatch) -> Result<SuperheroWithImages> {
        let current = self
            .gateway
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServerError::NotFound(id.to_string()))?;

        let SuperheroPatch { fields, images } = patch;
        let delta = ImageDelta::compute(&current.images, images.as_ref().map(Vec::as_slice));
        tracing::debug!(
            "Updating superhero {}: {} images to add, {} to remove",
            id,
            delta.to_add.len(),
            delta.to_remove.len()
        );
        if fields.is_empty() && delta.is_empty() {
            tracing::debug!("Superhero {} update has no changes, only updated_at moves", id);
        }

        let ops = build_update_batch(id, fields, delta);
        self.gateway.run_atomic(ops).await?;

        self.get(id).await
    }

    /// Delete the hero and all its images; returns the hero as it was.
    pub async fn delete(&self, id: &str) -> Result<Superhero> {
        let existing = self
            .gateway
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServerError::NotFound(id.to_string()))?;

        self.gateway
            .run_atomic(vec![HeroOp::DeleteHero { id: id.to_string() }])
            .await?;

        tracing::info!("Deleted superhero {}", id);
        Ok(existing.hero)
    }
}

/// Field update first (it also detects a concurrently deleted hero), then
/// additions, then removals.
fn build_update_batch(id: &str, fields: FieldChanges, delta: ImageDelta) -> Vec<HeroOp> {
    let mut ops = Vec::with_capacity(delta.to_add.len() + 2);

    ops.push(HeroOp::UpdateFields {
        id: id.to_string(),
        fields,
        updated_at: now_millis(),
    });

    ops.extend(delta.to_add.into_iter().map(|url| HeroOp::AddImage {
        hero_id: id.to_string(),
        url,
    }));

    if !delta.to_remove.is_empty() {
        ops.push(HeroOp::RemoveImages {
            hero_id: id.to_string(),
            ids: delta.to_remove,
        });
    }

    ops
}
