//! SeaORM/SQLite implementation of [`HeroGateway`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{
    sea_query::Expr, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use super::gateway::{HeroGateway, HeroOp, OpOutcome};
use super::model::{
    encode_superpowers, now_millis, FieldChanges, HeroRecord, Paginated, Patch, Superhero,
};
use crate::db::entities::{hero_image, superhero};
use crate::error::{Result, ServerError};

pub struct SeaOrmGateway {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmGateway {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        self.db.as_ref()
    }
}

async fn load_images<C: ConnectionTrait>(conn: &C, hero_id: &str) -> Result<Vec<hero_image::Model>> {
    Ok(hero_image::Entity::find()
        .filter(hero_image::Column::SuperheroId.eq(hero_id))
        .order_by_desc(hero_image::Column::Id)
        .all(conn)
        .await?)
}

#[async_trait]
impl HeroGateway for SeaOrmGateway {
    async fn find_by_id(&self, id: &str) -> Result<Option<HeroRecord>> {
        // Hero row and image rows come from one snapshot
        let txn = self.db.begin().await?;

        let Some(hero) = superhero::Entity::find_by_id(id.to_string()).one(&txn).await? else {
            txn.commit().await?;
            return Ok(None);
        };
        let images = load_images(&txn, id).await?;
        txn.commit().await?;

        HeroRecord::from_models(hero, images).map(Some)
    }

    async fn count(&self) -> Result<u64> {
        Ok(superhero::Entity::find().count(self.db.as_ref()).await?)
    }

    async fn list(&self, skip: u64, take: u64) -> Result<Paginated<HeroRecord>> {
        // Page and total come from one snapshot
        let txn = self.db.begin().await?;

        let total = superhero::Entity::find().count(&txn).await?;

        let heroes = superhero::Entity::find()
            .order_by_desc(superhero::Column::Id)
            .offset(skip)
            .limit(take)
            .all(&txn)
            .await?;

        let ids: Vec<String> = heroes.iter().map(|h| h.id.clone()).collect();
        let images = if ids.is_empty() {
            Vec::new()
        } else {
            hero_image::Entity::find()
                .filter(hero_image::Column::SuperheroId.is_in(ids))
                .order_by_desc(hero_image::Column::Id)
                .all(&txn)
                .await?
        };
        txn.commit().await?;

        // Rows arrive newest first, so the first one seen per hero is its latest image
        let mut latest: HashMap<String, hero_image::Model> = HashMap::new();
        for image in images {
            latest.entry(image.superhero_id.clone()).or_insert(image);
        }

        let items = heroes
            .into_iter()
            .map(|hero| {
                let images = latest.remove(&hero.id).into_iter().collect();
                HeroRecord::from_models(hero, images)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Paginated { items, total })
    }

    async fn run_atomic(&self, ops: Vec<HeroOp>) -> Result<Vec<OpOutcome>> {
        let txn = self.db.begin().await?;
        let mut outcomes = Vec::with_capacity(ops.len());

        for op in ops {
            match apply_op(&txn, op).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    if let Err(rollback_err) = txn.rollback().await {
                        tracing::warn!("Rollback failed after {}: {}", e, rollback_err);
                    }
                    return Err(e);
                }
            }
        }

        txn.commit().await?;
        Ok(outcomes)
    }
}

async fn apply_op(txn: &DatabaseTransaction, op: HeroOp) -> Result<OpOutcome> {
    match op {
        HeroOp::CreateHero { hero, image_urls } => {
            let id = hero.id.clone();
            insert_hero(txn, hero).await?;
            for url in image_urls {
                insert_image(txn, &id, url).await?;
            }
            tracing::debug!("Inserted superhero {}", id);
            Ok(OpOutcome::Created(id))
        }
        HeroOp::UpdateFields { id, fields, updated_at } => {
            let result = update_fields(&id, &fields, updated_at.timestamp_millis())?
                .exec(txn)
                .await?;
            if result.rows_affected == 0 {
                return Err(ServerError::NotFound(id));
            }
            Ok(OpOutcome::Updated)
        }
        HeroOp::AddImage { hero_id, url } => {
            let image_id = insert_image(txn, &hero_id, url).await?;
            Ok(OpOutcome::ImageAdded(image_id))
        }
        HeroOp::RemoveImages { hero_id, ids } => {
            if ids.is_empty() {
                return Ok(OpOutcome::ImagesRemoved(0));
            }
            let requested = ids.len() as u64;
            let result = hero_image::Entity::delete_many()
                .filter(hero_image::Column::SuperheroId.eq(hero_id.as_str()))
                .filter(hero_image::Column::Id.is_in(ids))
                .exec(txn)
                .await?;
            // The images were read before the batch; a short delete means they changed since
            if result.rows_affected < requested {
                tracing::debug!(
                    "Removed {} of {} images of superhero {}",
                    result.rows_affected,
                    requested,
                    hero_id
                );
                return Err(ServerError::NotFound(hero_id));
            }
            Ok(OpOutcome::ImagesRemoved(result.rows_affected))
        }
        HeroOp::DeleteHero { id } => {
            let images = hero_image::Entity::delete_many()
                .filter(hero_image::Column::SuperheroId.eq(id.as_str()))
                .exec(txn)
                .await?;
            let result = superhero::Entity::delete_by_id(id.clone()).exec(txn).await?;
            if result.rows_affected == 0 {
                return Err(ServerError::NotFound(id));
            }
            tracing::debug!("Deleted superhero {} with {} images", id, images.rows_affected);
            Ok(OpOutcome::Deleted)
        }
    }
}

async fn insert_hero(txn: &DatabaseTransaction, hero: Superhero) -> Result<()> {
    let model = superhero::ActiveModel {
        superpowers: Set(encode_superpowers(&hero.superpowers)?),
        created_at: Set(hero.created_at.timestamp_millis()),
        updated_at: Set(hero.updated_at.timestamp_millis()),
        id: Set(hero.id),
        nickname: Set(hero.nickname),
        real_name: Set(hero.real_name),
        origin_description: Set(hero.origin_description),
        catch_phrase: Set(hero.catch_phrase),
    };
    superhero::Entity::insert(model).exec_without_returning(txn).await?;
    Ok(())
}

async fn insert_image(txn: &DatabaseTransaction, hero_id: &str, url: String) -> Result<i64> {
    let model = hero_image::ActiveModel {
        superhero_id: Set(hero_id.to_string()),
        url: Set(url),
        created_at: Set(now_millis().timestamp_millis()),
        ..Default::default()
    };
    let result = hero_image::Entity::insert(model).exec(txn).await?;
    Ok(result.last_insert_id)
}

fn update_fields(
    id: &str,
    fields: &FieldChanges,
    updated_at: i64,
) -> Result<sea_orm::UpdateMany<superhero::Entity>> {
    let mut update = superhero::Entity::update_many()
        .col_expr(superhero::Column::UpdatedAt, Expr::value(updated_at))
        .filter(superhero::Column::Id.eq(id));

    if let Patch::Present(nickname) = &fields.nickname {
        update = update.col_expr(superhero::Column::Nickname, Expr::value(nickname.clone()));
    }
    if let Patch::Present(real_name) = &fields.real_name {
        update = update.col_expr(superhero::Column::RealName, Expr::value(real_name.clone()));
    }
    if let Patch::Present(origin) = &fields.origin_description {
        update = update.col_expr(superhero::Column::OriginDescription, Expr::value(origin.clone()));
    }
    if let Patch::Present(powers) = &fields.superpowers {
        update = update.col_expr(superhero::Column::Superpowers, Expr::value(encode_superpowers(powers)?));
    }
    if let Patch::Present(catch_phrase) = &fields.catch_phrase {
        update = update.col_expr(superhero::Column::CatchPhrase, Expr::value(catch_phrase.clone()));
    }

    Ok(update)
}
