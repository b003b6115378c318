//! Hero image entity (one url owned by one superhero)

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "hero_images")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub superhero_id: String,
    pub url: String,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::superhero::Entity",
        from = "Column::SuperheroId",
        to = "super::superhero::Column::Id",
        on_delete = "Cascade"
    )]
    Superhero,
}

impl Related<super::superhero::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Superhero.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
